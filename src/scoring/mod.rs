// src/scoring/mod.rs
pub mod cosine;
pub mod overlap;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::data::catalog::ItemCatalog;
use crate::data::interactions::InteractionStore;
use crate::models::{Donor, Item};

pub use cosine::ItemSimilarityMatrix;

static CATEGORY_DELIMITER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,|]").expect("category delimiter pattern is valid"));

/// Splits a raw category field into a set. Fields are delimited by `,` or
/// `|`; fragments are trimmed and empty ones dropped, so a malformed or
/// empty field parses to the empty set rather than failing.
pub fn parse_categories(raw: &str) -> HashSet<String> {
    CATEGORY_DELIMITER
        .split(raw)
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Which content-similarity strategy scores (donor, item) pairs. Selected at
/// configuration time; both strategies sit behind the single scoring call in
/// `ContentScorer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentStrategy {
    CategoryOverlap,
    ItemCosine,
}

impl FromStr for ContentStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "overlap" | "category-overlap" => Ok(ContentStrategy::CategoryOverlap),
            "cosine" | "item-cosine" => Ok(ContentStrategy::ItemCosine),
            other => Err(format!(
                "Unknown content strategy '{}'; expected 'overlap' or 'cosine'",
                other
            )),
        }
    }
}

impl fmt::Display for ContentStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentStrategy::CategoryOverlap => write!(f, "overlap"),
            ContentStrategy::ItemCosine => write!(f, "cosine"),
        }
    }
}

/// The content similarity engine: one scoring capability, two
/// interchangeable strategies. The cosine variant owns its precomputed
/// item-item similarity matrix; rebuild the scorer if the catalog changes.
pub enum ContentScorer {
    CategoryOverlap,
    ItemCosine(ItemSimilarityMatrix),
}

impl ContentScorer {
    pub fn build(strategy: ContentStrategy, catalog: &ItemCatalog) -> Self {
        match strategy {
            ContentStrategy::CategoryOverlap => ContentScorer::CategoryOverlap,
            ContentStrategy::ItemCosine => {
                ContentScorer::ItemCosine(ItemSimilarityMatrix::build(catalog))
            }
        }
    }

    pub fn strategy(&self) -> ContentStrategy {
        match self {
            ContentScorer::CategoryOverlap => ContentStrategy::CategoryOverlap,
            ContentScorer::ItemCosine(_) => ContentStrategy::ItemCosine,
        }
    }

    /// Content score in [0,1] for how well `item` fits the donor. The
    /// overlap strategy reads the donor profile; the cosine strategy reads
    /// the donor's interaction history.
    pub fn score(&self, donor: &Donor, item: &Item, store: &InteractionStore) -> f64 {
        match self {
            ContentScorer::CategoryOverlap => overlap::overlap_score(donor, item),
            ContentScorer::ItemCosine(similarity) => {
                similarity.donor_score(&donor.donor_id, &item.item_id, store)
            }
        }
    }
}
