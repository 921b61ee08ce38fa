// src/recommend/mod.rs
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;

use log::debug;

use crate::data::catalog::ItemCatalog;
use crate::data::interactions::InteractionStore;
use crate::latent::FactorModel;
use crate::models::{Donor, RankedItem};
use crate::scoring::ContentScorer;
use crate::utils::constants::CONTENT_RESCALE;

/// Lookup failures outside the designed cold-start path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecommendError {
    DonorNotFound(String),
    ItemNotFound(String),
}

impl fmt::Display for RecommendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecommendError::DonorNotFound(id) => {
                write!(f, "Donor '{}' not found in the donor profile table", id)
            }
            RecommendError::ItemNotFound(id) => {
                write!(f, "Item '{}' not found in the item catalog", id)
            }
        }
    }
}

impl std::error::Error for RecommendError {}

/// Blended score: the content score is rescaled onto the rating range so the
/// weighted sum compares like with like.
pub fn hybrid_score(cf_score: f64, content_score: f64, alpha: f64) -> f64 {
    alpha * cf_score + (1.0 - alpha) * content_score * CONTENT_RESCALE
}

/// Hybrid ranker over explicit, read-only context: the item catalog, the
/// donor table, the interaction store, the trained predictor and the content
/// scorer. Constructed once per run; safe to share across parallel donor
/// loops.
pub struct HybridRanker<'a> {
    catalog: &'a ItemCatalog,
    donor_index: HashMap<&'a str, &'a Donor>,
    store: &'a InteractionStore,
    predictor: &'a FactorModel,
    scorer: &'a ContentScorer,
}

impl<'a> HybridRanker<'a> {
    pub fn new(
        catalog: &'a ItemCatalog,
        donors: &'a [Donor],
        store: &'a InteractionStore,
        predictor: &'a FactorModel,
        scorer: &'a ContentScorer,
    ) -> Self {
        let donor_index = donors
            .iter()
            .map(|donor| (donor.donor_id.as_str(), donor))
            .collect();
        Self {
            catalog,
            donor_index,
            store,
            predictor,
            scorer,
        }
    }

    /// Top-k recommendations for a donor at blend weight `alpha`.
    ///
    /// Donors unknown to the interaction store take the cold-start path and
    /// get the globally most popular items, independent of `alpha`. Known
    /// donors are scored against every catalog item they have not already
    /// interacted with; ordering is score descending with ascending item id
    /// on exact ties, so rankings are reproducible.
    pub fn recommend(
        &self,
        donor_id: &str,
        top_k: usize,
        alpha: f64,
    ) -> Result<Vec<RankedItem>, RecommendError> {
        if !self.store.knows_donor(donor_id) {
            debug!(
                "Donor {} has no logged interactions; falling back to global popularity",
                donor_id
            );
            return Ok(self.most_popular(top_k));
        }

        let donor = self
            .donor_index
            .get(donor_id)
            .copied()
            .ok_or_else(|| RecommendError::DonorNotFound(donor_id.to_string()))?;
        let interacted: HashSet<&str> = self.store.interacted_items(donor_id).into_iter().collect();

        let mut scored: Vec<RankedItem> = Vec::with_capacity(self.catalog.len());
        for item in self.catalog.iter() {
            if interacted.contains(item.item_id.as_str()) {
                continue;
            }
            let cf_score = self.predictor.predict(donor_id, &item.item_id);
            let content_score = self.scorer.score(donor, item, self.store);
            scored.push(RankedItem {
                item_id: item.item_id.clone(),
                score: hybrid_score(cf_score, content_score, alpha),
            });
        }
        scored.sort_by(compare_ranked);
        scored.truncate(top_k);
        Ok(scored)
    }

    /// Hybrid score for one explicit (donor, item) pair. Unlike `recommend`
    /// there is no cold-start fallback here: both profiles must exist.
    pub fn score_pair(
        &self,
        donor_id: &str,
        item_id: &str,
        alpha: f64,
    ) -> Result<f64, RecommendError> {
        let donor = self
            .donor_index
            .get(donor_id)
            .copied()
            .ok_or_else(|| RecommendError::DonorNotFound(donor_id.to_string()))?;
        let item = self
            .catalog
            .get(item_id)
            .ok_or_else(|| RecommendError::ItemNotFound(item_id.to_string()))?;
        let cf_score = self.predictor.predict(donor_id, item_id);
        let content_score = self.scorer.score(donor, item, self.store);
        Ok(hybrid_score(cf_score, content_score, alpha))
    }

    /// Global popularity fallback; scores are raw interaction counts.
    fn most_popular(&self, top_k: usize) -> Vec<RankedItem> {
        self.store
            .popularity_ranking()
            .into_iter()
            .take(top_k)
            .map(|(item_id, count)| RankedItem {
                item_id,
                score: count as f64,
            })
            .collect()
    }
}

/// Descending score, ascending item id on exact ties.
fn compare_ranked(a: &RankedItem, b: &RankedItem) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.item_id.cmp(&b.item_id))
}
