// src/scoring/cosine.rs
use std::collections::{BTreeSet, HashMap};

use log::debug;
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::data::catalog::ItemCatalog;
use crate::data::interactions::InteractionStore;

use super::parse_categories;

/// Pairwise item-item cosine similarity over one-hot category vectors.
///
/// The category vocabulary is the sorted union of every catalog category, so
/// the matrix is reproducible for a given catalog. Values live in [0,1].
/// Items with no parseable categories are zero vectors and score 0 against
/// everything, themselves included. Computed once; rebuild explicitly when
/// the catalog changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSimilarityMatrix {
    item_ids: Vec<String>,
    index: HashMap<String, usize>,
    matrix: Array2<f64>,
}

impl ItemSimilarityMatrix {
    pub fn build(catalog: &ItemCatalog) -> Self {
        let vocabulary: Vec<String> = catalog
            .iter()
            .flat_map(|item| parse_categories(&item.categories))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let vocabulary_index: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(pos, category)| (category.as_str(), pos))
            .collect();

        let item_count = catalog.len();
        let mut one_hot = Array2::<f64>::zeros((item_count, vocabulary.len()));
        for (row, item) in catalog.iter().enumerate() {
            for category in parse_categories(&item.categories) {
                if let Some(&col) = vocabulary_index.get(category.as_str()) {
                    one_hot[[row, col]] = 1.0;
                }
            }
        }

        let mut matrix = Array2::<f64>::zeros((item_count, item_count));
        for i in 0..item_count {
            for j in i..item_count {
                let similarity = cosine_similarity(one_hot.row(i), one_hot.row(j));
                matrix[[i, j]] = similarity;
                matrix[[j, i]] = similarity;
            }
        }
        debug!(
            "Built item similarity matrix: {} items over {} categories",
            item_count,
            vocabulary.len()
        );

        let item_ids: Vec<String> = catalog.iter().map(|item| item.item_id.clone()).collect();
        let index: HashMap<String, usize> = item_ids
            .iter()
            .enumerate()
            .map(|(pos, id)| (id.clone(), pos))
            .collect();

        Self {
            item_ids,
            index,
            matrix,
        }
    }

    /// Similarity between two catalog items; 0 for ids the matrix has not
    /// seen.
    pub fn similarity(&self, item_a: &str, item_b: &str) -> f64 {
        match (self.index.get(item_a), self.index.get(item_b)) {
            (Some(&a), Some(&b)) => self.matrix[[a, b]],
            _ => 0.0,
        }
    }

    /// Mean similarity between the target item and every item the donor has
    /// interacted with; 0 for a donor with no history.
    pub fn donor_score(&self, donor_id: &str, item_id: &str, store: &InteractionStore) -> f64 {
        let target = match self.index.get(item_id) {
            Some(&pos) => pos,
            None => return 0.0,
        };

        let similarities: Vec<f64> = store
            .interacted_items(donor_id)
            .into_iter()
            .filter_map(|interacted| self.index.get(interacted))
            .map(|&pos| self.matrix[[target, pos]])
            .collect();

        if similarities.is_empty() {
            0.0
        } else {
            similarities.iter().sum::<f64>() / similarities.len() as f64
        }
    }
}

/// Cosine similarity of two dense vectors, defined as 0 when either vector
/// is zero instead of dividing by a zero norm.
fn cosine_similarity(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    let dot = a.dot(&b);
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
