// src/data/interactions.rs
use std::collections::{BTreeSet, HashMap, HashSet};

use ndarray::{Array2, ArrayView1};

use crate::models::Interaction;

/// The interaction log plus its derived dense donor×item pivot. Rows and
/// columns follow sorted identifier order so the pivot is reproducible for a
/// given log. The pivot cell holds the logged score (a repeated pair keeps
/// the last value, like any pivot); absent pairs hold 0. Read-only after
/// construction.
#[derive(Debug, Clone)]
pub struct InteractionStore {
    interactions: Vec<Interaction>,
    donor_ids: Vec<String>,
    item_ids: Vec<String>,
    donor_index: HashMap<String, usize>,
    item_index: HashMap<String, usize>,
    matrix: Array2<f64>,
}

impl InteractionStore {
    pub fn from_log(interactions: Vec<Interaction>) -> Self {
        let donor_ids: Vec<String> = interactions
            .iter()
            .map(|r| r.donor_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let item_ids: Vec<String> = interactions
            .iter()
            .map(|r| r.item_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let donor_index: HashMap<String, usize> = donor_ids
            .iter()
            .enumerate()
            .map(|(pos, id)| (id.clone(), pos))
            .collect();
        let item_index: HashMap<String, usize> = item_ids
            .iter()
            .enumerate()
            .map(|(pos, id)| (id.clone(), pos))
            .collect();

        let mut matrix = Array2::<f64>::zeros((donor_ids.len(), item_ids.len()));
        for record in &interactions {
            let row = donor_index[&record.donor_id];
            let col = item_index[&record.item_id];
            matrix[[row, col]] = record.score;
        }

        Self {
            interactions,
            donor_ids,
            item_ids,
            donor_index,
            item_index,
            matrix,
        }
    }

    /// Whether the donor has any logged interaction. Donors unknown here take
    /// the cold-start path in the ranker.
    pub fn knows_donor(&self, donor_id: &str) -> bool {
        self.donor_index.contains_key(donor_id)
    }

    pub fn donor_row(&self, donor_id: &str) -> Option<ArrayView1<f64>> {
        self.donor_index
            .get(donor_id)
            .map(|&row| self.matrix.row(row))
    }

    /// Items the donor has engaged with (pivot cell > 0), in column order.
    pub fn interacted_items(&self, donor_id: &str) -> Vec<&str> {
        match self.donor_row(donor_id) {
            Some(row) => row
                .iter()
                .enumerate()
                .filter(|(_, &score)| score > 0.0)
                .map(|(col, _)| self.item_ids[col].as_str())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Every item the donor appears with in the raw log, regardless of score.
    /// This is the ground-truth set the evaluator checks hits against.
    pub fn logged_items(&self, donor_id: &str) -> HashSet<&str> {
        self.interactions
            .iter()
            .filter(|r| r.donor_id == donor_id)
            .map(|r| r.item_id.as_str())
            .collect()
    }

    /// Items ranked by raw interaction frequency, most frequent first; count
    /// ties resolve by ascending item identifier.
    pub fn popularity_ranking(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for record in &self.interactions {
            *counts.entry(record.item_id.as_str()).or_insert(0) += 1;
        }
        let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
            .into_iter()
            .map(|(id, count)| (id.to_string(), count))
            .collect()
    }

    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    pub fn donor_ids(&self) -> &[String] {
        &self.donor_ids
    }

    pub fn item_ids(&self) -> &[String] {
        &self.item_ids
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    pub fn donor_count(&self) -> usize {
        self.donor_ids.len()
    }

    pub fn item_count(&self) -> usize {
        self.item_ids.len()
    }
}
