// src/models/mod.rs
pub mod stats;

use serde::{Deserialize, Serialize};

/// Which source table an item row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Ngo,
    Orphanage,
}

/// A donor profile. Reference data, loaded once and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donor {
    pub donor_id: String,
    /// Raw delimited category field, e.g. `"education,health|food"`.
    pub preferred_categories: String,
    pub location: String,
}

/// A unified NGO or orphanage profile a donor can support.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub item_id: String,
    /// Raw delimited category field.
    pub categories: String,
    pub location: String,
    pub kind: ItemKind,
}

/// One logged donor-item engagement. Scores are validated against the
/// rating scale at load time; the log itself is kept as recorded, including
/// repeated pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub donor_id: String,
    pub item_id: String,
    pub score: f64,
}

/// One entry in a ranked recommendation list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedItem {
    pub item_id: String,
    pub score: f64,
}
