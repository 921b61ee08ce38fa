// src/evaluation/mod.rs
use std::collections::{HashMap, HashSet};

use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::{Interaction, RankedItem};
use crate::recommend::{HybridRanker, RecommendError};

/// Fraction of donors whose top-k recommendations intersect their logged
/// items. Donors with an empty recommendation list are not evaluated, and an
/// empty evaluation set yields 0 rather than dividing by zero.
pub fn top_k_hit_rate(
    recommendations: &HashMap<String, Vec<RankedItem>>,
    interactions: &[Interaction],
    k: usize,
) -> f64 {
    let mut logged: HashMap<&str, HashSet<&str>> = HashMap::new();
    for record in interactions {
        logged
            .entry(record.donor_id.as_str())
            .or_default()
            .insert(record.item_id.as_str());
    }

    let mut hits = 0usize;
    let mut total = 0usize;
    for (donor_id, recs) in recommendations {
        if recs.is_empty() {
            continue;
        }
        let top: HashSet<&str> = recs.iter().take(k).map(|r| r.item_id.as_str()).collect();
        if let Some(actual) = logged.get(donor_id.as_str()) {
            if !top.is_disjoint(actual) {
                hits += 1;
            }
        }
        total += 1;
    }

    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

/// Generates a recommendation list per donor. Parallel over donors; every
/// piece of shared context behind the ranker is read-only.
pub fn recommend_all(
    ranker: &HybridRanker,
    donor_ids: &[String],
    top_k: usize,
    alpha: f64,
) -> Result<HashMap<String, Vec<RankedItem>>, RecommendError> {
    donor_ids
        .par_iter()
        .map(|donor_id| {
            ranker
                .recommend(donor_id, top_k, alpha)
                .map(|recs| (donor_id.clone(), recs))
        })
        .collect()
}

/// One grid point of the alpha sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlphaPoint {
    pub alpha: f64,
    pub hit_rate: f64,
}

/// Result of sweeping the blend weight over a grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlphaSweepOutcome {
    pub best_alpha: f64,
    pub best_hit_rate: f64,
    pub table: Vec<AlphaPoint>,
}

impl AlphaSweepOutcome {
    pub fn table_display(&self) -> String {
        let mut output = String::from("Alpha | Hit rate\n------|---------\n");
        for point in &self.table {
            output.push_str(&format!(" {:.2} | {:.4}\n", point.alpha, point.hit_rate));
        }
        output.push_str(&format!(
            "Best alpha: {:.2} (hit rate {:.4})\n",
            self.best_alpha, self.best_hit_rate
        ));
        output
    }
}

/// Ascending grid of blend weights, inclusive of the upper bound within
/// float tolerance. Values are rounded to keep grid points readable.
pub fn alpha_grid(min: f64, max: f64, step: f64) -> Vec<f64> {
    let mut grid = Vec::new();
    let mut alpha = min;
    while alpha <= max + 1e-9 {
        grid.push((alpha * 1e6).round() / 1e6);
        alpha += step;
    }
    grid
}

/// Sweeps the grid in ascending order and keeps the first best hit rate
/// (strict `>`), so ties resolve to the smallest alpha.
pub fn tune_alpha(
    ranker: &HybridRanker,
    donor_ids: &[String],
    interactions: &[Interaction],
    grid: &[f64],
    k: usize,
) -> Result<AlphaSweepOutcome, RecommendError> {
    let mut best: Option<(f64, f64)> = None;
    let mut table = Vec::with_capacity(grid.len());
    for &alpha in grid {
        let recommendations = recommend_all(ranker, donor_ids, k, alpha)?;
        let hit_rate = top_k_hit_rate(&recommendations, interactions, k);
        info!("Alpha {:.2} -> hit rate {:.4}", alpha, hit_rate);
        table.push(AlphaPoint { alpha, hit_rate });
        if best.map_or(true, |(_, best_rate)| hit_rate > best_rate) {
            best = Some((alpha, hit_rate));
        }
    }
    // an empty grid keeps the conventional even blend
    let (best_alpha, best_hit_rate) = best.unwrap_or((0.5, 0.0));
    Ok(AlphaSweepOutcome {
        best_alpha,
        best_hit_rate,
        table,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(items: &[&str]) -> Vec<RankedItem> {
        items
            .iter()
            .enumerate()
            .map(|(pos, id)| RankedItem {
                item_id: id.to_string(),
                score: 10.0 - pos as f64,
            })
            .collect()
    }

    fn record(donor: &str, item: &str) -> Interaction {
        Interaction {
            donor_id: donor.to_string(),
            item_id: item.to_string(),
            score: 1.0,
        }
    }

    #[test]
    fn hit_rate_counts_intersecting_donors() {
        let mut recommendations = HashMap::new();
        recommendations.insert("d1".to_string(), ranked(&["n1", "n2"]));
        recommendations.insert("d2".to_string(), ranked(&["n3", "n4"]));
        let interactions = vec![record("d1", "n2"), record("d2", "n9")];
        let rate = top_k_hit_rate(&recommendations, &interactions, 2);
        assert!((rate - 0.5).abs() < 1e-12);
    }

    #[test]
    fn hit_rate_is_bounded_and_zero_when_empty() {
        let empty: HashMap<String, Vec<RankedItem>> = HashMap::new();
        assert_eq!(top_k_hit_rate(&empty, &[record("d1", "n1")], 5), 0.0);

        let mut only_empty_lists = HashMap::new();
        only_empty_lists.insert("d1".to_string(), Vec::new());
        assert_eq!(
            top_k_hit_rate(&only_empty_lists, &[record("d1", "n1")], 5),
            0.0
        );

        let mut recommendations = HashMap::new();
        recommendations.insert("d1".to_string(), ranked(&["n1"]));
        let rate = top_k_hit_rate(&recommendations, &[record("d1", "n1")], 5);
        assert!((0.0..=1.0).contains(&rate));
        assert_eq!(rate, 1.0);
    }

    #[test]
    fn hit_rate_only_looks_at_the_top_k() {
        let mut recommendations = HashMap::new();
        recommendations.insert("d1".to_string(), ranked(&["n1", "n2", "n3"]));
        // the only actual item sits at rank 3, outside k = 2
        let interactions = vec![record("d1", "n3")];
        assert_eq!(top_k_hit_rate(&recommendations, &interactions, 2), 0.0);
        assert_eq!(top_k_hit_rate(&recommendations, &interactions, 3), 1.0);
    }

    #[test]
    fn grid_covers_the_inclusive_range() {
        let grid = alpha_grid(0.1, 0.9, 0.1);
        assert_eq!(grid.len(), 9);
        assert!((grid[0] - 0.1).abs() < 1e-9);
        assert!((grid[8] - 0.9).abs() < 1e-9);
    }
}
