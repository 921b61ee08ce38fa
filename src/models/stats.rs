// src/models/stats.rs
use chrono::NaiveDateTime;

/// Aggregated counters and timings for one pipeline run, printed in the
/// end-of-run summary.
#[derive(Debug, Clone)]
pub struct RunStats {
    pub run_id: String,
    pub run_timestamp: NaiveDateTime,
    pub description: Option<String>,
    pub total_donors: usize,
    pub total_items: usize,
    pub total_interactions: usize,
    pub loading_time: f64,
    pub derivation_time: f64,
    pub training_time: f64,
    pub tuning_time: f64,
    pub total_processing_time: f64,
    pub best_alpha: Option<f64>,
    pub final_hit_rate: Option<f64>,
}

impl RunStats {
    pub fn new(run_id: &str, run_timestamp: NaiveDateTime, description: Option<String>) -> Self {
        Self {
            run_id: run_id.to_string(),
            run_timestamp,
            description,
            total_donors: 0,
            total_items: 0,
            total_interactions: 0,
            loading_time: 0.0,
            derivation_time: 0.0,
            training_time: 0.0,
            tuning_time: 0.0,
            total_processing_time: 0.0,
            best_alpha: None,
            final_hit_rate: None,
        }
    }
}
