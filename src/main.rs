// src/main.rs
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use indicatif::ProgressBar;
use log::info;
use uuid::Uuid;

use recommender_lib::data::catalog::ItemCatalog;
use recommender_lib::data::interactions::InteractionStore;
use recommender_lib::data::loader;
use recommender_lib::evaluation::{alpha_grid, recommend_all, top_k_hit_rate, tune_alpha};
use recommender_lib::latent::{train_test_split, FactorModel, FactorModelParams};
use recommender_lib::models::stats::RunStats;
use recommender_lib::recommend::HybridRanker;
use recommender_lib::scoring::{ContentScorer, ContentStrategy};
use recommender_lib::utils::constants::{
    DEFAULT_ALPHA_MAX, DEFAULT_ALPHA_MIN, DEFAULT_ALPHA_STEP, DEFAULT_TOP_K,
};
use recommender_lib::utils::env::load_env;
use recommender_lib::utils::progress::{phase_bar_style, ProgressConfig};

#[derive(Parser, Debug)]
#[command(
    name = "recommend",
    about = "Hybrid donor-to-organization recommendation pipeline",
    version
)]
struct Cli {
    /// Directory containing donor_profiles.csv, ngo_profiles.csv,
    /// orphanage_profiles.csv and donor_item_interactions.csv
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    /// Directory for recommendation output and serialized models
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,
    /// Content similarity strategy (overlap | cosine)
    #[arg(long, default_value = "overlap")]
    strategy: ContentStrategy,
    /// Ranked list length
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,
    /// Fixed blend weight; skips the tuning sweep when provided
    #[arg(long)]
    alpha: Option<f64>,
    /// Blend-weight sweep grid
    #[arg(long, default_value_t = DEFAULT_ALPHA_MIN)]
    alpha_min: f64,
    #[arg(long, default_value_t = DEFAULT_ALPHA_MAX)]
    alpha_max: f64,
    #[arg(long, default_value_t = DEFAULT_ALPHA_STEP)]
    alpha_step: f64,
    /// Latent factor model hyperparameters
    #[arg(long, default_value_t = 50)]
    factors: usize,
    #[arg(long, default_value_t = 20)]
    epochs: usize,
    #[arg(long, default_value_t = 0.005)]
    learning_rate: f64,
    #[arg(long, default_value_t = 0.02)]
    regularization: f64,
    /// Held-out fraction for predictor error reporting
    #[arg(long, default_value_t = 0.2)]
    test_fraction: f64,
    /// RNG seed for training and splits
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    load_env();
    let cli = Cli::parse();

    info!("Starting donor recommendation pipeline");

    let progress_config = ProgressConfig::from_env();
    let main_pb = if progress_config.enabled {
        let pb = ProgressBar::new(4);
        pb.set_style(phase_bar_style());
        pb.set_message("Initializing pipeline...");
        Some(pb)
    } else {
        None
    };

    let run_id = Uuid::new_v4().to_string();
    let run_timestamp = Utc::now().naive_utc();
    let mut stats = RunStats::new(
        &run_id,
        run_timestamp,
        Some(format!(
            "Hybrid recommendation run ({} strategy)",
            cli.strategy
        )),
    );
    let mut phase_times: HashMap<String, Duration> = HashMap::new();

    // Phase 1: load the reference tables and the interaction log
    if let Some(pb) = &main_pb {
        pb.set_message("Phase 1: Loading reference tables");
    }
    let phase1_start = Instant::now();
    info!("Phase 1: Loading reference tables from {}", cli.data_dir.display());

    let donors = loader::load_donors(&cli.data_dir.join("donor_profiles.csv"))?;
    let ngos = loader::load_ngos(&cli.data_dir.join("ngo_profiles.csv"))?;
    let orphanages = loader::load_orphanages(&cli.data_dir.join("orphanage_profiles.csv"))?;
    let interactions =
        loader::load_interactions(&cli.data_dir.join("donor_item_interactions.csv"))?;

    stats.total_donors = donors.len();
    stats.total_items = ngos.len() + orphanages.len();
    stats.total_interactions = interactions.len();
    let phase1_duration = phase1_start.elapsed();
    phase_times.insert("loading".to_string(), phase1_duration);
    stats.loading_time = phase1_duration.as_secs_f64();
    info!(
        "Loaded {} donors, {} NGOs, {} orphanages, {} interactions",
        donors.len(),
        ngos.len(),
        orphanages.len(),
        interactions.len()
    );
    if let Some(pb) = &main_pb {
        pb.inc(1);
    }

    // Phase 2: derived structures
    if let Some(pb) = &main_pb {
        pb.set_message("Phase 2: Deriving matrices");
    }
    let phase2_start = Instant::now();
    info!("Phase 2: Building the item catalog, interaction pivot and content scorer");

    let catalog = ItemCatalog::from_tables(ngos, orphanages);
    let store = InteractionStore::from_log(interactions);
    let scorer = ContentScorer::build(cli.strategy, &catalog);

    let phase2_duration = phase2_start.elapsed();
    phase_times.insert("derivation".to_string(), phase2_duration);
    stats.derivation_time = phase2_duration.as_secs_f64();
    info!(
        "Catalog holds {} items; pivot is {} donors x {} items",
        catalog.len(),
        store.donor_count(),
        store.item_count()
    );
    if let Some(pb) = &main_pb {
        pb.inc(1);
    }

    // Phase 3: train the latent-factor predictor
    if let Some(pb) = &main_pb {
        pb.set_message("Phase 3: Training the factor model");
    }
    let phase3_start = Instant::now();
    info!(
        "Phase 3: Training the factor model ({} factors, {} epochs)",
        cli.factors, cli.epochs
    );

    let (trainset, testset) = train_test_split(store.interactions(), cli.test_fraction, cli.seed);
    let params = FactorModelParams {
        n_factors: cli.factors,
        n_epochs: cli.epochs,
        learning_rate: cli.learning_rate,
        regularization: cli.regularization,
    };
    let predictor = FactorModel::fit(&trainset, params, cli.seed);
    info!(
        "Predictor held-out RMSE: {:.4}, MAE: {:.4} ({} test interactions)",
        predictor.rmse(&testset),
        predictor.mae(&testset),
        testset.len()
    );

    let phase3_duration = phase3_start.elapsed();
    phase_times.insert("training".to_string(), phase3_duration);
    stats.training_time = phase3_duration.as_secs_f64();
    if let Some(pb) = &main_pb {
        pb.inc(1);
    }

    // Phase 4: blend-weight tuning and final recommendations
    if let Some(pb) = &main_pb {
        pb.set_message("Phase 4: Tuning alpha and ranking");
    }
    let phase4_start = Instant::now();

    let ranker = HybridRanker::new(&catalog, &donors, &store, &predictor, &scorer);
    let donor_ids: Vec<String> = donors.iter().map(|d| d.donor_id.clone()).collect();

    let best_alpha = match cli.alpha {
        Some(alpha) => {
            info!("Phase 4: Using fixed alpha {:.2}", alpha);
            alpha
        }
        None => {
            let grid = alpha_grid(cli.alpha_min, cli.alpha_max, cli.alpha_step);
            info!("Phase 4: Sweeping alpha over {} grid points", grid.len());
            let outcome = tune_alpha(
                &ranker,
                &donor_ids,
                store.interactions(),
                &grid,
                cli.top_k,
            )?;
            info!("\n{}", outcome.table_display());
            outcome.best_alpha
        }
    };

    let final_recommendations = recommend_all(&ranker, &donor_ids, cli.top_k, best_alpha)?;
    let final_hit_rate = top_k_hit_rate(&final_recommendations, store.interactions(), cli.top_k);
    stats.best_alpha = Some(best_alpha);
    stats.final_hit_rate = Some(final_hit_rate);

    fs::create_dir_all(&cli.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            cli.output_dir.display()
        )
    })?;
    let recommendations_path = cli.output_dir.join("recommendations.json");
    let json = serde_json::to_string_pretty(&final_recommendations)
        .context("Failed to serialize recommendations")?;
    fs::write(&recommendations_path, json).with_context(|| {
        format!(
            "Failed to write recommendations to {}",
            recommendations_path.display()
        )
    })?;
    predictor.save_to_file(&cli.output_dir.join("factor_model.json"))?;

    let phase4_duration = phase4_start.elapsed();
    phase_times.insert("tuning".to_string(), phase4_duration);
    stats.tuning_time = phase4_duration.as_secs_f64();
    if let Some(pb) = &main_pb {
        pb.inc(1);
        pb.finish_with_message(format!(
            "Pipeline complete: alpha {:.2}, hit rate {:.4}",
            best_alpha, final_hit_rate
        ));
    }

    let total_time = phase1_duration + phase2_duration + phase3_duration + phase4_duration;
    stats.total_processing_time = total_time.as_secs_f64();

    info!("=== Pipeline Summary ===");
    info!("Run ID: {}", stats.run_id);
    info!("Run timestamp: {}", stats.run_timestamp);
    if let Some(description) = &stats.description {
        info!("Description: {}", description);
    }
    info!("Total donors: {}", stats.total_donors);
    info!("Total items: {}", stats.total_items);
    info!("Total interactions: {}", stats.total_interactions);
    info!("Best alpha: {:.2}", best_alpha);
    info!("Top-{} hit rate: {:.4}", cli.top_k, final_hit_rate);
    info!("Recommendations written to {}", recommendations_path.display());
    info!("=== Timing Breakdown ===");
    info!("Phase 1 (Loading): {:.2?}", phase1_duration);
    info!("Phase 2 (Derivation): {:.2?}", phase2_duration);
    info!("Phase 3 (Training): {:.2?}", phase3_duration);
    info!("Phase 4 (Tuning & Ranking): {:.2?}", phase4_duration);
    info!("Total execution time: {:.2?}", total_time);

    info!("Pipeline completed successfully!");
    Ok(())
}
