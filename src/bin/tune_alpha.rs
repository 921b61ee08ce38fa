// src/bin/tune_alpha.rs
//
// Standalone sweep tool for the hybrid blend weight. Loads the datasets,
// trains the predictor once, then evaluates the top-K hit rate across an
// alpha grid and reports the best value.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use recommender_lib::data::catalog::ItemCatalog;
use recommender_lib::data::interactions::InteractionStore;
use recommender_lib::data::loader;
use recommender_lib::evaluation::{alpha_grid, tune_alpha};
use recommender_lib::latent::{train_test_split, FactorModel, FactorModelParams};
use recommender_lib::recommend::HybridRanker;
use recommender_lib::scoring::{ContentScorer, ContentStrategy};
use recommender_lib::utils::constants::{
    DEFAULT_ALPHA_MAX, DEFAULT_ALPHA_MIN, DEFAULT_ALPHA_STEP, DEFAULT_TOP_K,
};
use recommender_lib::utils::env::load_env;

#[derive(Parser, Debug)]
#[command(
    name = "tune_alpha",
    about = "Sweep the hybrid blend weight and report the best top-K hit rate",
    version
)]
struct Cli {
    /// Directory containing the four input CSV files
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,
    /// Content similarity strategy (overlap | cosine)
    #[arg(long, default_value = "overlap")]
    strategy: ContentStrategy,
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,
    #[arg(long, default_value_t = DEFAULT_ALPHA_MIN)]
    alpha_min: f64,
    #[arg(long, default_value_t = DEFAULT_ALPHA_MAX)]
    alpha_max: f64,
    #[arg(long, default_value_t = DEFAULT_ALPHA_STEP)]
    alpha_step: f64,
    #[arg(long, default_value_t = 50)]
    factors: usize,
    #[arg(long, default_value_t = 20)]
    epochs: usize,
    #[arg(long, default_value_t = 0.005)]
    learning_rate: f64,
    #[arg(long, default_value_t = 0.02)]
    regularization: f64,
    /// Held-out fraction for predictor training
    #[arg(long, default_value_t = 0.2)]
    test_fraction: f64,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Write the sweep outcome as JSON to this path
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    load_env();
    let cli = Cli::parse();

    info!("Starting alpha sweep ({} strategy)", cli.strategy);

    let donors = loader::load_donors(&cli.data_dir.join("donor_profiles.csv"))?;
    let ngos = loader::load_ngos(&cli.data_dir.join("ngo_profiles.csv"))?;
    let orphanages = loader::load_orphanages(&cli.data_dir.join("orphanage_profiles.csv"))?;
    let interactions =
        loader::load_interactions(&cli.data_dir.join("donor_item_interactions.csv"))?;
    info!(
        "Loaded {} donors, {} items, {} interactions",
        donors.len(),
        ngos.len() + orphanages.len(),
        interactions.len()
    );

    let catalog = ItemCatalog::from_tables(ngos, orphanages);
    let store = InteractionStore::from_log(interactions);
    let scorer = ContentScorer::build(cli.strategy, &catalog);

    let (trainset, testset) = train_test_split(store.interactions(), cli.test_fraction, cli.seed);
    let params = FactorModelParams {
        n_factors: cli.factors,
        n_epochs: cli.epochs,
        learning_rate: cli.learning_rate,
        regularization: cli.regularization,
    };
    let predictor = FactorModel::fit(&trainset, params, cli.seed);
    info!(
        "Predictor held-out RMSE: {:.4}, MAE: {:.4}",
        predictor.rmse(&testset),
        predictor.mae(&testset)
    );

    let ranker = HybridRanker::new(&catalog, &donors, &store, &predictor, &scorer);
    let donor_ids: Vec<String> = donors.iter().map(|d| d.donor_id.clone()).collect();
    let grid = alpha_grid(cli.alpha_min, cli.alpha_max, cli.alpha_step);
    let outcome = tune_alpha(&ranker, &donor_ids, store.interactions(), &grid, cli.top_k)?;

    println!("\n=== ALPHA SWEEP SUMMARY ===");
    println!("Strategy: {}", cli.strategy);
    println!("Donors evaluated: {}", donor_ids.len());
    println!("Top-K: {}", cli.top_k);
    println!();
    println!("{}", outcome.table_display());

    if let Some(path) = &cli.output {
        let json =
            serde_json::to_string_pretty(&outcome).context("Failed to serialize sweep outcome")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write sweep outcome to {}", path.display()))?;
        info!("Sweep outcome written to {}", path.display());
    }

    Ok(())
}
