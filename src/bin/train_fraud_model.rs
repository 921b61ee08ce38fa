// src/bin/train_fraud_model.rs
//
// Trains the NGO/orphanage fraud screening classifier on a labeled CSV and
// prints the evaluation report. --dry-run evaluates without writing the
// model file.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::{info, warn};

use recommender_lib::fraud::{load_records, run_experiment, FEATURE_NAMES};
use recommender_lib::utils::env::load_env;

#[derive(Parser, Debug)]
#[command(
    name = "train_fraud_model",
    about = "Train the fraud screening classifier for NGO/orphanage entities",
    version
)]
struct Cli {
    /// Labeled screening dataset
    #[arg(long, default_value = "data/fraud_fake_ngo_orphanage.csv")]
    input: PathBuf,
    /// Where to write the trained model
    #[arg(long, default_value = "output/fraud_model.json")]
    output: PathBuf,
    #[arg(long, default_value_t = 0.2)]
    test_fraction: f64,
    #[arg(long, default_value_t = 0.1)]
    learning_rate: f64,
    #[arg(long, default_value_t = 1000)]
    max_iter: usize,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Evaluate without writing the model file
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    load_env();
    let cli = Cli::parse();

    if cli.dry_run {
        warn!("DRY RUN MODE: the trained model will not be saved.");
    }

    let records = load_records(&cli.input)?;
    info!(
        "Loaded {} screening records from {}",
        records.len(),
        cli.input.display()
    );

    let experiment = run_experiment(
        &records,
        cli.learning_rate,
        cli.max_iter,
        cli.test_fraction,
        cli.seed,
    )?;

    println!("\n=== FRAUD MODEL TRAINING SUMMARY ===");
    println!(
        "Records: {} ({} train / {} test)",
        records.len(),
        experiment.train_size,
        experiment.test_size
    );
    println!(
        "Hyperparameters: learning rate {}, {} iterations, seed {}",
        cli.learning_rate, cli.max_iter, cli.seed
    );
    println!();
    println!("{}", experiment.report.display());

    println!("=== MODEL WEIGHTS (standardized features) ===");
    for (name, weight) in FEATURE_NAMES.iter().zip(experiment.artifacts.model.weights()) {
        println!("{:<20} {:+.4}", name, weight);
    }
    println!("{:<20} {:+.4}", "bias", experiment.artifacts.model.bias());

    if cli.dry_run {
        info!("Dry run enabled; model was not saved.");
    } else {
        if let Some(parent) = cli.output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        experiment.artifacts.save_to_file(&cli.output)?;
        println!("Model written to {}", cli.output.display());
    }

    Ok(())
}
