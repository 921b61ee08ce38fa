// src/fraud/mod.rs
//
// Fraud screening experiment for NGO/orphanage entities: label encoding,
// stratified split, feature standardization and a logistic-regression
// classifier over the tabular screening dataset.

pub mod classifier;

use std::collections::{BTreeSet, HashMap};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

pub use classifier::{ClassificationReport, FraudClassifier, StandardScaler};

/// One labeled NGO/orphanage row from the screening dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct FraudRecord {
    pub entity_type: String,
    pub years_active: f64,
    pub doc_verified: f64,
    pub total_donations: f64,
    pub avg_donation_amount: f64,
    pub donor_reviews_score: f64,
    pub success_rate: f64,
    pub label: u8,
}

/// Feature columns in the order `feature_vector` emits them.
pub const FEATURE_NAMES: [&str; 7] = [
    "entity_type",
    "years_active",
    "doc_verified",
    "total_donations",
    "avg_donation_amount",
    "donor_reviews_score",
    "success_rate",
];

/// Number of numeric features fed to the classifier (entity-type code plus
/// the six tabular columns).
pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

pub fn parse_records<R: Read>(reader: R) -> Result<Vec<FraudRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();
    for (idx, row) in csv_reader.deserialize::<FraudRecord>().enumerate() {
        let record = row.with_context(|| format!("Failed to parse screening row {}", idx + 1))?;
        if record.label > 1 {
            bail!(
                "Screening row {}: label {} is not a binary class",
                idx + 1,
                record.label
            );
        }
        records.push(record);
    }
    Ok(records)
}

pub fn load_records(path: &Path) -> Result<Vec<FraudRecord>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open screening dataset at {}", path.display()))?;
    parse_records(file)
}

/// Deterministic numeric code per entity type, assigned over the sorted
/// distinct values seen in the dataset.
pub fn encode_entity_types(records: &[FraudRecord]) -> HashMap<String, f64> {
    records
        .iter()
        .map(|r| r.entity_type.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .enumerate()
        .map(|(code, entity_type)| (entity_type, code as f64))
        .collect()
}

/// Feature vector in fixed column order. Entity types outside the encoding
/// get a sentinel code.
pub fn feature_vector(record: &FraudRecord, type_codes: &HashMap<String, f64>) -> Vec<f64> {
    vec![
        type_codes.get(&record.entity_type).copied().unwrap_or(-1.0),
        record.years_active,
        record.doc_verified,
        record.total_donations,
        record.avg_donation_amount,
        record.donor_reviews_score,
        record.success_rate,
    ]
}

/// Stratified seeded split: each label class keeps roughly `test_fraction`
/// of its rows in the test fold, preserving the class balance.
pub fn stratified_split(
    records: &[FraudRecord],
    test_fraction: f64,
    seed: u64,
) -> (Vec<FraudRecord>, Vec<FraudRecord>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();
    for label in [0u8, 1u8] {
        let mut class: Vec<FraudRecord> = records
            .iter()
            .filter(|r| r.label == label)
            .cloned()
            .collect();
        class.shuffle(&mut rng);
        let test_len = (class.len() as f64 * test_fraction).round() as usize;
        let rest = class.split_off(test_len);
        test.extend(class);
        train.extend(rest);
    }
    (train, test)
}

/// Everything needed to reuse the trained classifier on new rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudModelFile {
    pub model: FraudClassifier,
    pub scaler: StandardScaler,
    pub type_codes: HashMap<String, f64>,
}

impl FraudModelFile {
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self).context("Failed to serialize fraud model")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write fraud model to {}", path.display()))?;
        info!("Saved fraud model to {}", path.display());
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read fraud model from {}", path.display()))?;
        serde_json::from_str(&json).context("Failed to deserialize fraud model")
    }

    /// P(fraud) for one raw record, applying the stored encoding and scaling.
    pub fn predict_proba(&self, record: &FraudRecord) -> f64 {
        let features = self
            .scaler
            .transform_row(&feature_vector(record, &self.type_codes));
        self.model.predict_proba(&features)
    }
}

/// Outcome of one training/evaluation run.
#[derive(Debug)]
pub struct FraudExperiment {
    pub artifacts: FraudModelFile,
    pub report: ClassificationReport,
    pub train_size: usize,
    pub test_size: usize,
}

/// Encode, split, scale, fit and evaluate — the screening experiment end to
/// end.
pub fn run_experiment(
    records: &[FraudRecord],
    learning_rate: f64,
    max_iter: usize,
    test_fraction: f64,
    seed: u64,
) -> Result<FraudExperiment> {
    if records.is_empty() {
        bail!("Screening dataset is empty");
    }

    let type_codes = encode_entity_types(records);
    let (train, test) = stratified_split(records, test_fraction, seed);
    if train.is_empty() || test.is_empty() {
        bail!(
            "Screening dataset too small to split: {} train / {} test rows",
            train.len(),
            test.len()
        );
    }
    info!(
        "Split {} screening rows into {} train / {} test",
        records.len(),
        train.len(),
        test.len()
    );

    let raw_train: Vec<Vec<f64>> = train
        .iter()
        .map(|r| feature_vector(r, &type_codes))
        .collect();
    let raw_test: Vec<Vec<f64>> = test
        .iter()
        .map(|r| feature_vector(r, &type_codes))
        .collect();
    let labels_train: Vec<f64> = train.iter().map(|r| r.label as f64).collect();
    let labels_test: Vec<u8> = test.iter().map(|r| r.label).collect();

    // scaling parameters come from the training fold only
    let scaler = StandardScaler::fit(&raw_train);
    let x_train = scaler.transform(&raw_train);
    let x_test = scaler.transform(&raw_test);

    let mut model = FraudClassifier::new(FEATURE_COUNT, learning_rate, max_iter);
    model.fit(&x_train, &labels_train);

    let predictions: Vec<u8> = x_test.iter().map(|row| model.classify(row)).collect();
    let report = ClassificationReport::from_predictions(&labels_test, &predictions);

    Ok(FraudExperiment {
        artifacts: FraudModelFile {
            model,
            scaler,
            type_codes,
        },
        report,
        train_size: train.len(),
        test_size: test.len(),
    })
}
