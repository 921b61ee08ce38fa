// src/data/loader.rs
//
// CSV ingestion for the four reference tables. Parse functions are generic
// over any reader so tests can feed in-memory bytes; the load_* wrappers
// open files and attach path context.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::models::{Donor, Interaction, Item, ItemKind};
use crate::utils::constants::{RATING_SCALE_MAX, RATING_SCALE_MIN};

#[derive(Debug, Deserialize)]
struct DonorRow {
    donor_id: String,
    #[serde(default)]
    preferred_categories: String,
    #[serde(default)]
    location: String,
}

#[derive(Debug, Deserialize)]
struct NgoRow {
    ngo_id: String,
    #[serde(default)]
    need_categories: String,
    #[serde(default)]
    location: String,
}

#[derive(Debug, Deserialize)]
struct OrphanageRow {
    orphanage_id: String,
    #[serde(default)]
    need_categories: String,
    #[serde(default)]
    location: String,
}

#[derive(Debug, Deserialize)]
struct InteractionRow {
    donor_id: String,
    item_id: String,
    interaction_score: f64,
}

pub fn parse_donors<R: Read>(reader: R) -> Result<Vec<Donor>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut donors = Vec::new();
    for row in csv_reader.deserialize::<DonorRow>() {
        let row = row.context("Failed to parse donor profile row")?;
        donors.push(Donor {
            donor_id: row.donor_id,
            preferred_categories: row.preferred_categories,
            location: row.location,
        });
    }
    Ok(donors)
}

pub fn parse_ngos<R: Read>(reader: R) -> Result<Vec<Item>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut items = Vec::new();
    for row in csv_reader.deserialize::<NgoRow>() {
        let row = row.context("Failed to parse NGO profile row")?;
        items.push(Item {
            item_id: row.ngo_id,
            categories: row.need_categories,
            location: row.location,
            kind: ItemKind::Ngo,
        });
    }
    Ok(items)
}

pub fn parse_orphanages<R: Read>(reader: R) -> Result<Vec<Item>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut items = Vec::new();
    for row in csv_reader.deserialize::<OrphanageRow>() {
        let row = row.context("Failed to parse orphanage profile row")?;
        items.push(Item {
            item_id: row.orphanage_id,
            categories: row.need_categories,
            location: row.location,
            kind: ItemKind::Orphanage,
        });
    }
    Ok(items)
}

/// Parses the interaction log. Rows with scores outside the rating scale are
/// rejected with row context rather than clamped.
pub fn parse_interactions<R: Read>(reader: R) -> Result<Vec<Interaction>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut interactions = Vec::new();
    for (idx, row) in csv_reader.deserialize::<InteractionRow>().enumerate() {
        let row = row.with_context(|| format!("Failed to parse interaction row {}", idx + 1))?;
        if !(RATING_SCALE_MIN..=RATING_SCALE_MAX).contains(&row.interaction_score) {
            bail!(
                "Interaction row {} ({} -> {}): score {} outside the {}..={} rating scale",
                idx + 1,
                row.donor_id,
                row.item_id,
                row.interaction_score,
                RATING_SCALE_MIN,
                RATING_SCALE_MAX
            );
        }
        interactions.push(Interaction {
            donor_id: row.donor_id,
            item_id: row.item_id,
            score: row.interaction_score,
        });
    }
    Ok(interactions)
}

pub fn load_donors(path: &Path) -> Result<Vec<Donor>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open donor profiles at {}", path.display()))?;
    parse_donors(file)
}

pub fn load_ngos(path: &Path) -> Result<Vec<Item>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open NGO profiles at {}", path.display()))?;
    parse_ngos(file)
}

pub fn load_orphanages(path: &Path) -> Result<Vec<Item>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open orphanage profiles at {}", path.display()))?;
    parse_orphanages(file)
}

pub fn load_interactions(path: &Path) -> Result<Vec<Interaction>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open interaction log at {}", path.display()))?;
    parse_interactions(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_donor_profiles_by_header_name() {
        let csv = "donor_id,preferred_categories,location\n\
                   d1,\"education,health\",Pune\n\
                   d2,food|shelter,Mumbai\n";
        let donors = parse_donors(csv.as_bytes()).unwrap();
        assert_eq!(donors.len(), 2);
        assert_eq!(donors[0].donor_id, "d1");
        assert_eq!(donors[0].preferred_categories, "education,health");
        assert_eq!(donors[1].location, "Mumbai");
    }

    #[test]
    fn empty_category_field_is_allowed() {
        let csv = "ngo_id,need_categories,location\nn1,,Delhi\n";
        let items = parse_ngos(csv.as_bytes()).unwrap();
        assert_eq!(items[0].categories, "");
        assert_eq!(items[0].kind, ItemKind::Ngo);
    }

    #[test]
    fn orphanage_rows_carry_their_kind() {
        let csv = "orphanage_id,need_categories,location\no1,childcare,Pune\n";
        let items = parse_orphanages(csv.as_bytes()).unwrap();
        assert_eq!(items[0].item_id, "o1");
        assert_eq!(items[0].kind, ItemKind::Orphanage);
    }

    #[test]
    fn interaction_scores_must_be_on_the_rating_scale() {
        let ok = "donor_id,item_id,interaction_score\nd1,n1,3\nd1,n2,0\n";
        assert_eq!(parse_interactions(ok.as_bytes()).unwrap().len(), 2);

        let too_high = "donor_id,item_id,interaction_score\nd1,n1,3.5\n";
        let err = parse_interactions(too_high.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("outside"));

        let negative = "donor_id,item_id,interaction_score\nd1,n1,-1\n";
        assert!(parse_interactions(negative.as_bytes()).is_err());
    }

    #[test]
    fn unparsable_score_is_an_error() {
        let bad = "donor_id,item_id,interaction_score\nd1,n1,high\n";
        assert!(parse_interactions(bad.as_bytes()).is_err());
    }
}
