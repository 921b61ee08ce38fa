// src/scoring/overlap.rs
use crate::models::{Donor, Item};
use crate::utils::constants::CONTENT_OVERLAP_DIVISOR;

use super::parse_categories;

/// Category-overlap content score: shared category count, plus one point for
/// an exact location match, normalized by the fixed divisor. Overlaps beyond
/// the divisor saturate past 1.0 rather than being clamped; empty locations
/// never count as a match.
pub fn overlap_score(donor: &Donor, item: &Item) -> f64 {
    let donor_categories = parse_categories(&donor.preferred_categories);
    let item_categories = parse_categories(&item.categories);

    let mut raw = donor_categories.intersection(&item_categories).count() as f64;
    if !donor.location.is_empty() && donor.location == item.location {
        raw += 1.0;
    }
    raw / CONTENT_OVERLAP_DIVISOR
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemKind;

    fn donor(categories: &str, location: &str) -> Donor {
        Donor {
            donor_id: "d1".to_string(),
            preferred_categories: categories.to_string(),
            location: location.to_string(),
        }
    }

    fn item(categories: &str, location: &str) -> Item {
        Item {
            item_id: "n1".to_string(),
            categories: categories.to_string(),
            location: location.to_string(),
            kind: ItemKind::Ngo,
        }
    }

    #[test]
    fn single_shared_category_scores_one_third() {
        let d = donor("education,health", "Pune");
        let i = item("education,food", "Mumbai");
        assert!((overlap_score(&d, &i) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn location_match_adds_one_third() {
        let d = donor("education", "Pune");
        let i = item("education", "Pune");
        assert!((overlap_score(&d, &i) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_locations_do_not_count_as_a_match() {
        let d = donor("education", "");
        let i = item("education", "");
        assert!((overlap_score(&d, &i) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_categories_score_zero() {
        let d = donor("", "Pune");
        let i = item("", "Mumbai");
        assert_eq!(overlap_score(&d, &i), 0.0);
    }

    #[test]
    fn large_overlap_saturates_past_one() {
        let d = donor("a,b,c,d", "Pune");
        let i = item("a,b,c,d", "Pune");
        // four shared categories plus the location bonus
        assert!((overlap_score(&d, &i) - 5.0 / 3.0).abs() < 1e-12);
    }
}
