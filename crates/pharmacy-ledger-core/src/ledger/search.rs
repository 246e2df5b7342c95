//! Catalog search and prescription-scan matching.

use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;

use crate::models::Medicine;

/// In-stock medicines whose name contains `query`, case-insensitively.
///
/// An empty query lists every in-stock medicine. Catalog order is kept.
pub fn search<'a>(catalog: &'a [Medicine], query: &str) -> Vec<&'a Medicine> {
    let query = query.trim().to_lowercase();
    catalog
        .iter()
        .filter(|m| m.in_stock())
        .filter(|m| query.is_empty() || m.name.to_lowercase().contains(&query))
        .collect()
}

/// A catalog entry suggested for a scanned name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredMedicine {
    pub medicine_id: String,
    pub name: String,
    /// Similarity (0.0 - 1.0)
    pub score: f64,
    pub available_units: u64,
}

/// Suggestions for one scanned name, best first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanMatch {
    pub scanned_name: String,
    pub candidates: Vec<ScoredMedicine>,
}

/// Rank in-stock catalog entries against names read off a prescription.
///
/// Scanned names are often misspelt, so besides substring hits this falls
/// back to Jaro-Winkler similarity against the full name and each word of
/// it. Candidates below `threshold` are dropped, at most `limit` are kept.
pub fn match_scanned_names(
    catalog: &[Medicine],
    scanned: &[String],
    threshold: f64,
    limit: usize,
) -> Vec<ScanMatch> {
    scanned
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(|name| {
            let mut candidates: Vec<ScoredMedicine> = catalog
                .iter()
                .filter(|m| m.in_stock())
                .map(|m| ScoredMedicine {
                    medicine_id: m.id.clone(),
                    name: m.name.clone(),
                    score: score_name(name, &m.name),
                    available_units: m.available_units(),
                })
                .filter(|c| c.score >= threshold)
                .collect();

            candidates.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            candidates.truncate(limit);

            ScanMatch {
                scanned_name: name.to_string(),
                candidates,
            }
        })
        .collect()
}

/// Similarity between a scanned name and a catalog name (0.0 - 1.0).
fn score_name(scanned: &str, catalog_name: &str) -> f64 {
    let scanned = scanned.to_lowercase();
    let catalog_name = catalog_name.to_lowercase();

    if catalog_name.contains(&scanned) {
        return 1.0;
    }

    catalog_name
        .split_whitespace()
        .map(|word| jaro_winkler(&scanned, word))
        .fold(jaro_winkler(&scanned, &catalog_name), f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, MedicineInput};

    fn catalog() -> Vec<Medicine> {
        vec![
            Medicine::new(MedicineInput::tablet("Paracetamol 500mg", "A-1", 5.5, 10, 0, 10)),
            Medicine::new(MedicineInput::tablet("Ibuprofen 200mg", "A-2", 8.75, 8, 0, 10)),
            Medicine::new(MedicineInput::units("Cough Syrup", "C-3", Category::Syrup, 12.0, 0)),
            Medicine::new(MedicineInput::tablet("Amoxicillin 250mg", "B-1", 15.2, 5, 0, 10)),
        ]
    }

    #[test]
    fn test_search_substring() {
        let catalog = catalog();
        let results = search(&catalog, "PARA");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Paracetamol 500mg");
    }

    #[test]
    fn test_search_skips_out_of_stock() {
        let catalog = catalog();
        assert!(search(&catalog, "syrup").is_empty());
    }

    #[test]
    fn test_empty_query_lists_in_stock() {
        let catalog = catalog();
        let names: Vec<_> = search(&catalog, "  ").iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Paracetamol 500mg", "Ibuprofen 200mg", "Amoxicillin 250mg"]
        );
    }

    #[test]
    fn test_match_misspelt_name() {
        let catalog = catalog();
        let matches = match_scanned_names(&catalog, &["Paracetmol".to_string()], 0.85, 5);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].candidates[0].name, "Paracetamol 500mg");
        assert!(matches[0].candidates[0].score < 1.0);
    }

    #[test]
    fn test_match_exact_scores_one() {
        let catalog = catalog();
        let matches = match_scanned_names(&catalog, &["amoxicillin".to_string()], 0.85, 5);
        assert_eq!(matches[0].candidates[0].score, 1.0);
    }

    #[test]
    fn test_match_drops_blank_and_unrelated() {
        let catalog = catalog();
        let matches = match_scanned_names(
            &catalog,
            &["  ".to_string(), "Zyrtec".to_string()],
            0.85,
            5,
        );

        assert_eq!(matches.len(), 1);
        assert!(matches[0].candidates.is_empty());
    }

    #[test]
    fn test_match_limit() {
        let catalog = catalog();
        let matches = match_scanned_names(&catalog, &["mg".to_string()], 0.0, 2);
        assert_eq!(matches[0].candidates.len(), 2);
    }
}
