//! Medicine name extraction from vision model output.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scan errors.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Vision backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

pub type ScanResult<T> = Result<T, ScanError>;

/// Structured reply of the vision model.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScanOutput {
    #[serde(default)]
    pub medicines: Vec<String>,
}

/// Parse model output into a list of medicine names.
///
/// Names are trimmed; blanks and case-insensitive repeats are dropped,
/// keeping the first spelling seen.
pub fn parse_scan_output(text: &str) -> ScanResult<ScanOutput> {
    // Models sometimes wrap the JSON in prose or code fences
    let json_start = text
        .find('{')
        .ok_or_else(|| ScanError::InvalidFormat("No JSON object found in response".into()))?;
    let json_end = text
        .rfind('}')
        .ok_or_else(|| ScanError::InvalidFormat("No closing brace found in response".into()))?;
    if json_end < json_start {
        return Err(ScanError::InvalidFormat("Unbalanced braces in response".into()));
    }

    let raw: ScanOutput = serde_json::from_str(&text[json_start..=json_end])?;

    let mut seen = HashSet::new();
    let medicines = raw
        .medicines
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(name.to_lowercase()))
        .collect();

    Ok(ScanOutput { medicines })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_scan_output() {
        let output =
            parse_scan_output(r#"{"medicines":["Paracetamol 500mg","Amoxicillin"]}"#).unwrap();
        assert_eq!(output.medicines, vec!["Paracetamol 500mg", "Amoxicillin"]);
    }

    #[test]
    fn test_parse_with_prose_and_fences() {
        let text = "Here is what I could read:\n```json\n{\"medicines\": [\"Cetirizine\"]}\n```";
        let output = parse_scan_output(text).unwrap();
        assert_eq!(output.medicines, vec!["Cetirizine"]);
    }

    #[test]
    fn test_parse_cleans_names() {
        let text = r#"{"medicines":["  Aspirin ", "", "aspirin", "ASPIRIN", "Ibuprofen"]}"#;
        let output = parse_scan_output(text).unwrap();
        assert_eq!(output.medicines, vec!["Aspirin", "Ibuprofen"]);
    }

    #[test]
    fn test_parse_missing_field_is_empty() {
        let output = parse_scan_output("{}").unwrap();
        assert!(output.medicines.is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_scan_output("I could not read this prescription."),
            Err(ScanError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_scan_output("} oops {"),
            Err(ScanError::InvalidFormat(_))
        ));
        assert!(matches!(
            parse_scan_output(r#"{"medicines": "Aspirin"}"#),
            Err(ScanError::JsonParse(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_parsed_names_are_clean(names in proptest::collection::vec("[ a-cA-C]{0,4}", 0..12)) {
            let text = serde_json::json!({ "medicines": names }).to_string();
            let output = parse_scan_output(&text).unwrap();

            let mut seen = HashSet::new();
            for name in &output.medicines {
                prop_assert!(!name.is_empty());
                prop_assert_eq!(name.trim(), name.as_str());
                prop_assert!(seen.insert(name.to_lowercase()));
            }
        }
    }
}
