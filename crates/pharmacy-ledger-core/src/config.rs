//! Ledger configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::DEFAULT_TABLETS_PER_STRIP;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Tunables for the ledger. Every field has a default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// Pack size assumed when stored tablet stock lacks one
    pub default_tablets_per_strip: u32,
    /// Currency symbol for display formatting only
    pub currency_symbol: String,
    /// Units at or below which a medicine counts as low stock
    pub low_stock_threshold: u64,
    /// Minimum Jaro-Winkler similarity for a scanned name to match
    pub fuzzy_match_threshold: f64,
    /// Maximum catalog matches returned per scanned name
    pub max_scan_matches: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_tablets_per_strip: DEFAULT_TABLETS_PER_STRIP,
            currency_symbol: "₹".into(),
            low_stock_threshold: 10,
            fuzzy_match_threshold: 0.85,
            max_scan_matches: 5,
        }
    }
}

impl LedgerConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: LedgerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_tablets_per_strip == 0 {
            return Err(ConfigError::Invalid(
                "default_tablets_per_strip must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.fuzzy_match_threshold) {
            return Err(ConfigError::Invalid(
                "fuzzy_match_threshold must be within 0.0..=1.0".into(),
            ));
        }
        Ok(())
    }

    /// Format an amount for display, e.g. `₹12.50`.
    pub fn format_amount(&self, amount: f64) -> String {
        format!("{}{:.2}", self.currency_symbol, amount)
    }
}
