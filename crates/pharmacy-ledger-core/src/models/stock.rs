//! Stock model: how much of a medicine remains, per category.
//!
//! Two representations exist:
//!
//! - `FlatUnit`: a plain count of sellable units (syrups, injections, ...).
//! - `DecomposedTablet`: whole strips plus loose tablets, with the pack size.
//!
//! Quantities handed to [`Stock::apply_decrement`] are always in the
//! medicine's native unit: tablets for decomposed stock, units otherwise.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pack size used when a stored tablet stock has no usable `tabletsPerStrip`.
pub const DEFAULT_TABLETS_PER_STRIP: u32 = 10;

/// Stock model errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StockError {
    #[error("cannot remove {requested} units, only {available} available")]
    Underflow { requested: u64, available: u64 },

    #[error("stock count overflow")]
    Overflow,
}

pub type StockResult<T> = Result<T, StockError>;

/// Category-tagged stock representation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Stock {
    /// Count of sellable units.
    #[serde(rename_all = "camelCase")]
    FlatUnit { quantity: u64 },
    /// Whole strips plus loose tablets (`loose_tablets < tablets_per_strip`).
    #[serde(rename_all = "camelCase")]
    DecomposedTablet {
        strips: u64,
        loose_tablets: u64,
        tablets_per_strip: u32,
    },
}

impl Stock {
    /// Flat stock of `quantity` units.
    pub fn flat(quantity: u64) -> Self {
        Stock::FlatUnit { quantity }
    }

    /// Tablet stock in canonical form.
    ///
    /// Loose tablets beyond a full strip are carried into `strips`, and a
    /// zero pack size falls back to [`DEFAULT_TABLETS_PER_STRIP`].
    pub fn tablets(strips: u64, loose_tablets: u64, tablets_per_strip: u32) -> Self {
        Stock::DecomposedTablet {
            strips,
            loose_tablets,
            tablets_per_strip,
        }
        .normalized(DEFAULT_TABLETS_PER_STRIP)
    }

    /// Tablet stock holding exactly `total` tablets.
    pub fn tablets_from_units(total: u64, tablets_per_strip: u32) -> Self {
        let per_strip = effective_pack_size(tablets_per_strip, DEFAULT_TABLETS_PER_STRIP);
        Stock::DecomposedTablet {
            strips: total / u64::from(per_strip),
            loose_tablets: total % u64::from(per_strip),
            tablets_per_strip: per_strip,
        }
    }

    /// Total units available, never negative.
    pub fn available_units(&self) -> u64 {
        match *self {
            Stock::FlatUnit { quantity } => quantity,
            Stock::DecomposedTablet {
                strips,
                loose_tablets,
                tablets_per_strip,
            } => {
                let per_strip = effective_pack_size(tablets_per_strip, DEFAULT_TABLETS_PER_STRIP);
                strips
                    .saturating_mul(u64::from(per_strip))
                    .saturating_add(loose_tablets)
            }
        }
    }

    /// Whether `units` can be taken out of this stock.
    pub fn can_supply(&self, units: u64) -> bool {
        units <= self.available_units()
    }

    /// Subtract `units_sold` and return the re-normalized stock.
    ///
    /// Does not clamp: asking for more than [`Stock::available_units`] is
    /// an error and leaves `self` untouched.
    pub fn apply_decrement(&self, units_sold: u64) -> StockResult<Stock> {
        let available = self.available_units();
        let remaining = available
            .checked_sub(units_sold)
            .ok_or(StockError::Underflow {
                requested: units_sold,
                available,
            })?;
        Ok(self.with_units(remaining))
    }

    /// Add `units` and return the re-normalized stock.
    pub fn apply_increment(&self, units: u64) -> StockResult<Stock> {
        let total = self
            .available_units()
            .checked_add(units)
            .ok_or(StockError::Overflow)?;
        Ok(self.with_units(total))
    }

    /// Pack size for tablet stock, `None` for flat stock.
    pub fn tablets_per_strip(&self) -> Option<u32> {
        match *self {
            Stock::FlatUnit { .. } => None,
            Stock::DecomposedTablet {
                tablets_per_strip, ..
            } => Some(effective_pack_size(tablets_per_strip, DEFAULT_TABLETS_PER_STRIP)),
        }
    }

    /// Re-establish canonical form.
    ///
    /// For tablet stock: `loose_tablets < tablets_per_strip`, and a zero
    /// pack size is replaced by `fallback_per_strip`.
    pub fn normalized(&self, fallback_per_strip: u32) -> Stock {
        match *self {
            Stock::FlatUnit { .. } => *self,
            Stock::DecomposedTablet {
                strips,
                loose_tablets,
                tablets_per_strip,
            } => {
                let per_strip = effective_pack_size(tablets_per_strip, fallback_per_strip);
                let total = strips
                    .saturating_mul(u64::from(per_strip))
                    .saturating_add(loose_tablets);
                Stock::tablets_from_units(total, per_strip)
            }
        }
    }

    /// Whether the stock is already in canonical form.
    pub fn is_canonical(&self) -> bool {
        match *self {
            Stock::FlatUnit { .. } => true,
            Stock::DecomposedTablet {
                loose_tablets,
                tablets_per_strip,
                ..
            } => tablets_per_strip >= 1 && loose_tablets < u64::from(tablets_per_strip),
        }
    }

    fn with_units(&self, total: u64) -> Stock {
        match *self {
            Stock::FlatUnit { .. } => Stock::FlatUnit { quantity: total },
            Stock::DecomposedTablet {
                tablets_per_strip, ..
            } => Stock::tablets_from_units(total, tablets_per_strip),
        }
    }
}

fn effective_pack_size(tablets_per_strip: u32, fallback: u32) -> u32 {
    match (tablets_per_strip, fallback) {
        (0, 0) => DEFAULT_TABLETS_PER_STRIP,
        (0, fallback) => fallback,
        (n, _) => n,
    }
}
