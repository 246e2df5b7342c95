//! Sale drafts: the bill being built at the counter.
//!
//! A draft is mutable and never persisted. Committing it goes through
//! [`crate::ledger::Ledger::create_sale`], which re-validates everything
//! against current stock.

use serde::{Deserialize, Serialize};

use super::{LedgerError, LedgerResult, Shortfall};
use crate::models::{Medicine, SaleLine, SaleRequest};

/// A bill under construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SaleDraft {
    customer_name: String,
    lines: Vec<SaleLine>,
}

impl SaleDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_customer(&mut self, name: impl Into<String>) {
        self.customer_name = name.into();
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn lines(&self) -> &[SaleLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add `quantity` native units of `medicine` to the bill.
    ///
    /// A medicine already on the bill has its line increased rather than a
    /// second line appended. The name and unit price are captured from
    /// `medicine` when its line is first created.
    pub fn add_item(&mut self, medicine: &Medicine, quantity: i64) -> LedgerResult<()> {
        if quantity <= 0 {
            return Err(LedgerError::InvalidQuantity {
                medicine_id: medicine.id.clone(),
                quantity: quantity.to_string(),
            });
        }

        let existing = self.lines.iter().position(|l| l.medicine_id == medicine.id);
        let already = existing.map_or(0, |i| self.lines[i].quantity);
        let requested = already.saturating_add(quantity) as u64;
        let available = medicine.available_units();
        if requested > available {
            return Err(LedgerError::InsufficientStock(vec![Shortfall {
                medicine_id: medicine.id.clone(),
                name: medicine.name.clone(),
                requested,
                available,
            }]));
        }

        match existing {
            Some(i) => self.lines[i].quantity += quantity,
            None => self.lines.push(SaleLine {
                medicine_id: medicine.id.clone(),
                name: medicine.name.clone(),
                quantity,
                price: medicine.unit_price(),
            }),
        }
        Ok(())
    }

    /// Drop the line for `medicine_id`. Returns whether a line was removed.
    pub fn remove_item(&mut self, medicine_id: &str) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.medicine_id != medicine_id);
        self.lines.len() != before
    }

    /// Running bill total.
    pub fn total(&self) -> f64 {
        self.lines
            .iter()
            .map(|l| l.quantity as f64 * l.price)
            .sum()
    }

    pub fn into_request(self) -> SaleRequest {
        SaleRequest {
            customer_name: self.customer_name,
            items: self.lines,
        }
    }
}

/// Parse a quantity typed at the counter.
///
/// Non-numeric input is an [`LedgerError::InvalidQuantity`]; range checks
/// happen when the quantity is added to a draft or sold.
pub fn parse_quantity(input: &str) -> LedgerResult<i64> {
    input
        .trim()
        .parse::<i64>()
        .map_err(|_| LedgerError::InvalidQuantity {
            medicine_id: String::new(),
            quantity: input.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, MedicineInput};

    fn tablets() -> Medicine {
        Medicine::with_id(
            "tab".into(),
            MedicineInput::tablet("Paracetamol 500mg", "A-1", 20.0, 1, 5, 10),
        )
    }

    fn syrup() -> Medicine {
        Medicine::with_id(
            "syr".into(),
            MedicineInput::units("Cough Syrup", "C-3", Category::Syrup, 12.0, 2),
        )
    }

    #[test]
    fn test_add_merges_lines() {
        let mut draft = SaleDraft::new();
        draft.add_item(&tablets(), 4).unwrap();
        draft.add_item(&syrup(), 1).unwrap();
        draft.add_item(&tablets(), 6).unwrap();

        assert_eq!(draft.lines().len(), 2);
        assert_eq!(draft.lines()[0].quantity, 10);
        assert_eq!(draft.lines()[0].price, 2.0);
        assert_eq!(draft.total(), 10.0 * 2.0 + 12.0);
    }

    #[test]
    fn test_add_checks_combined_quantity() {
        let mut draft = SaleDraft::new();
        draft.add_item(&syrup(), 2).unwrap();

        let err = draft.add_item(&syrup(), 1).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientStock(_)));
        assert_eq!(draft.lines()[0].quantity, 2);
    }

    #[test]
    fn test_add_rejects_non_positive() {
        let mut draft = SaleDraft::new();
        assert!(matches!(
            draft.add_item(&syrup(), 0),
            Err(LedgerError::InvalidQuantity { .. })
        ));
        assert!(draft.is_empty());
    }

    #[test]
    fn test_remove_item() {
        let mut draft = SaleDraft::new();
        draft.add_item(&syrup(), 1).unwrap();

        assert!(draft.remove_item("syr"));
        assert!(!draft.remove_item("syr"));
        assert!(draft.is_empty());
    }

    #[test]
    fn test_into_request() {
        let mut draft = SaleDraft::new();
        draft.set_customer("Asha");
        draft.add_item(&syrup(), 1).unwrap();

        let request = draft.into_request();
        assert_eq!(request.customer_name, "Asha");
        assert_eq!(request.items.len(), 1);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(" 12 ").unwrap(), 12);
        assert_eq!(parse_quantity("-1").unwrap(), -1);
        assert!(matches!(
            parse_quantity("two"),
            Err(LedgerError::InvalidQuantity { .. })
        ));
        assert!(parse_quantity("").is_err());
    }
}
