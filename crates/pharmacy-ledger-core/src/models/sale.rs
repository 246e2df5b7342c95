//! Sale models: requests going in, records coming out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One requested line of a sale, as built by the point-of-sale screen.
///
/// `quantity` is signed so that zero or negative input reaches validation
/// instead of being lost in a conversion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    pub medicine_id: String,
    /// Name snapshot taken when the line was added
    pub name: String,
    /// Units in the medicine's native unit
    pub quantity: i64,
    /// Per-unit price snapshot
    pub price: f64,
}

/// A proposed sale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaleRequest {
    pub customer_name: String,
    pub items: Vec<SaleLine>,
}

/// One committed line of a sale. Never re-looked-up against the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    /// Catalog id at sale time; may no longer exist
    pub medicine_id: String,
    pub name: String,
    pub quantity: u64,
    pub price: f64,
}

impl SaleItem {
    pub fn line_total(&self) -> f64 {
        self.quantity as f64 * self.price
    }
}

/// An immutable, committed sale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    pub id: String,
    pub customer_name: String,
    /// Line order is insertion order
    pub items: Vec<SaleItem>,
    /// Frozen at creation
    pub total_amount: f64,
    pub sale_date: DateTime<Utc>,
}

impl SaleRecord {
    /// Build a record, computing the total from the items.
    pub fn new(
        id: String,
        customer_name: String,
        items: Vec<SaleItem>,
        sale_date: DateTime<Utc>,
    ) -> Self {
        let total_amount = sum_line_totals(&items);
        Self {
            id,
            customer_name,
            items,
            total_amount,
            sale_date,
        }
    }

    /// Total recomputed from the items.
    pub fn computed_total(&self) -> f64 {
        sum_line_totals(&self.items)
    }

    /// Units sold across all lines.
    pub fn units_sold(&self) -> u64 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

fn sum_line_totals(items: &[SaleItem]) -> f64 {
    items.iter().map(SaleItem::line_total).sum()
}

/// Fresh sale id.
pub fn new_sale_id() -> String {
    format!("sale-{}", uuid::Uuid::new_v4())
}
