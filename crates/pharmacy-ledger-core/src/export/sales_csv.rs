//! Sale history export to CSV.

use chrono::NaiveDate;

use crate::models::SaleRecord;

/// CSV header row.
pub const SALES_CSV_HEADER: &str =
    "Sale ID,Date,Customer Name,Item Name,Quantity,Price Per Unit,Item Total";

/// Export sale history with one row per (sale, item) pair.
///
/// Rows follow history order (newest sale first), then line order.
pub fn export_sales_csv(sales: &[SaleRecord]) -> String {
    let mut rows = vec![SALES_CSV_HEADER.to_string()];

    for sale in sales {
        let date = sale.sale_date.format("%Y-%m-%d %H:%M").to_string();
        for item in &sale.items {
            rows.push(
                [
                    escape_csv(&sale.id),
                    escape_csv(&date),
                    escape_csv(&sale.customer_name),
                    escape_csv(&item.name),
                    item.quantity.to_string(),
                    format!("{:.2}", item.price),
                    format!("{:.2}", item.line_total()),
                ]
                .join(","),
            );
        }
    }

    rows.join("\n")
}

/// Download name for an export made on `date`.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("sales_history_{}.csv", date.format("%Y-%m-%d"))
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
