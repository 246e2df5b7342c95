//! Sale reconciliation: validate a sale against stock, then apply it.
//!
//! All checks run before anything is decremented, so a rejected sale
//! leaves the catalog exactly as it was.

use chrono::{DateTime, Utc};

use super::{LedgerError, LedgerResult, Shortfall};
use crate::models::{Medicine, SaleItem, SaleLine, SaleRecord, SaleRequest};

/// Units requested per medicine, in first-seen line order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Demand {
    entries: Vec<(String, u64)>,
}

impl Demand {
    fn add(&mut self, medicine_id: &str, units: u64) -> LedgerResult<()> {
        match self.entries.iter_mut().find(|(id, _)| id == medicine_id) {
            Some((_, total)) => {
                *total = total
                    .checked_add(units)
                    .ok_or_else(|| LedgerError::InvalidQuantity {
                        medicine_id: medicine_id.to_string(),
                        quantity: "combined quantity overflows".into(),
                    })?;
            }
            None => self.entries.push((medicine_id.to_string(), units)),
        }
        Ok(())
    }

    /// Aggregated units for `medicine_id`.
    pub fn units_for(&self, medicine_id: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(id, _)| id == medicine_id)
            .map(|(_, units)| *units)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(id, units)| (id.as_str(), *units))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Validate `request` against `catalog` and return the committed items with
/// the aggregated per-medicine demand.
pub fn validate_sale(
    catalog: &[Medicine],
    request: &SaleRequest,
) -> LedgerResult<(Vec<SaleItem>, Demand)> {
    if request.items.is_empty() {
        return Err(LedgerError::EmptyBill);
    }
    if request.customer_name.trim().is_empty() {
        return Err(LedgerError::MissingCustomer);
    }

    let mut items = Vec::with_capacity(request.items.len());
    let mut demand = Demand::default();

    for line in &request.items {
        let quantity = line_quantity(line)?;
        if !line.price.is_finite() || line.price < 0.0 {
            return Err(LedgerError::InvalidPrice {
                name: line.name.clone(),
                price: line.price,
            });
        }
        if !catalog.iter().any(|m| m.id == line.medicine_id) {
            return Err(LedgerError::UnknownMedicine(line.medicine_id.clone()));
        }

        demand.add(&line.medicine_id, quantity)?;
        items.push(SaleItem {
            medicine_id: line.medicine_id.clone(),
            name: line.name.clone(),
            quantity,
            price: line.price,
        });
    }

    let shortfalls: Vec<Shortfall> = demand
        .iter()
        .filter_map(|(id, requested)| {
            let medicine = catalog.iter().find(|m| m.id == id)?;
            let available = medicine.available_units();
            (requested > available).then(|| Shortfall {
                medicine_id: medicine.id.clone(),
                name: medicine.name.clone(),
                requested,
                available,
            })
        })
        .collect();

    if !shortfalls.is_empty() {
        return Err(LedgerError::InsufficientStock(shortfalls));
    }

    Ok((items, demand))
}

/// Validate and apply a sale.
///
/// Returns the new record and the updated catalog; `catalog` itself is
/// never modified. Each affected medicine is decremented once, by its
/// aggregated demand.
pub fn create_sale(
    catalog: &[Medicine],
    request: &SaleRequest,
    sale_id: String,
    sale_date: DateTime<Utc>,
) -> LedgerResult<(SaleRecord, Vec<Medicine>)> {
    let (items, demand) = validate_sale(catalog, request)?;

    let updated = catalog
        .iter()
        .map(|medicine| -> LedgerResult<Medicine> {
            match demand.units_for(&medicine.id) {
                Some(units) => Ok(Medicine {
                    stock: medicine.stock.apply_decrement(units)?,
                    ..medicine.clone()
                }),
                None => Ok(medicine.clone()),
            }
        })
        .collect::<LedgerResult<Vec<_>>>()?;

    let record = SaleRecord::new(
        sale_id,
        request.customer_name.trim().to_string(),
        items,
        sale_date,
    );

    Ok((record, updated))
}

fn line_quantity(line: &SaleLine) -> LedgerResult<u64> {
    if line.quantity <= 0 {
        return Err(LedgerError::InvalidQuantity {
            medicine_id: line.medicine_id.clone(),
            quantity: line.quantity.to_string(),
        });
    }
    Ok(line.quantity as u64)
}
