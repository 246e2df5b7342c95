//! The inventory ledger: catalog + sale history, and the only way to change
//! either.
//!
//! Pipeline for a sale:
//!
//! ```text
//! SaleDraft → SaleRequest → validate (empty? customer? quantities? ids? stock?)
//!                                   │
//!                          reject ──┤── accept
//!                                   │
//!                 decrement stock once per medicine (aggregated)
//!                                   │
//!                 write catalog slot, write sales slot
//!                                   │
//!                      swap in-memory state, return record
//! ```

mod draft;
mod reconcile;
mod search;

pub use draft::*;
pub use reconcile::*;
pub use search::*;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::LedgerConfig;
use crate::db::{
    decode_catalog, decode_sales, encode_catalog, encode_sales, DocumentError, Slot, SlotStore,
    StoreError,
};
use crate::export::export_sales_csv;
use crate::models::{
    new_sale_id, InputProblem, Medicine, MedicineInput, SaleItem, SaleRecord, SaleRequest,
    StockError,
};

/// One medicine the sale asked too much of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortfall {
    pub medicine_id: String,
    pub name: String,
    /// Units requested, summed over every line for this medicine
    pub requested: u64,
    pub available: u64,
}

impl Shortfall {
    /// Units missing to fulfil the request.
    pub fn shortfall(&self) -> u64 {
        self.requested.saturating_sub(self.available)
    }
}

impl std::fmt::Display for Shortfall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (requested {}, available {}, short by {})",
            self.name,
            self.requested,
            self.available,
            self.shortfall()
        )
    }
}

/// Ledger errors. None of these are fatal; every rejection leaves the
/// catalog and history untouched.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Bill is empty")]
    EmptyBill,

    #[error("Customer name is required")]
    MissingCustomer,

    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity { medicine_id: String, quantity: String },

    #[error("Not enough stock: {}", join_shortfalls(.0))]
    InsufficientStock(Vec<Shortfall>),

    #[error("Unknown medicine: {0}")]
    UnknownMedicine(String),

    #[error("Malformed persisted {slot} state: {reason}")]
    MalformedPersistedState { slot: Slot, reason: String },

    #[error("Invalid medicine: {0}")]
    InvalidMedicine(String),

    #[error("Invalid price {price} for {name}")]
    InvalidPrice { name: String, price: f64 },

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Stock error: {0}")]
    Stock(#[from] StockError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

fn join_shortfalls(shortfalls: &[Shortfall]) -> String {
    shortfalls
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// What happened while loading persisted state.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Non-blocking problems; each affected slot was replaced by an empty
    /// collection.
    pub warnings: Vec<LedgerError>,
    /// Slots that were stored in an older schema and have been upgraded.
    pub migrated: Vec<Slot>,
}

/// Owner of the medicine catalog and the sale history.
pub struct Ledger<S: SlotStore> {
    store: S,
    config: LedgerConfig,
    catalog: Vec<Medicine>,
    sales: Vec<SaleRecord>,
}

impl<S: SlotStore> Ledger<S> {
    /// Load both collections from `store`.
    ///
    /// Never fails: an absent slot is an empty collection, and an
    /// unreadable or malformed one is also treated as empty with a warning
    /// in the returned [`LoadReport`].
    pub fn open(store: S, config: LedgerConfig) -> (Self, LoadReport) {
        let mut report = LoadReport::default();

        let catalog = load_slot(&store, Slot::Catalog, &mut report, |doc| {
            decode_catalog(doc, config.default_tablets_per_strip)
                .map(|d| (d.was_migrated(), d.value))
        });
        let sales = load_slot(&store, Slot::Sales, &mut report, |doc| {
            decode_sales(doc).map(|d| (d.was_migrated(), d.value))
        });

        let mut ledger = Self {
            store,
            config,
            catalog,
            sales,
        };

        for slot in report.migrated.clone() {
            let result = match slot {
                Slot::Catalog => {
                    let catalog = ledger.catalog.clone();
                    ledger.write_catalog(&catalog)
                }
                Slot::Sales => {
                    let sales = ledger.sales.clone();
                    ledger.write_sales(&sales)
                }
            };
            match result {
                Ok(()) => info!(%slot, "upgraded stored document to current schema"),
                Err(e) => {
                    warn!(%slot, error = %e, "could not rewrite migrated document");
                    report.warnings.push(e);
                }
            }
        }

        (ledger, report)
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Catalog in insertion order.
    pub fn catalog(&self) -> &[Medicine] {
        &self.catalog
    }

    pub fn medicine(&self, id: &str) -> Option<&Medicine> {
        self.catalog.iter().find(|m| m.id == id)
    }

    /// Add a new medicine to the end of the catalog.
    pub fn add_medicine(&mut self, input: MedicineInput) -> LedgerResult<Medicine> {
        check_input(&input)?;
        let medicine = Medicine::new(normalize_input(input, &self.config));

        let mut catalog = self.catalog.clone();
        catalog.push(medicine.clone());
        self.write_catalog(&catalog)?;
        self.catalog = catalog;

        info!(id = %medicine.id, name = %medicine.name, "medicine added");
        Ok(medicine)
    }

    /// Replace an existing medicine's fields, keeping its id and position.
    pub fn update_medicine(&mut self, id: &str, input: MedicineInput) -> LedgerResult<Medicine> {
        check_input(&input)?;
        let index = self.position(id)?;
        let medicine = Medicine::with_id(id.to_string(), normalize_input(input, &self.config));

        let mut catalog = self.catalog.clone();
        catalog[index] = medicine.clone();
        self.write_catalog(&catalog)?;
        self.catalog = catalog;

        info!(%id, "medicine updated");
        Ok(medicine)
    }

    /// Remove a medicine. Sale history keeps referring to it by id.
    pub fn delete_medicine(&mut self, id: &str) -> LedgerResult<bool> {
        let Some(index) = self.catalog.iter().position(|m| m.id == id) else {
            return Ok(false);
        };

        let mut catalog = self.catalog.clone();
        catalog.remove(index);
        self.write_catalog(&catalog)?;
        self.catalog = catalog;

        info!(%id, "medicine deleted");
        Ok(true)
    }

    /// Add `units` (native unit) to a medicine's stock.
    pub fn restock(&mut self, id: &str, units: u64) -> LedgerResult<Medicine> {
        let index = self.position(id)?;

        let mut catalog = self.catalog.clone();
        catalog[index].stock = catalog[index].stock.apply_increment(units)?;
        let medicine = catalog[index].clone();
        self.write_catalog(&catalog)?;
        self.catalog = catalog;

        info!(%id, units, available = medicine.available_units(), "medicine restocked");
        Ok(medicine)
    }

    /// Medicines at or below the configured low-stock threshold.
    pub fn low_stock(&self) -> Vec<&Medicine> {
        self.catalog
            .iter()
            .filter(|m| m.is_low_stock(self.config.low_stock_threshold))
            .collect()
    }

    /// In-stock medicines whose name contains `query`.
    pub fn search(&self, query: &str) -> Vec<&Medicine> {
        search(&self.catalog, query)
    }

    /// Catalog suggestions for names read off a prescription.
    pub fn match_scanned_names(&self, names: &[String]) -> Vec<ScanMatch> {
        match_scanned_names(
            &self.catalog,
            names,
            self.config.fuzzy_match_threshold,
            self.config.max_scan_matches,
        )
    }

    // =========================================================================
    // Sales
    // =========================================================================

    /// Sale history, newest first.
    pub fn sales(&self) -> &[SaleRecord] {
        &self.sales
    }

    pub fn sale(&self, id: &str) -> Option<&SaleRecord> {
        self.sales.iter().find(|s| s.id == id)
    }

    /// Catalog entry a historical line refers to, if it still exists.
    pub fn resolve_item(&self, item: &SaleItem) -> Option<&Medicine> {
        self.medicine(&item.medicine_id)
    }

    /// Commit a sale: validate, decrement stock, append to history.
    ///
    /// All-or-nothing. On any error the catalog and history are unchanged,
    /// in memory and in the store. If the history write fails after the
    /// catalog was written, the previous catalog is written back.
    pub fn create_sale(&mut self, request: &SaleRequest) -> LedgerResult<SaleRecord> {
        let (record, catalog) =
            match create_sale(&self.catalog, request, new_sale_id(), Utc::now()) {
                Ok(result) => result,
                Err(e) => {
                    debug!(error = %e, "sale rejected");
                    return Err(e);
                }
            };

        let mut sales = Vec::with_capacity(self.sales.len() + 1);
        sales.push(record.clone());
        sales.extend(self.sales.iter().cloned());

        self.write_catalog(&catalog)?;
        if let Err(e) = self.write_sales(&sales) {
            // Put the stored catalog back so the slots never disagree
            let previous = self.catalog.clone();
            if let Err(rollback) = self.write_catalog(&previous) {
                warn!(error = %rollback, "could not restore catalog after failed sale write");
            }
            return Err(e);
        }
        self.catalog = catalog;
        self.sales = sales;

        info!(
            id = %record.id,
            lines = record.items.len(),
            total = record.total_amount,
            "sale committed"
        );
        Ok(record)
    }

    /// Delete every sale record. The catalog is not touched.
    pub fn clear_history(&mut self) -> LedgerResult<()> {
        self.store.remove(Slot::Sales)?;
        let cleared = std::mem::take(&mut self.sales).len();
        info!(cleared, "sale history cleared");
        Ok(())
    }

    /// Sale history as CSV text.
    pub fn export_csv(&self) -> String {
        export_sales_csv(&self.sales)
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    fn position(&self, id: &str) -> LedgerResult<usize> {
        self.catalog
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| LedgerError::UnknownMedicine(id.to_string()))
    }

    fn write_catalog(&mut self, catalog: &[Medicine]) -> LedgerResult<()> {
        let document = encode_catalog(catalog).map_err(StoreError::from)?;
        self.store.write(Slot::Catalog, &document)?;
        Ok(())
    }

    fn write_sales(&mut self, sales: &[SaleRecord]) -> LedgerResult<()> {
        let document = encode_sales(sales).map_err(StoreError::from)?;
        self.store.write(Slot::Sales, &document)?;
        Ok(())
    }
}

fn load_slot<S, T>(
    store: &S,
    slot: Slot,
    report: &mut LoadReport,
    decode: impl FnOnce(&str) -> Result<(bool, Vec<T>), DocumentError>,
) -> Vec<T>
where
    S: SlotStore,
{
    let document = match store.read(slot) {
        Ok(Some(document)) => document,
        Ok(None) => return Vec::new(),
        Err(e) => {
            warn!(%slot, error = %e, "storage unavailable, starting empty");
            report.warnings.push(LedgerError::Storage(e));
            return Vec::new();
        }
    };

    match decode(&document) {
        Ok((migrated, value)) => {
            if migrated {
                warn!(%slot, "stored document uses an older schema, migrating");
                report.migrated.push(slot);
            }
            value
        }
        Err(e) => {
            warn!(%slot, error = %e, "malformed stored document, starting empty");
            report.warnings.push(LedgerError::MalformedPersistedState {
                slot,
                reason: e.to_string(),
            });
            Vec::new()
        }
    }
}

fn check_input(input: &MedicineInput) -> LedgerResult<()> {
    match input.problem() {
        None => Ok(()),
        Some(InputProblem::Field(reason)) => Err(LedgerError::InvalidMedicine(reason)),
        Some(InputProblem::Price(price)) => Err(LedgerError::InvalidPrice {
            name: input.name.clone(),
            price,
        }),
    }
}

fn normalize_input(mut input: MedicineInput, config: &LedgerConfig) -> MedicineInput {
    input.name = input.name.trim().to_string();
    input.location = input.location.trim().to_string();
    input.stock = input.stock.normalized(config.default_tablets_per_strip);
    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, StoreResult};
    use crate::models::{Category, SaleLine, Stock};

    /// Store whose sales slot rejects every write.
    #[derive(Default)]
    struct SalesFullStore {
        inner: MemoryStore,
    }

    impl SlotStore for SalesFullStore {
        fn read(&self, slot: Slot) -> StoreResult<Option<String>> {
            self.inner.read(slot)
        }

        fn write(&mut self, slot: Slot, document: &str) -> StoreResult<()> {
            if slot == Slot::Sales {
                return Err(StoreError::Unavailable("sales slot full".into()));
            }
            self.inner.write(slot, document)
        }

        fn remove(&mut self, slot: Slot) -> StoreResult<()> {
            self.inner.remove(slot)
        }
    }

    fn ledger() -> Ledger<MemoryStore> {
        Ledger::open(MemoryStore::new(), LedgerConfig::default()).0
    }

    fn line(medicine: &Medicine, quantity: i64) -> SaleLine {
        SaleLine {
            medicine_id: medicine.id.clone(),
            name: medicine.name.clone(),
            quantity,
            price: medicine.unit_price(),
        }
    }

    #[test]
    fn test_open_empty_store() {
        let (ledger, report) = Ledger::open(MemoryStore::new(), LedgerConfig::default());
        assert!(ledger.catalog().is_empty());
        assert!(ledger.sales().is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_add_and_update_medicine() {
        let mut ledger = ledger();
        let med = ledger
            .add_medicine(MedicineInput::units(" Syrup ", "C-3", Category::Syrup, 12.0, 5))
            .unwrap();
        assert_eq!(med.name, "Syrup");

        let updated = ledger
            .update_medicine(
                &med.id,
                MedicineInput::units("Syrup 100ml", "C-4", Category::Syrup, 13.0, 7),
            )
            .unwrap();

        assert_eq!(updated.id, med.id);
        assert_eq!(ledger.catalog().len(), 1);
        assert_eq!(ledger.catalog()[0].location, "C-4");
        assert!(ledger.store().document(Slot::Catalog).is_some());
    }

    #[test]
    fn test_add_rejects_invalid_input() {
        let mut ledger = ledger();
        let result = ledger.add_medicine(MedicineInput::units("", "C", Category::Syrup, 1.0, 1));
        assert!(matches!(result, Err(LedgerError::InvalidMedicine(_))));

        let result = ledger.add_medicine(MedicineInput::units("X", "C", Category::Syrup, -1.0, 1));
        assert!(matches!(result, Err(LedgerError::InvalidPrice { .. })));
        assert!(ledger.catalog().is_empty());
    }

    #[test]
    fn test_update_unknown() {
        let mut ledger = ledger();
        let result = ledger.update_medicine(
            "missing",
            MedicineInput::units("X", "C", Category::Syrup, 1.0, 1),
        );
        assert!(matches!(result, Err(LedgerError::UnknownMedicine(_))));
    }

    #[test]
    fn test_delete_keeps_history() {
        let mut ledger = ledger();
        let med = ledger
            .add_medicine(MedicineInput::units("Syrup", "C", Category::Syrup, 12.0, 5))
            .unwrap();

        let record = ledger
            .create_sale(&SaleRequest {
                customer_name: "Asha".into(),
                items: vec![line(&med, 2)],
            })
            .unwrap();

        assert!(ledger.delete_medicine(&med.id).unwrap());
        assert!(!ledger.delete_medicine(&med.id).unwrap());

        let sale = ledger.sale(&record.id).unwrap();
        assert_eq!(sale.items[0].name, "Syrup");
        assert!(ledger.resolve_item(&sale.items[0]).is_none());
    }

    #[test]
    fn test_restock_rolls_loose_into_strips() {
        let mut ledger = ledger();
        let med = ledger
            .add_medicine(MedicineInput::tablet("Aspirin", "A-3", 4.0, 0, 7, 10))
            .unwrap();

        let restocked = ledger.restock(&med.id, 25).unwrap();
        assert_eq!(restocked.stock, Stock::tablets(3, 2, 10));
    }

    #[test]
    fn test_low_stock() {
        let mut ledger = ledger();
        ledger
            .add_medicine(MedicineInput::units("Low", "C", Category::Syrup, 1.0, 3))
            .unwrap();
        ledger
            .add_medicine(MedicineInput::units("High", "C", Category::Syrup, 1.0, 300))
            .unwrap();

        let low: Vec<_> = ledger.low_stock().iter().map(|m| m.name.clone()).collect();
        assert_eq!(low, vec!["Low"]);
    }

    #[test]
    fn test_history_newest_first() {
        let mut ledger = ledger();
        let med = ledger
            .add_medicine(MedicineInput::units("Syrup", "C", Category::Syrup, 12.0, 5))
            .unwrap();

        let first = ledger
            .create_sale(&SaleRequest {
                customer_name: "First".into(),
                items: vec![line(&med, 1)],
            })
            .unwrap();
        let second = ledger
            .create_sale(&SaleRequest {
                customer_name: "Second".into(),
                items: vec![line(&med, 1)],
            })
            .unwrap();

        assert_eq!(ledger.sales()[0].id, second.id);
        assert_eq!(ledger.sales()[1].id, first.id);
        assert_eq!(ledger.medicine(&med.id).unwrap().available_units(), 3);
    }

    #[test]
    fn test_storage_failure_leaves_state() {
        let mut ledger = ledger();
        let med = ledger
            .add_medicine(MedicineInput::units("Syrup", "C", Category::Syrup, 12.0, 5))
            .unwrap();

        let mut store = ledger.into_store();
        store.set_unavailable(true);
        let mut ledger = Ledger {
            store,
            config: LedgerConfig::default(),
            catalog: vec![med.clone()],
            sales: Vec::new(),
        };

        let result = ledger.create_sale(&SaleRequest {
            customer_name: "Asha".into(),
            items: vec![line(&med, 1)],
        });

        assert!(matches!(result, Err(LedgerError::Storage(_))));
        assert_eq!(ledger.catalog()[0].available_units(), 5);
        assert!(ledger.sales().is_empty());
    }

    #[test]
    fn test_failed_history_write_restores_stored_catalog() {
        let (mut ledger, _) = Ledger::open(SalesFullStore::default(), LedgerConfig::default());
        let med = ledger
            .add_medicine(MedicineInput::units("Syrup", "C", Category::Syrup, 12.0, 5))
            .unwrap();

        let result = ledger.create_sale(&SaleRequest {
            customer_name: "Asha".into(),
            items: vec![line(&med, 2)],
        });
        assert!(matches!(result, Err(LedgerError::Storage(_))));
        assert_eq!(ledger.catalog()[0].available_units(), 5);

        let (reopened, report) = Ledger::open(ledger.into_store().inner, LedgerConfig::default());
        assert!(report.warnings.is_empty());
        assert_eq!(reopened.catalog()[0].available_units(), 5);
        assert!(reopened.sales().is_empty());
    }

    #[test]
    fn test_configured_pack_size_fills_missing() {
        let config = LedgerConfig {
            default_tablets_per_strip: 12,
            ..LedgerConfig::default()
        };
        let (mut ledger, _) = Ledger::open(MemoryStore::new(), config);

        let med = ledger
            .add_medicine(MedicineInput::tablet("Aspirin", "A-3", 5.0, 2, 15, 0))
            .unwrap();
        assert_eq!(med.stock.tablets_per_strip(), Some(12));
        assert_eq!(med.stock, Stock::tablets(3, 3, 12));

        let updated = ledger
            .update_medicine(&med.id, MedicineInput::tablet("Aspirin", "A-3", 5.0, 1, 0, 0))
            .unwrap();
        assert_eq!(updated.available_units(), 12);
    }

    #[test]
    fn test_clear_history() {
        let mut ledger = ledger();
        let med = ledger
            .add_medicine(MedicineInput::units("Syrup", "C", Category::Syrup, 12.0, 5))
            .unwrap();
        ledger
            .create_sale(&SaleRequest {
                customer_name: "Asha".into(),
                items: vec![line(&med, 1)],
            })
            .unwrap();

        ledger.clear_history().unwrap();
        assert!(ledger.sales().is_empty());
        assert!(ledger.store().document(Slot::Sales).is_none());
        assert_eq!(ledger.catalog()[0].available_units(), 4);
    }

    #[test]
    fn test_error_messages() {
        let err = LedgerError::InsufficientStock(vec![Shortfall {
            medicine_id: "m".into(),
            name: "Syrup".into(),
            requested: 4,
            available: 3,
        }]);
        assert_eq!(
            err.to_string(),
            "Not enough stock: Syrup (requested 4, available 3, short by 1)"
        );
        assert_eq!(LedgerError::MissingCustomer.to_string(), "Customer name is required");
    }
}
