//! Pharmacy Ledger Core Library
//!
//! Stock tracking and sale reconciliation for a single-shop pharmacy point of sale.
//!
//! # Architecture
//!
//! ```text
//! Counter UI → SaleDraft → SaleRequest
//!                               │
//!                     ┌─────────▼─────────┐
//!                     │  Sale Reconcile   │  empty? customer? quantity?
//!                     │  (all-or-nothing) │  known ids? aggregated stock?
//!                     └─────────┬─────────┘
//!                               │
//!                     ┌─────────▼─────────┐
//!                     │   Stock Model     │  FlatUnit | DecomposedTablet
//!                     │  apply_decrement  │  canonical strips/loose form
//!                     └─────────┬─────────┘
//!                               │
//!             ┌─────────────────┼─────────────────┐
//!             ▼                 ▼                 ▼
//!       catalog slot       sales slot         CSV export
//!      (versioned JSON)  (newest first)
//! ```
//!
//! # Modules
//!
//! - [`models`]: Domain types (Medicine, Stock, SaleRecord, ...)
//! - [`ledger`]: The ledger object, sale reconciliation, drafts, search
//! - [`db`]: Slot storage (SQLite, in-memory) and versioned documents
//! - [`export`]: Sale history CSV export
//! - [`config`]: Ledger configuration
//! - [`logging`]: Tracing setup for host processes

pub mod config;
pub mod db;
pub mod export;
pub mod ledger;
pub mod logging;
pub mod models;

// Re-export commonly used types
pub use config::LedgerConfig;
pub use db::{MemoryStore, Slot, SlotStore, SqliteStore};
pub use ledger::{Ledger, LedgerError, LedgerResult, LoadReport, SaleDraft, ScanMatch, Shortfall};
pub use models::{
    Category, Medicine, MedicineInput, SaleItem, SaleLine, SaleRecord, SaleRequest, Stock,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum PharmacyError {
    #[error("Bill is empty")]
    EmptyBill,

    #[error("Customer name is required")]
    MissingCustomer,

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Not enough stock: {0}")]
    InsufficientStock(String),

    #[error("Unknown medicine: {0}")]
    UnknownMedicine(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Malformed stored state: {0}")]
    MalformedPersistedState(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl From<LedgerError> for PharmacyError {
    fn from(e: LedgerError) -> Self {
        let message = e.to_string();
        match e {
            LedgerError::EmptyBill => PharmacyError::EmptyBill,
            LedgerError::MissingCustomer => PharmacyError::MissingCustomer,
            LedgerError::InvalidQuantity { quantity, .. } => {
                PharmacyError::InvalidQuantity(quantity)
            }
            LedgerError::InsufficientStock(_) => PharmacyError::InsufficientStock(message),
            LedgerError::UnknownMedicine(id) => PharmacyError::UnknownMedicine(id),
            LedgerError::InvalidMedicine(_)
            | LedgerError::InvalidPrice { .. }
            | LedgerError::Stock(_) => PharmacyError::InvalidInput(message),
            LedgerError::MalformedPersistedState { .. } => {
                PharmacyError::MalformedPersistedState(message)
            }
            LedgerError::Storage(_) => PharmacyError::StorageError(message),
        }
    }
}

impl From<db::StoreError> for PharmacyError {
    fn from(e: db::StoreError) -> Self {
        PharmacyError::StorageError(e.to_string())
    }
}

impl From<config::ConfigError> for PharmacyError {
    fn from(e: config::ConfigError) -> Self {
        PharmacyError::InvalidConfig(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for PharmacyError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        PharmacyError::StorageError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a ledger database at the given path.
///
/// `config_json` is a [`LedgerConfig`] as JSON; `None` uses the defaults.
#[uniffi::export]
pub fn open_ledger(
    path: String,
    config_json: Option<String>,
) -> Result<Arc<PharmacyLedger>, PharmacyError> {
    logging::init();
    let config = parse_config(config_json)?;
    let store = SqliteStore::open(&path)?;
    Ok(Arc::new(PharmacyLedger::new(store, config)))
}

/// Create an in-memory ledger (for testing).
#[uniffi::export]
pub fn open_ledger_in_memory(
    config_json: Option<String>,
) -> Result<Arc<PharmacyLedger>, PharmacyError> {
    let config = parse_config(config_json)?;
    let store = SqliteStore::open_in_memory()?;
    Ok(Arc::new(PharmacyLedger::new(store, config)))
}

fn parse_config(config_json: Option<String>) -> Result<LedgerConfig, PharmacyError> {
    match config_json {
        Some(json) => Ok(LedgerConfig::from_json(&json)?),
        None => Ok(LedgerConfig::default()),
    }
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe ledger wrapper for FFI.
#[derive(uniffi::Object)]
pub struct PharmacyLedger {
    ledger: Arc<Mutex<Ledger<SqliteStore>>>,
    load_warnings: Vec<String>,
}

impl PharmacyLedger {
    fn new(store: SqliteStore, config: LedgerConfig) -> Self {
        let (ledger, report) = Ledger::open(store, config);
        Self {
            ledger: Arc::new(Mutex::new(ledger)),
            load_warnings: report.warnings.iter().map(|w| w.to_string()).collect(),
        }
    }
}

#[uniffi::export]
impl PharmacyLedger {
    /// Problems found while loading stored state (the affected data was reset).
    pub fn load_warnings(&self) -> Vec<String> {
        self.load_warnings.clone()
    }

    // =========================================================================
    // Catalog Operations
    // =========================================================================

    /// All medicines in catalog order.
    pub fn list_medicines(&self) -> Result<Vec<FfiMedicine>, PharmacyError> {
        let ledger = self.ledger.lock()?;
        Ok(ledger.catalog().iter().map(FfiMedicine::from).collect())
    }

    /// Get a medicine by ID.
    pub fn get_medicine(&self, id: String) -> Result<Option<FfiMedicine>, PharmacyError> {
        let ledger = self.ledger.lock()?;
        Ok(ledger.medicine(&id).map(FfiMedicine::from))
    }

    /// Add a medicine.
    pub fn add_medicine(&self, input: FfiMedicineInput) -> Result<FfiMedicine, PharmacyError> {
        let mut ledger = self.ledger.lock()?;
        let medicine = ledger.add_medicine(input.try_into()?)?;
        Ok(FfiMedicine::from(&medicine))
    }

    /// Update a medicine in place.
    pub fn update_medicine(
        &self,
        id: String,
        input: FfiMedicineInput,
    ) -> Result<FfiMedicine, PharmacyError> {
        let mut ledger = self.ledger.lock()?;
        let medicine = ledger.update_medicine(&id, input.try_into()?)?;
        Ok(FfiMedicine::from(&medicine))
    }

    /// Delete a medicine. Returns false if it did not exist.
    pub fn delete_medicine(&self, id: String) -> Result<bool, PharmacyError> {
        let mut ledger = self.ledger.lock()?;
        Ok(ledger.delete_medicine(&id)?)
    }

    /// Add units (tablets or units) to a medicine's stock.
    pub fn restock(&self, id: String, units: u64) -> Result<FfiMedicine, PharmacyError> {
        let mut ledger = self.ledger.lock()?;
        let medicine = ledger.restock(&id, units)?;
        Ok(FfiMedicine::from(&medicine))
    }

    /// Search in-stock medicines by name.
    pub fn search_medicines(&self, query: String) -> Result<Vec<FfiMedicine>, PharmacyError> {
        let ledger = self.ledger.lock()?;
        Ok(ledger.search(&query).into_iter().map(FfiMedicine::from).collect())
    }

    /// Medicines at or below the low-stock threshold.
    pub fn low_stock(&self) -> Result<Vec<FfiMedicine>, PharmacyError> {
        let ledger = self.ledger.lock()?;
        Ok(ledger.low_stock().into_iter().map(FfiMedicine::from).collect())
    }

    /// Catalog suggestions for names read off a prescription.
    pub fn match_scanned_names(
        &self,
        names: Vec<String>,
    ) -> Result<Vec<FfiScanMatch>, PharmacyError> {
        let ledger = self.ledger.lock()?;
        Ok(ledger
            .match_scanned_names(&names)
            .into_iter()
            .map(FfiScanMatch::from)
            .collect())
    }

    // =========================================================================
    // Sale Operations
    // =========================================================================

    /// Commit a sale.
    pub fn create_sale(
        &self,
        customer_name: String,
        lines: Vec<FfiSaleLine>,
    ) -> Result<FfiSaleRecord, PharmacyError> {
        let mut ledger = self.ledger.lock()?;
        let request = SaleRequest {
            customer_name,
            items: lines.into_iter().map(SaleLine::from).collect(),
        };
        let record = ledger.create_sale(&request)?;
        Ok(FfiSaleRecord::from(&record))
    }

    /// Sale history, newest first.
    pub fn list_sales(&self) -> Result<Vec<FfiSaleRecord>, PharmacyError> {
        let ledger = self.ledger.lock()?;
        Ok(ledger.sales().iter().map(FfiSaleRecord::from).collect())
    }

    /// Delete all sale history.
    pub fn clear_history(&self) -> Result<(), PharmacyError> {
        let mut ledger = self.ledger.lock()?;
        Ok(ledger.clear_history()?)
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Export sale history as CSV.
    pub fn export_sales_csv(&self) -> Result<String, PharmacyError> {
        let ledger = self.ledger.lock()?;
        Ok(ledger.export_csv())
    }

    /// Format an amount with the configured currency symbol.
    pub fn format_amount(&self, amount: f64) -> Result<String, PharmacyError> {
        let ledger = self.ledger.lock()?;
        Ok(ledger.config().format_amount(amount))
    }

    /// Suggested file name for today's export.
    pub fn export_file_name(&self) -> String {
        export::export_file_name(chrono::Utc::now().date_naive())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe medicine.
///
/// Tablets fill `strips`, `loose_tablets` and `tablets_per_strip`; other
/// categories fill `quantity`. The unused fields are zero.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicine {
    pub id: String,
    pub name: String,
    pub location: String,
    pub category: String,
    pub price: f64,
    pub quantity: u64,
    pub strips: u64,
    pub loose_tablets: u64,
    pub tablets_per_strip: u32,
    pub available_units: u64,
}

impl From<&Medicine> for FfiMedicine {
    fn from(medicine: &Medicine) -> Self {
        let (quantity, strips, loose_tablets, tablets_per_strip) = match medicine.stock {
            Stock::FlatUnit { quantity } => (quantity, 0, 0, 0),
            Stock::DecomposedTablet {
                strips,
                loose_tablets,
                tablets_per_strip,
            } => (0, strips, loose_tablets, tablets_per_strip),
        };
        Self {
            id: medicine.id.clone(),
            name: medicine.name.clone(),
            location: medicine.location.clone(),
            category: medicine.category.to_string(),
            price: medicine.price,
            quantity,
            strips,
            loose_tablets,
            tablets_per_strip,
            available_units: medicine.available_units(),
        }
    }
}

/// FFI-safe medicine input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicineInput {
    pub name: String,
    pub location: String,
    pub category: String,
    pub price: f64,
    pub quantity: u64,
    pub strips: u64,
    pub loose_tablets: u64,
    pub tablets_per_strip: u32,
}

impl TryFrom<FfiMedicineInput> for MedicineInput {
    type Error = PharmacyError;

    fn try_from(input: FfiMedicineInput) -> Result<Self, Self::Error> {
        let category = Category::parse(&input.category).ok_or_else(|| {
            PharmacyError::InvalidInput(format!("unknown category: {}", input.category))
        })?;
        // The ledger normalizes tablet stock with its configured pack size
        let stock = if category.is_decomposed() {
            Stock::DecomposedTablet {
                strips: input.strips,
                loose_tablets: input.loose_tablets,
                tablets_per_strip: input.tablets_per_strip,
            }
        } else {
            Stock::flat(input.quantity)
        };
        Ok(MedicineInput {
            name: input.name,
            location: input.location,
            category,
            price: input.price,
            stock,
        })
    }
}

/// FFI-safe sale line.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSaleLine {
    pub medicine_id: String,
    pub name: String,
    pub quantity: i64,
    pub price: f64,
}

impl From<FfiSaleLine> for SaleLine {
    fn from(line: FfiSaleLine) -> Self {
        SaleLine {
            medicine_id: line.medicine_id,
            name: line.name,
            quantity: line.quantity,
            price: line.price,
        }
    }
}

/// FFI-safe sale item.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSaleItem {
    pub medicine_id: String,
    pub name: String,
    pub quantity: u64,
    pub price: f64,
    pub line_total: f64,
}

/// FFI-safe sale record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSaleRecord {
    pub id: String,
    pub customer_name: String,
    pub items: Vec<FfiSaleItem>,
    pub total_amount: f64,
    pub sale_date: String,
}

impl From<&SaleRecord> for FfiSaleRecord {
    fn from(record: &SaleRecord) -> Self {
        Self {
            id: record.id.clone(),
            customer_name: record.customer_name.clone(),
            items: record
                .items
                .iter()
                .map(|item| FfiSaleItem {
                    medicine_id: item.medicine_id.clone(),
                    name: item.name.clone(),
                    quantity: item.quantity,
                    price: item.price,
                    line_total: item.line_total(),
                })
                .collect(),
            total_amount: record.total_amount,
            sale_date: record.sale_date.to_rfc3339(),
        }
    }
}

/// FFI-safe scored medicine.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiScoredMedicine {
    pub medicine_id: String,
    pub name: String,
    pub score: f64,
    pub available_units: u64,
}

/// FFI-safe scan match.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiScanMatch {
    pub scanned_name: String,
    pub candidates: Vec<FfiScoredMedicine>,
}

impl From<ScanMatch> for FfiScanMatch {
    fn from(m: ScanMatch) -> Self {
        Self {
            scanned_name: m.scanned_name,
            candidates: m
                .candidates
                .into_iter()
                .map(|c| FfiScoredMedicine {
                    medicine_id: c.medicine_id,
                    name: c.name,
                    score: c.score,
                    available_units: c.available_units,
                })
                .collect(),
        }
    }
}
