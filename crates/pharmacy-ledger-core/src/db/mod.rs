//! Storage layer for the pharmacy ledger.
//!
//! Storage is two independently keyed slots, each holding one whole JSON
//! document. Writes replace a slot wholesale; there is no partial update.

mod documents;
mod memory;
mod schema;
mod sqlite;

pub use documents::*;
pub use memory::*;
pub use schema::*;
pub use sqlite::*;

use thiserror::Error;

/// Storage errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A storage slot key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Medicine catalog, insertion order
    Catalog,
    /// Sale history, newest first
    Sales,
}

impl Slot {
    pub fn key(self) -> &'static str {
        match self {
            Slot::Catalog => "catalog",
            Slot::Sales => "sales",
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Key-value store holding one document per slot.
pub trait SlotStore {
    /// Last document written to `slot`, or `None` if never written.
    fn read(&self, slot: Slot) -> StoreResult<Option<String>>;

    /// Replace the document in `slot`.
    fn write(&mut self, slot: Slot, document: &str) -> StoreResult<()>;

    /// Remove the document in `slot`.
    fn remove(&mut self, slot: Slot) -> StoreResult<()>;
}
