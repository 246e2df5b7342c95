//! SQLite-backed slot store.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::{Slot, SlotStore, StoreResult, SCHEMA};

/// Slot store over a SQLite connection.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    /// Initialize schema.
    fn initialize(&self) -> StoreResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }
}

impl SlotStore for SqliteStore {
    fn read(&self, slot: Slot) -> StoreResult<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT document FROM storage_slots WHERE key = ?",
                [slot.key()],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn write(&mut self, slot: Slot, document: &str) -> StoreResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO storage_slots (key, document, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET
                document = excluded.document,
                updated_at = datetime('now')
            "#,
            params![slot.key(), document],
        )?;
        Ok(())
    }

    fn remove(&mut self, slot: Slot) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM storage_slots WHERE key = ?", [slot.key()])?;
        Ok(())
    }
}
