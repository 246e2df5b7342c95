//! SQLite schema definition.

/// Database schema for slot storage.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Storage Slots (Whole-document replace, last write wins)
-- ============================================================================

CREATE TABLE IF NOT EXISTS storage_slots (
    key TEXT PRIMARY KEY CHECK (key IN ('catalog', 'sales')),
    document TEXT NOT NULL,                      -- JSON envelope {schemaVersion, checksum, payload}
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_slot_key_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO storage_slots (key, document) VALUES ('patients', '[]')",
            [],
        );
        assert!(result.is_err());

        let result = conn.execute(
            "INSERT INTO storage_slots (key, document) VALUES ('catalog', '[]')",
            [],
        );
        assert!(result.is_ok());
    }
}
