//! In-memory slot store for tests and throwaway sessions.

use std::collections::HashMap;

use super::{Slot, SlotStore, StoreError, StoreResult};

/// Slot store backed by a `HashMap`.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    slots: HashMap<Slot, String>,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a raw document, e.g. one written by an older
    /// revision of the application.
    pub fn with_document(slot: Slot, document: impl Into<String>) -> Self {
        let mut store = Self::default();
        store.slots.insert(slot, document.into());
        store
    }

    /// Make every subsequent call fail, simulating an unreachable backend.
    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    /// Raw document currently in `slot`.
    pub fn document(&self, slot: Slot) -> Option<&str> {
        self.slots.get(&slot).map(String::as_str)
    }

    fn check(&self) -> StoreResult<()> {
        if self.unavailable {
            return Err(StoreError::Unavailable("memory store disabled".into()));
        }
        Ok(())
    }
}

impl SlotStore for MemoryStore {
    fn read(&self, slot: Slot) -> StoreResult<Option<String>> {
        self.check()?;
        Ok(self.slots.get(&slot).cloned())
    }

    fn write(&mut self, slot: Slot, document: &str) -> StoreResult<()> {
        self.check()?;
        self.slots.insert(slot, document.to_string());
        Ok(())
    }

    fn remove(&mut self, slot: Slot) -> StoreResult<()> {
        self.check()?;
        self.slots.remove(&slot);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.read(Slot::Catalog).unwrap(), None);

        store.write(Slot::Catalog, "doc").unwrap();
        assert_eq!(store.read(Slot::Catalog).unwrap().as_deref(), Some("doc"));
        assert_eq!(store.document(Slot::Catalog), Some("doc"));
    }

    #[test]
    fn test_unavailable() {
        let mut store = MemoryStore::with_document(Slot::Sales, "[]");
        store.set_unavailable(true);

        assert!(matches!(store.read(Slot::Sales), Err(StoreError::Unavailable(_))));
        assert!(store.write(Slot::Sales, "[]").is_err());
    }
}
