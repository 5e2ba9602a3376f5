use crate::ports::{SnapshotStorage, StorageError, StorageResult};
use std::sync::{Arc, Mutex};

/// Process-local slot; clones share the same snapshot.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    slot: Arc<Mutex<Option<String>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(snapshot.into()))),
        }
    }

    pub fn snapshot(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl SnapshotStorage for InMemoryStorage {
    fn read(&self) -> StorageResult<Option<String>> {
        let slot = self
            .slot
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(slot.clone())
    }

    fn write(&self, snapshot: &str) -> StorageResult<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        *slot = Some(snapshot.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_slot() {
        let storage = InMemoryStorage::new();
        let handle = storage.clone();
        assert_eq!(handle.read().unwrap(), None);

        storage.write("[]").unwrap();
        assert_eq!(handle.snapshot().as_deref(), Some("[]"));
    }
}
