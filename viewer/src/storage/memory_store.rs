use std::sync::{Arc, Mutex};
use std::collections::HashMap;
use crate::storage::KeyValueStore;
use crate::storage::storage_error::StorageError;

/// Process-local store. Clones share the same entries.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::PoisonedLock)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
