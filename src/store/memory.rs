//! In-memory [`SettingsStore`] for tests and dry runs.

use super::{SettingsStore, StoreError};
use serde_json::Value;
use std::collections::HashMap;

/// In-memory settings store.
///
/// Counts [`write_config`](SettingsStore::write_config) calls so callers can
/// observe when a flush happened.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, Value>,
    writes: usize,
    fail_writes: bool,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with one key preset.
    pub fn with_value(key: &str, value: Value) -> Self {
        let mut store = Self::new();
        store.values.insert(key.to_string(), value);
        store
    }

    /// Make every subsequent flush fail.
    pub fn fail_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Number of flushes performed.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl SettingsStore for MemoryStore {
    fn is_set(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    fn write_config(&mut self) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "write disabled",
            )));
        }
        self.writes += 1;
        Ok(())
    }
}
