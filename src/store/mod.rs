//! Key-value settings store.
//!
//! The network list is persisted through a [`SettingsStore`]: a flat map of
//! keys to JSON values with an explicit flush. Two implementations exist:
//!
//! - [`JsonFileStore`] - a JSON object on disk (the device settings file)
//! - [`MemoryStore`] - in memory, counts flushes (tests, dry runs)

mod json_file;
mod memory;

pub use json_file::{JsonFileStore, DEFAULT_SETTINGS_PATH};
pub use memory::MemoryStore;

use crate::config::ConfigError;
use serde_json::Value;

/// Settings store collaborator.
pub trait SettingsStore {
    /// Check whether a key holds a value.
    fn is_set(&self, key: &str) -> bool;

    /// Get the raw value stored under a key.
    fn get(&self, key: &str) -> Option<Value>;

    /// Store a value in memory. Call [`write_config`](Self::write_config) to persist.
    fn set(&mut self, key: &str, value: Value);

    /// Persist all values.
    fn write_config(&mut self) -> Result<(), StoreError>;
}

/// Settings store errors.
#[derive(Debug)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    Io(std::io::Error),
    /// Stored data exists but cannot be decoded.
    Corrupt(String),
    /// A value could not be encoded.
    Serialize(String),
    /// A record was refused before anything was stored.
    Invalid(ConfigError),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::Corrupt(msg) => write!(f, "corrupt settings: {}", msg),
            Self::Serialize(msg) => write!(f, "cannot encode settings: {}", msg),
            Self::Invalid(e) => write!(f, "invalid network: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Invalid(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<ConfigError> for StoreError {
    fn from(e: ConfigError) -> Self {
        Self::Invalid(e)
    }
}
