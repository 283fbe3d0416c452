//! File-backed settings store.
//!
//! Keeps the whole settings object in memory and rewrites the file on
//! [`write_config`](SettingsStore::write_config). Keys this crate does not
//! own are preserved.

use super::{SettingsStore, StoreError};
use log::{debug, info};
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default settings file on the device.
pub const DEFAULT_SETTINGS_PATH: &str = "/etc/zerostick/config.json";

/// Settings stored as a single JSON object.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl JsonFileStore {
    /// Open the store at `path`.
    ///
    /// A missing file yields an empty store. A file that is not a JSON
    /// object is reported as [`StoreError::Corrupt`].
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(s) if s.trim().is_empty() => Map::new(),
            Ok(s) => match serde_json::from_str::<Value>(&s) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    return Err(StoreError::Corrupt(format!(
                        "{:?} is not a JSON object",
                        path
                    )))
                }
                Err(e) => return Err(StoreError::Corrupt(format!("{:?}: {}", path, e))),
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No settings file found at {:?}", path);
                Map::new()
            }
            Err(e) => return Err(StoreError::Io(e)),
        };

        Ok(Self { path, values })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileStore {
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
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(&self.values)
            .map_err(|e| StoreError::Serialize(e.to_string()))?;
        fs::write(&self.path, json)?;

        info!("Settings saved to {:?}", self.path);
        Ok(())
    }
}
