//! Known-network list.
//!
//! [`NetworkList`] keeps the configured networks in insertion order and
//! persists the whole list under a single settings key after every change.
//! SSIDs are unique: adding a network that already exists replaces it and
//! moves it to the end.
//!
//! The list owns its store handle. Access is not synchronized; a single
//! owner (the daemon thread or a one-shot command) serializes changes.
//!
//! # Example
//!
//! ```
//! use zerostick_wifi::store::MemoryStore;
//! use zerostick_wifi::wifi::{LoadOutcome, NetworkList, NetworkRecord};
//!
//! let (mut list, outcome) = NetworkList::open(MemoryStore::new()).unwrap();
//! assert_eq!(outcome, LoadOutcome::NoData);
//!
//! list.add(NetworkRecord::new("Home", "supersecret", 10).unwrap()).unwrap();
//! assert!(list.get("Home").unwrap().passphrase.is_empty());
//! ```

use super::psk::is_valid_psk;
use super::record::NetworkRecord;
use super::render::{write_to_file, SupplicantConfig};
use crate::store::{SettingsStore, StoreError};
use log::{debug, info, warn};
use std::path::Path;

/// Settings key holding the network list.
pub const WIFIS_KEY: &str = "wifis";

/// Result of loading the list from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing stored yet; the list is empty.
    NoData,
    /// The stored list was loaded with this many entries.
    Loaded(usize),
}

/// Ordered list of configured networks bound to a settings store.
pub struct NetworkList<S: SettingsStore> {
    records: Vec<NetworkRecord>,
    store: S,
}

impl<S: SettingsStore> NetworkList<S> {
    /// Create an empty list bound to `store`. Nothing is read.
    pub fn new(store: S) -> Self {
        Self {
            records: Vec::new(),
            store,
        }
    }

    /// Create a list and load it from `store`.
    pub fn open(store: S) -> Result<(Self, LoadOutcome), StoreError> {
        let mut list = Self::new(store);
        let outcome = list.load()?;
        Ok((list, outcome))
    }

    /// Replace the in-memory list with the stored one.
    ///
    /// Missing data is [`LoadOutcome::NoData`]. Data that does not decode is
    /// [`StoreError::Corrupt`]; the list is left empty in both cases.
    ///
    /// Stored plaintext passphrases are hashed on load and the scrubbed list
    /// is written back.
    pub fn load(&mut self) -> Result<LoadOutcome, StoreError> {
        self.records.clear();

        if !self.store.is_set(WIFIS_KEY) {
            debug!("No stored networks");
            return Ok(LoadOutcome::NoData);
        }

        let value = match self.store.get(WIFIS_KEY) {
            Some(v) if !v.is_null() => v,
            _ => return Ok(LoadOutcome::NoData),
        };

        match serde_json::from_value::<Vec<NetworkRecord>>(value) {
            Ok(mut records) => {
                info!("Loaded {} stored networks", records.len());

                let mut hashed = 0;
                for record in records.iter_mut().filter(|r| r.has_plaintext()) {
                    info!("Hashing stored passphrase for {:?}", record.name);
                    record.hash_passphrase();
                    hashed += 1;
                }
                for record in records.iter().filter(|r| !is_valid_psk(&r.derived_key)) {
                    warn!("Stored network {:?} has no usable key", record.name);
                }

                self.records = records;
                if hashed > 0 {
                    // Next change retries the write
                    if let Err(e) = self.persist() {
                        warn!("Failed to rewrite hashed networks: {}", e);
                    }
                }
                Ok(LoadOutcome::Loaded(self.records.len()))
            }
            Err(e) => {
                warn!("Stored network list is corrupt: {}", e);
                Err(StoreError::Corrupt(e.to_string()))
            }
        }
    }

    /// Add a network, replacing any existing entry with the same SSID.
    ///
    /// The record is validated first; an invalid one is refused with
    /// [`StoreError::Invalid`] and the list is left unchanged. A plaintext
    /// passphrase is hashed before the record is stored. The full list is
    /// then persisted; on a persistence error the in-memory list still holds
    /// the new record.
    pub fn add(&mut self, mut record: NetworkRecord) -> Result<(), StoreError> {
        record.validate()?;
        if record.has_plaintext() {
            record.hash_passphrase();
        }

        self.remove_named(&record.name);
        info!("Adding network {:?}", record.name);
        self.records.push(record);
        self.persist()
    }

    /// Remove every entry named `name`.
    ///
    /// Returns `Ok(false)` without touching the store when nothing matched.
    pub fn delete(&mut self, name: &str) -> Result<bool, StoreError> {
        if !self.remove_named(name) {
            debug!("Network {:?} not in list", name);
            return Ok(false);
        }

        info!("Deleted network {:?}", name);
        self.persist()?;
        Ok(true)
    }

    /// Configured networks in list order.
    pub fn records(&self) -> &[NetworkRecord] {
        &self.records
    }

    /// Iterate over configured networks.
    pub fn iter(&self) -> std::slice::Iter<'_, NetworkRecord> {
        self.records.iter()
    }

    /// Find a network by SSID.
    pub fn get(&self, name: &str) -> Option<&NetworkRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    /// Number of configured networks.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no networks are configured.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give back the backing store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Render the supplicant config for this list.
    pub fn render(&self, config: &SupplicantConfig) -> String {
        config.render(&self.records)
    }

    /// Render and write the supplicant config.
    ///
    /// `None` writes to the default supplicant path.
    pub fn write_supplicant_config(
        &self,
        config: &SupplicantConfig,
        path: Option<&Path>,
    ) -> std::io::Result<()> {
        write_to_file(&self.render(config), path)
    }

    /// Drop entries named `name`. Returns true if any were removed.
    fn remove_named(&mut self, name: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.name != name);
        self.records.len() != before
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let value = serde_json::to_value(&self.records)
            .map_err(|e| StoreError::Serialize(e.to_string()))?;
        self.store.set(WIFIS_KEY, value);
        self.store.write_config()
    }
}

impl<'a, S: SettingsStore> IntoIterator for &'a NetworkList<S> {
    type Item = &'a NetworkRecord;
    type IntoIter = std::slice::Iter<'a, NetworkRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
