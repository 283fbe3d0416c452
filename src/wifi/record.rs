//! Configured network records.
//!
//! A [`NetworkRecord`] describes one network the supplicant may join. The
//! plaintext passphrase only lives until [`NetworkRecord::hash_passphrase`]
//! replaces it with the derived PSK; it is never serialized once cleared.
//!
//! # Example
//!
//! ```
//! use zerostick_wifi::wifi::NetworkRecord;
//!
//! let mut record = NetworkRecord::new("Home", "supersecret", 10).unwrap();
//! record.hash_passphrase();
//! assert!(record.passphrase.is_empty());
//! assert_eq!(record.derived_key.len(), 64);
//! ```

use super::psk::{derive_psk, is_valid_psk};
use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Maximum SSID length per IEEE 802.11 standard.
pub const MAX_SSID_LEN: usize = 32;

/// Maximum passphrase length for WPA2 (64 characters would be a raw PSK).
pub const MAX_PASSWORD_LEN: usize = 63;

/// Minimum passphrase length for WPA2.
pub const MIN_PASSWORD_LEN: usize = 8;

/// One configured network.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkRecord {
    /// Network SSID, unique within a list.
    #[serde(rename = "ssid")]
    pub name: String,
    /// Plaintext passphrase. Empty once hashed.
    #[serde(rename = "password", default, skip_serializing_if = "String::is_empty")]
    pub passphrase: String,
    /// Hex-encoded PSK derived from SSID and passphrase.
    #[serde(rename = "encrypted_password", default)]
    pub derived_key: String,
    /// Selection priority; higher wins.
    #[serde(default)]
    pub priority: i32,
    /// Advisory flag for the sync service.
    #[serde(default)]
    pub use_for_sync: bool,
}

impl NetworkRecord {
    /// Create a new record carrying a plaintext passphrase.
    ///
    /// Returns an error if the SSID or passphrase are invalid.
    pub fn new(
        name: impl Into<String>,
        passphrase: impl Into<String>,
        priority: i32,
    ) -> Result<Self, ConfigError> {
        let record = Self {
            name: name.into(),
            passphrase: passphrase.into(),
            priority,
            ..Self::default()
        };
        record.validate()?;
        Ok(record)
    }

    /// Set the sync flag.
    pub fn with_use_for_sync(mut self, use_for_sync: bool) -> Self {
        self.use_for_sync = use_for_sync;
        self
    }

    /// Validate SSID and passphrase lengths.
    ///
    /// A record without a passphrase is only valid if it already carries a
    /// derived PSK.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::SsidEmpty);
        }
        if self.name.len() > MAX_SSID_LEN {
            return Err(ConfigError::SsidTooLong {
                len: self.name.len(),
                max: MAX_SSID_LEN,
            });
        }

        if self.passphrase.is_empty() && is_valid_psk(&self.derived_key) {
            return Ok(());
        }
        if self.passphrase.len() < MIN_PASSWORD_LEN {
            return Err(ConfigError::PasswordTooShort {
                len: self.passphrase.len(),
                min: MIN_PASSWORD_LEN,
            });
        }
        if self.passphrase.len() > MAX_PASSWORD_LEN {
            return Err(ConfigError::PasswordTooLong {
                len: self.passphrase.len(),
                max: MAX_PASSWORD_LEN,
            });
        }

        Ok(())
    }

    /// Returns true while the plaintext passphrase is still present.
    pub fn has_plaintext(&self) -> bool {
        !self.passphrase.is_empty()
    }

    /// Derive the PSK from the passphrase and wipe the plaintext.
    pub fn hash_passphrase(&mut self) {
        self.derived_key = derive_psk(&self.name, &self.passphrase);
        self.passphrase.zeroize();
    }
}

// Keeps secrets out of logs.
impl std::fmt::Debug for NetworkRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkRecord")
            .field("name", &self.name)
            .field("has_plaintext", &self.has_plaintext())
            .field("hashed", &!self.derived_key.is_empty())
            .field("priority", &self.priority)
            .field("use_for_sync", &self.use_for_sync)
            .finish()
    }
}
