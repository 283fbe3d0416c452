//! ZeroStick WiFi network management.
//!
//! Keeps the device's list of known WiFi networks in a settings store,
//! renders the `wpa_supplicant` configuration from it, and scans for
//! WPA2-PSK networks in range. The `http-api` feature adds the JSON API
//! used by the web UI.

pub mod config;
pub mod scan;
pub mod store;
pub mod wifi;

#[cfg(feature = "http-api")]
pub mod api;

// Re-export commonly used items
pub use config::{ConfigCommand, ConfigError, DaemonConfig};
pub use scan::{CommandRunner, ObservedNetwork, ScanError, Scanner, SystemRunner};
pub use store::{JsonFileStore, MemoryStore, SettingsStore, StoreError};
pub use wifi::{LoadOutcome, NetworkList, NetworkRecord, SupplicantConfig};

#[cfg(feature = "http-api")]
pub use api::{ApiServer, WifiService};
