//! Known-network credentials and supplicant config rendering.
//!
//! # Components
//!
//! - [`psk`] - WPA2 PSK derivation from SSID and passphrase
//! - [`record`] - [`NetworkRecord`] value type and validation
//! - [`list`] - [`NetworkList`], the persisted known-network list
//! - [`render`] - `wpa_supplicant.conf` rendering and writing

pub mod list;
pub mod psk;
pub mod record;
pub mod render;

pub use list::{LoadOutcome, NetworkList, WIFIS_KEY};
pub use psk::{derive_psk, is_valid_psk, PBKDF2_ITERATIONS, PSK_HEX_LEN};
pub use record::{NetworkRecord, MAX_PASSWORD_LEN, MAX_SSID_LEN, MIN_PASSWORD_LEN};
pub use render::{
    network_block, write_to_file, SupplicantConfig, DEFAULT_COUNTRY, DEFAULT_SUPPLICANT_PATH,
};
