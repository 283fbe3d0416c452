//! Runtime settings for the front-end binaries.
//!
//! Settings come from environment variables, falling back to the device
//! defaults:
//!
//! | Variable | Default |
//! |----------|---------|
//! | `ZEROSTICK_SETTINGS` | `/etc/zerostick/config.json` |
//! | `WPA_SUPPLICANT_CONF` | `/etc/wpa_supplicant/wpa_supplicant.conf` |
//! | `WIFI_INTERFACE` | `wlan0` (`auto` detects the first wireless interface) |
//! | `WIFI_COUNTRY` | `US` |
//! | `HTTP_PORT` | `8080` |

use super::ConfigError;
use crate::scan::{find_wireless_interface, DEFAULT_INTERFACE};
use crate::store::DEFAULT_SETTINGS_PATH;
use crate::wifi::{SupplicantConfig, DEFAULT_COUNTRY, DEFAULT_SUPPLICANT_PATH};
use log::{debug, warn};
use std::path::PathBuf;

/// Default port for the HTTP API.
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Interface value that requests auto-detection.
const AUTO_INTERFACE: &str = "auto";

/// Settings shared by the binaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    /// JSON settings file holding the network list.
    pub settings_path: PathBuf,
    /// Rendered supplicant config.
    pub supplicant_path: PathBuf,
    /// Wireless interface passed to `wpa_cli -i`.
    pub interface: String,
    /// Regulatory country code written to the supplicant config.
    pub country: String,
    /// Port for the HTTP API.
    pub http_port: u16,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            settings_path: PathBuf::from(DEFAULT_SETTINGS_PATH),
            supplicant_path: PathBuf::from(DEFAULT_SUPPLICANT_PATH),
            interface: DEFAULT_INTERFACE.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            http_port: DEFAULT_HTTP_PORT,
        }
    }
}

impl DaemonConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through a lookup function (environment or a test map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = non_empty(lookup("ZEROSTICK_SETTINGS")) {
            config.settings_path = PathBuf::from(path);
        }
        if let Some(path) = non_empty(lookup("WPA_SUPPLICANT_CONF")) {
            config.supplicant_path = PathBuf::from(path);
        }

        if let Some(iface) = non_empty(lookup("WIFI_INTERFACE")) {
            config.interface = if iface.eq_ignore_ascii_case(AUTO_INTERFACE) {
                match find_wireless_interface() {
                    Some(found) => {
                        debug!("Detected wireless interface {}", found);
                        found
                    }
                    None => {
                        warn!(
                            "No wireless interface detected, using {}",
                            DEFAULT_INTERFACE
                        );
                        DEFAULT_INTERFACE.to_string()
                    }
                }
            } else {
                iface
            };
        }

        if let Some(country) = non_empty(lookup("WIFI_COUNTRY")) {
            if country.len() != 2 || !country.bytes().all(|b| b.is_ascii_uppercase()) {
                return Err(ConfigError::InvalidValue {
                    name: "WIFI_COUNTRY".into(),
                    value: country,
                });
            }
            config.country = country;
        }

        if let Some(port) = non_empty(lookup("HTTP_PORT")) {
            config.http_port = match port.parse::<u16>() {
                Ok(p) if p != 0 => p,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "HTTP_PORT".into(),
                        value: port,
                    })
                }
            };
        }

        Ok(config)
    }

    /// Supplicant header directives for this device.
    pub fn supplicant_config(&self) -> SupplicantConfig {
        SupplicantConfig {
            country: self.country.clone(),
            ..SupplicantConfig::default()
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
