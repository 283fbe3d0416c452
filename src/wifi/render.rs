//! `wpa_supplicant.conf` rendering.
//!
//! Output layout:
//!
//! ```text
//! ctrl_interface=DIR=/var/run/wpa_supplicant GROUP=netdev
//! update_config=1
//! country=US
//! network={
//!     ssid"Home"
//!     psk=<64 hex chars>
//!     priority=10
//! }
//! ```
//!
//! The SSID line is written as `ssid"<name>"` with no `=`. This matches the
//! format the device has always produced; it is kept verbatim until the
//! consuming daemon is confirmed to reject it.

use super::record::NetworkRecord;
use log::info;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

/// Default location of the supplicant config.
pub const DEFAULT_SUPPLICANT_PATH: &str = "/etc/wpa_supplicant/wpa_supplicant.conf";

/// Default control interface directive.
pub const DEFAULT_CTRL_INTERFACE: &str = "DIR=/var/run/wpa_supplicant GROUP=netdev";

/// Default regulatory country.
pub const DEFAULT_COUNTRY: &str = "US";

/// Owner read/write only; the file holds PSKs.
#[cfg(unix)]
const CONFIG_FILE_MODE: u32 = 0o600;

/// Daemon-level directives written before the network blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplicantConfig {
    /// `ctrl_interface=` value.
    pub ctrl_interface: String,
    /// `update_config=1` when true.
    pub update_config: bool,
    /// `country=` value.
    pub country: String,
}

impl Default for SupplicantConfig {
    fn default() -> Self {
        Self {
            ctrl_interface: DEFAULT_CTRL_INTERFACE.to_string(),
            update_config: true,
            country: DEFAULT_COUNTRY.to_string(),
        }
    }
}

impl SupplicantConfig {
    /// The directive block.
    pub fn header(&self) -> String {
        format!(
            "ctrl_interface={}\nupdate_config={}\ncountry={}\n",
            self.ctrl_interface,
            u8::from(self.update_config),
            self.country
        )
    }

    /// Render the header followed by one block per record, in order.
    pub fn render(&self, records: &[NetworkRecord]) -> String {
        let mut config = self.header();
        for record in records {
            config.push_str(&network_block(record));
        }
        config
    }
}

/// Render a single `network={...}` block.
pub fn network_block(record: &NetworkRecord) -> String {
    format!(
        "network={{\n\tssid\"{}\"\n\tpsk={}\n\tpriority={}\n}}\n",
        record.name, record.derived_key, record.priority
    )
}

/// Write rendered config text with owner-only permissions.
///
/// `None` writes to [`DEFAULT_SUPPLICANT_PATH`]. Errors are returned as-is.
pub fn write_to_file(text: &str, path: Option<&Path>) -> io::Result<()> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_SUPPLICANT_PATH));

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(CONFIG_FILE_MODE);
    }

    let mut file = options.open(path)?;
    file.write_all(text.as_bytes())?;

    // mode() only applies on create; tighten a pre-existing file too
    #[cfg(unix)]
    {
        use std::fs::{set_permissions, Permissions};
        use std::os::unix::fs::PermissionsExt;
        set_permissions(path, Permissions::from_mode(CONFIG_FILE_MODE))?;
    }

    info!("Supplicant config written to {:?}", path);
    Ok(())
}
