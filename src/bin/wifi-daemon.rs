//! WiFi settings daemon for the device web UI.
//!
//! Loads the stored networks, renders the supplicant config once, then
//! serves the JSON API until killed.
//!
//! # Usage
//!
//! ```bash
//! HTTP_PORT=8080 wifi-daemon
//! ```

use log::{error, info, warn};
use std::process::exit;
use zerostick_wifi::api::{ApiServer, WifiService};
use zerostick_wifi::config::DaemonConfig;
use zerostick_wifi::scan::Scanner;
use zerostick_wifi::store::JsonFileStore;
use zerostick_wifi::wifi::{LoadOutcome, NetworkList};

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("=== WiFi daemon starting ===");

    let config = match DaemonConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            exit(1);
        }
    };

    let store = match JsonFileStore::open(&config.settings_path) {
        Ok(s) => s,
        Err(e) => {
            error!("Cannot open settings {:?}: {}", config.settings_path, e);
            exit(1);
        }
    };

    // Refuse to start over corrupt data; the API would overwrite it
    let networks = match NetworkList::open(store) {
        Ok((list, LoadOutcome::Loaded(n))) => {
            info!("{} known networks", n);
            list
        }
        Ok((list, LoadOutcome::NoData)) => {
            info!("No known networks yet");
            list
        }
        Err(e) => {
            error!("Cannot load networks: {}", e);
            exit(1);
        }
    };

    let supplicant = config.supplicant_config();
    if let Err(e) =
        networks.write_supplicant_config(&supplicant, Some(config.supplicant_path.as_path()))
    {
        warn!(
            "Failed to write {:?}: {} (continuing)",
            config.supplicant_path, e
        );
    }

    let service = WifiService::new(
        networks,
        Scanner::new(config.interface.as_str()),
        supplicant,
        Some(config.supplicant_path.clone()),
    );

    let server = match ApiServer::start(None, config.http_port, service) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to start API server: {}", e);
            exit(1);
        }
    };

    info!(
        "Serving on port {} (scanning on {})",
        config.http_port, config.interface
    );
    server.join();
}
