//! Manage stored WiFi networks and render the supplicant config.
//!
//! Usage:
//!   WIFI_SSID="MyNetwork" WIFI_PASSWORD="secret" [WIFI_PRIORITY=10] configure-wifi add
//!   WIFI_SSID="MyNetwork" configure-wifi delete
//!   configure-wifi list
//!   configure-wifi render
//!
//! `add`, `delete` and `render` rewrite the supplicant config. Paths and
//! country come from the usual settings variables (see `DaemonConfig`).

use log::info;
use std::process::exit;
use zerostick_wifi::config::{ConfigCommand, DaemonConfig};
use zerostick_wifi::store::JsonFileStore;
use zerostick_wifi::wifi::{LoadOutcome, NetworkList, NetworkRecord};

const USAGE: &str = "Usage:\n  \
    WIFI_SSID=\"MyNetwork\" WIFI_PASSWORD=\"secret\" [WIFI_PRIORITY=10] [WIFI_USE_FOR_SYNC=1] configure-wifi add\n  \
    WIFI_SSID=\"MyNetwork\" configure-wifi delete\n  \
    configure-wifi list\n  \
    configure-wifi render";

/// Print error message and exit.
fn halt_with_error(msg: &str) -> ! {
    eprintln!("{}", msg);
    exit(1);
}

fn required_env(name: &str) -> String {
    match std::env::var(name) {
        Ok(s) if !s.is_empty() => s,
        _ => halt_with_error(&format!(
            "Error: {} environment variable not set.\n\n{}",
            name, USAGE
        )),
    }
}

fn env_flag(name: &str) -> bool {
    matches!(
        std::env::var(name).as_deref().map(str::trim),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let command: ConfigCommand = match std::env::args().nth(1) {
        Some(arg) => match arg.parse() {
            Ok(cmd) => cmd,
            Err(e) => halt_with_error(&format!("Error: {}\n\n{}", e, USAGE)),
        },
        None => halt_with_error(USAGE),
    };

    let config = DaemonConfig::from_env().unwrap_or_else(|e| halt_with_error(&format!("Error: {}", e)));

    let store = JsonFileStore::open(&config.settings_path).unwrap_or_else(|e| {
        halt_with_error(&format!(
            "Error opening settings {:?}: {}",
            config.settings_path, e
        ))
    });

    // A corrupt list is never overwritten
    let (mut networks, outcome) = NetworkList::open(store).unwrap_or_else(|e| {
        halt_with_error(&format!(
            "Error loading networks from {:?}: {}",
            config.settings_path, e
        ))
    });
    if outcome == LoadOutcome::NoData {
        info!("No networks stored yet");
    }

    match command {
        ConfigCommand::Add => {
            let ssid = required_env("WIFI_SSID");
            let password = required_env("WIFI_PASSWORD");
            let priority = match std::env::var("WIFI_PRIORITY") {
                Ok(p) if !p.trim().is_empty() => p.trim().parse::<i32>().unwrap_or_else(|_| {
                    halt_with_error(&format!("Error: invalid WIFI_PRIORITY {:?}", p))
                }),
                _ => 0,
            };

            let record = NetworkRecord::new(ssid, password, priority)
                .unwrap_or_else(|e| halt_with_error(&format!("Error: {}", e)))
                .with_use_for_sync(env_flag("WIFI_USE_FOR_SYNC"));
            let name = record.name.clone();

            if let Err(e) = networks.add(record) {
                halt_with_error(&format!("Error adding {:?}: {}", name, e));
            }
            println!("Network {:?} saved ({} known)", name, networks.len());
        }
        ConfigCommand::Delete => {
            let ssid = required_env("WIFI_SSID");
            match networks.delete(&ssid) {
                Ok(true) => println!("Network {:?} removed", ssid),
                Ok(false) => println!("Network {:?} not configured", ssid),
                Err(e) => halt_with_error(&format!("Error saving networks: {}", e)),
            }
        }
        ConfigCommand::List => {
            if networks.is_empty() {
                println!("No networks configured");
            }
            for record in networks.records() {
                println!(
                    "{}\tpriority={}\tsync={}",
                    record.name, record.priority, record.use_for_sync
                );
            }
            return;
        }
        ConfigCommand::Render => {}
    }

    if command.is_mutating() {
        info!("{} known networks after {}", networks.len(), command);
    }

    if let Err(e) =
        networks.write_supplicant_config(&config.supplicant_config(), Some(config.supplicant_path.as_path()))
    {
        halt_with_error(&format!(
            "Error writing {:?}: {}",
            config.supplicant_path, e
        ));
    }
    println!("Supplicant config written to {:?}", config.supplicant_path);
}
