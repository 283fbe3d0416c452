//! Scan for WPA2-PSK networks and print them.
//!
//! Usage:
//!   [WIFI_INTERFACE=wlan0|auto] scan-wifi

use log::error;
use std::process::exit;
use zerostick_wifi::config::DaemonConfig;
use zerostick_wifi::scan::{ObservedNetwork, Scanner};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match DaemonConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("{}", e);
            exit(1);
        }
    };

    let scanner = Scanner::new(config.interface);
    let networks = match scanner.scan() {
        Ok(n) => n,
        Err(e) => {
            error!("Scan on {} failed: {}", scanner.interface(), e);
            exit(1);
        }
    };

    if networks.is_empty() {
        println!("No WPA2 networks found on {}", scanner.interface());
        return;
    }

    // Strongest first
    let mut sorted: Vec<&ObservedNetwork> = networks.values().collect();
    sorted.sort_by_key(|n| std::cmp::Reverse(n.signal_level.parse::<i32>().unwrap_or(i32::MIN)));

    for network in sorted {
        println!(
            "{:<32} {:>4} dBm  {:>5} MHz  {}",
            network.ssid, network.signal_level, network.frequency, network.bssid
        );
    }
}
