//! Access point scanning through `wpa_cli`.
//!
//! A scan is two invocations: `wpa_cli -i <iface> scan` asks the supplicant
//! to start scanning and answers `OK`; `wpa_cli -i <iface> scan_results`
//! prints what it found:
//!
//! ```text
//! bssid / frequency / signal level / flags / ssid
//! aa:bb:cc:dd:ee:ff	2412	-40	[WPA2-PSK-CCMP][ESS]	My Home Net
//! ```
//!
//! Only WPA2-PSK (CCMP) networks are reported.
//!
//! # Example
//!
//! ```no_run
//! use zerostick_wifi::scan::Scanner;
//!
//! let scanner = Scanner::new("wlan0");
//! for (ssid, network) in scanner.scan().unwrap() {
//!     println!("{} {} dBm", ssid, network.signal_level);
//! }
//! ```

mod command;

pub use command::{find_wireless_interface, CommandRunner, SystemRunner};

use log::{debug, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::thread;
use std::time::{Duration, Instant};

/// Wireless control tool.
pub const WPA_CLI: &str = "wpa_cli";

/// Interface scanned when none is configured.
pub const DEFAULT_INTERFACE: &str = "wlan0";

/// Security flag a result line must carry to be reported.
pub const WPA2_PSK_CCMP_FLAG: &str = "[WPA2-PSK-CCMP]";

/// Wait between triggering a scan and reading results.
///
/// The supplicant gives no completion signal through `wpa_cli`; one second
/// is usually enough but slow radios may still be scanning.
pub const SCAN_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Minimum whitespace-separated fields in a usable result line.
const MIN_RESULT_FIELDS: usize = 5;

/// One access point seen in a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObservedNetwork {
    pub bssid: String,
    pub frequency: String,
    pub signal_level: String,
    pub flags: String,
    pub ssid: String,
}

/// Scan timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Sleep after a successful trigger.
    pub settle_delay: Duration,
    /// Keep re-reading empty results for up to this long after settling.
    pub poll_timeout: Duration,
    /// Sleep between re-reads.
    pub poll_interval: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            settle_delay: SCAN_SETTLE_DELAY,
            poll_timeout: Duration::ZERO,
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Scanner bound to one wireless interface.
pub struct Scanner<R: CommandRunner = SystemRunner> {
    runner: R,
    interface: String,
    options: ScanOptions,
}

impl Scanner<SystemRunner> {
    /// Scanner that runs the real `wpa_cli`.
    pub fn new(interface: impl Into<String>) -> Self {
        Self::with_runner(SystemRunner, interface)
    }
}

impl<R: CommandRunner> Scanner<R> {
    /// Scanner using a custom command runner.
    pub fn with_runner(runner: R, interface: impl Into<String>) -> Self {
        Self {
            runner,
            interface: interface.into(),
            options: ScanOptions::default(),
        }
    }

    /// Override scan timing.
    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Interface passed to `wpa_cli -i`.
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// The command runner.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Trigger a scan and return the WPA2-PSK networks found, keyed by SSID.
    ///
    /// A trigger answer other than `OK` yields an empty map. Command
    /// failures are returned as errors and no partial results are kept.
    pub fn scan(&self) -> Result<BTreeMap<String, ObservedNetwork>, ScanError> {
        let answer = self.wpa_cli("scan")?;
        if answer.trim() != "OK" {
            warn!("Scan not started on {}: {:?}", self.interface, answer.trim());
            return Ok(BTreeMap::new());
        }
        debug!("Scan started on {}", self.interface);

        thread::sleep(self.options.settle_delay);

        let started = Instant::now();
        loop {
            let output = self.wpa_cli("scan_results")?;
            if has_result_rows(&output) || started.elapsed() >= self.options.poll_timeout {
                let networks = parse_scan_results(&output);
                debug!("Scan on {} found {} networks", self.interface, networks.len());
                return Ok(networks);
            }
            thread::sleep(self.options.poll_interval);
        }
    }

    fn wpa_cli(&self, command: &str) -> Result<String, ScanError> {
        self.runner
            .run(WPA_CLI, &["-i", self.interface.as_str(), command])
    }
}

/// Parse `scan_results` output.
///
/// The header line is skipped. Lines without [`WPA2_PSK_CCMP_FLAG`] or with
/// fewer than five fields are dropped. Fields past the fourth form the SSID,
/// rejoined with single spaces. A later line with the same SSID wins.
pub fn parse_scan_results(output: &str) -> BTreeMap<String, ObservedNetwork> {
    let mut networks = BTreeMap::new();

    for line in output.lines().skip(1) {
        if !line.contains(WPA2_PSK_CCMP_FLAG) {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < MIN_RESULT_FIELDS {
            continue;
        }

        let ssid = fields[4..].join(" ");
        networks.insert(
            ssid.clone(),
            ObservedNetwork {
                bssid: fields[0].to_string(),
                frequency: fields[1].to_string(),
                signal_level: fields[2].to_string(),
                flags: fields[3].to_string(),
                ssid,
            },
        );
    }

    networks
}

fn has_result_rows(output: &str) -> bool {
    output.lines().skip(1).any(|l| !l.trim().is_empty())
}

/// Scan errors.
#[derive(Debug)]
pub enum ScanError {
    /// The command could not be run or its output not read.
    CommandFailed(String),
    /// The command exited unsuccessfully.
    ExitStatus {
        command: String,
        code: Option<i32>,
    },
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CommandFailed(e) => write!(f, "command failed: {}", e),
            Self::ExitStatus {
                command,
                code: Some(code),
            } => write!(f, "{} exited with status {}", command, code),
            Self::ExitStatus { command, code: None } => {
                write!(f, "{} terminated by signal", command)
            }
        }
    }
}

impl std::error::Error for ScanError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    const HEADER: &str = "bssid / frequency / signal level / flags / ssid";

    /// Replays canned command results and records invocations.
    struct ScriptedRunner {
        replies: RefCell<VecDeque<Result<String, ScanError>>>,
        calls: RefCell<Vec<String>>,
    }

    impl ScriptedRunner {
        fn new(replies: Vec<Result<String, ScanError>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, program: &str, args: &[&str]) -> Result<String, ScanError> {
            self.calls
                .borrow_mut()
                .push(format!("{} {}", program, args.join(" ")));
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(ScanError::CommandFailed("no scripted reply".into())))
        }
    }

    fn instant() -> ScanOptions {
        ScanOptions {
            settle_delay: Duration::ZERO,
            poll_timeout: Duration::ZERO,
            poll_interval: Duration::ZERO,
        }
    }

    fn results(lines: &[&str]) -> String {
        let mut out = String::from(HEADER);
        for line in lines {
            out.push('\n');
            out.push_str(line);
        }
        out.push('\n');
        out
    }

    // ==================== Parser Tests ====================

    #[test]
    fn test_parse_example_line() {
        let networks =
            parse_scan_results(&results(&["aa:bb:cc:dd:ee:ff 2412 -40 [WPA2-PSK-CCMP] My Home Net"]));
        assert_eq!(
            networks.get("My Home Net"),
            Some(&ObservedNetwork {
                bssid: "aa:bb:cc:dd:ee:ff".into(),
                frequency: "2412".into(),
                signal_level: "-40".into(),
                flags: "[WPA2-PSK-CCMP]".into(),
                ssid: "My Home Net".into(),
            })
        );
    }

    #[test]
    fn test_parse_tab_separated() {
        let networks = parse_scan_results(&results(&[
            "11:22:33:44:55:66\t5180\t-61\t[WPA2-PSK-CCMP][ESS]\tOffice  5G",
        ]));
        let net = networks.get("Office 5G").expect("ssid rejoined with one space");
        assert_eq!(net.flags, "[WPA2-PSK-CCMP][ESS]");
        assert_eq!(net.frequency, "5180");
    }

    #[test]
    fn test_parse_drops_other_security() {
        let networks = parse_scan_results(&results(&[
            "aa:aa:aa:aa:aa:01 2412 -50 [WPA-PSK-TKIP][ESS] OldRouter",
            "aa:aa:aa:aa:aa:02 2437 -55 [ESS] OpenCafe",
            "aa:aa:aa:aa:aa:03 2462 -45 [WPA2-EAP-CCMP][ESS] Corp",
            "aa:aa:aa:aa:aa:04 2412 -42 [WPA2-PSK-CCMP][ESS] Good",
        ]));
        assert_eq!(networks.len(), 1);
        assert!(networks.contains_key("Good"));
    }

    #[test]
    fn test_parse_drops_short_lines() {
        let networks = parse_scan_results(&results(&[
            "aa:aa:aa:aa:aa:01 2412 -50 [WPA2-PSK-CCMP]",
            "aa:aa:aa:aa:aa:02 [WPA2-PSK-CCMP]",
        ]));
        assert!(networks.is_empty());
    }

    #[test]
    fn test_parse_skips_header_only() {
        // A header that happens to carry the flag is still skipped
        let output = "x y z [WPA2-PSK-CCMP] header\n";
        assert!(parse_scan_results(output).is_empty());
        assert!(parse_scan_results("").is_empty());
    }

    #[test]
    fn test_parse_duplicate_ssid_last_wins() {
        let networks = parse_scan_results(&results(&[
            "aa:aa:aa:aa:aa:01 2412 -70 [WPA2-PSK-CCMP] Mesh",
            "aa:aa:aa:aa:aa:02 5180 -40 [WPA2-PSK-CCMP] Mesh",
        ]));
        assert_eq!(networks.len(), 1);
        assert_eq!(networks["Mesh"].bssid, "aa:aa:aa:aa:aa:02");
    }

    // ==================== Scanner Tests ====================

    #[test]
    fn test_scan_success() {
        let runner = ScriptedRunner::new(vec![
            Ok("OK\n".into()),
            Ok(results(&["aa:bb:cc:dd:ee:ff 2412 -40 [WPA2-PSK-CCMP] Home"])),
        ]);
        let scanner = Scanner::with_runner(runner, "wlan0").with_options(instant());

        let networks = scanner.scan().unwrap();
        assert_eq!(networks.len(), 1);
        assert_eq!(
            scanner.runner().calls(),
            vec!["wpa_cli -i wlan0 scan", "wpa_cli -i wlan0 scan_results"]
        );
    }

    #[test]
    fn test_scan_trigger_fails() {
        let runner = ScriptedRunner::new(vec![Err(ScanError::ExitStatus {
            command: "wpa_cli -i wlan0 scan".into(),
            code: Some(255),
        })]);
        let scanner = Scanner::with_runner(runner, "wlan0").with_options(instant());

        assert!(matches!(scanner.scan(), Err(ScanError::ExitStatus { .. })));
        assert_eq!(scanner.runner().calls().len(), 1);
    }

    #[test]
    fn test_scan_not_ok_is_empty() {
        let runner = ScriptedRunner::new(vec![Ok("FAIL-BUSY\n".into())]);
        let scanner = Scanner::with_runner(runner, "wlan1").with_options(instant());

        assert!(scanner.scan().unwrap().is_empty());
        assert_eq!(scanner.runner().calls(), vec!["wpa_cli -i wlan1 scan"]);
    }

    #[test]
    fn test_scan_results_fail() {
        let runner = ScriptedRunner::new(vec![
            Ok("OK".into()),
            Err(ScanError::CommandFailed("broken pipe".into())),
        ]);
        let scanner = Scanner::with_runner(runner, "wlan0").with_options(instant());

        assert!(matches!(scanner.scan(), Err(ScanError::CommandFailed(_))));
    }

    #[test]
    fn test_scan_polls_until_rows() {
        let runner = ScriptedRunner::new(vec![
            Ok("OK".into()),
            Ok(format!("{}\n", HEADER)),
            Ok(format!("{}\n", HEADER)),
            Ok(results(&["aa:bb:cc:dd:ee:ff 2412 -40 [WPA2-PSK-CCMP] Late"])),
        ]);
        let options = ScanOptions {
            poll_timeout: Duration::from_secs(30),
            ..instant()
        };
        let scanner = Scanner::with_runner(runner, "wlan0").with_options(options);

        let networks = scanner.scan().unwrap();
        assert!(networks.contains_key("Late"));
        assert_eq!(scanner.runner().calls().len(), 4);
    }

    #[test]
    fn test_scan_single_read_by_default() {
        let runner = ScriptedRunner::new(vec![Ok("OK".into()), Ok(format!("{}\n", HEADER))]);
        let scanner = Scanner::with_runner(runner, "wlan0").with_options(instant());

        assert!(scanner.scan().unwrap().is_empty());
        assert_eq!(scanner.runner().calls().len(), 2);
    }

    #[test]
    fn test_default_options() {
        let options = ScanOptions::default();
        assert_eq!(options.settle_delay, Duration::from_secs(1));
        assert_eq!(options.poll_timeout, Duration::ZERO);
    }

    #[test]
    fn test_observed_network_json() {
        let networks =
            parse_scan_results(&results(&["aa:bb:cc:dd:ee:ff 2412 -40 [WPA2-PSK-CCMP] Home"]));
        let json = serde_json::to_value(&networks).unwrap();
        assert_eq!(json["Home"]["signal_level"], "-40");
        assert_eq!(json["Home"]["bssid"], "aa:bb:cc:dd:ee:ff");
    }
}
