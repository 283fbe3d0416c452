//! External command invocation.
//!
//! [`CommandRunner`] is the seam between the scanner and the operating
//! system, so scan handling can be exercised with scripted output.

use super::ScanError;
use log::debug;
use std::process::Command;

/// Runs an external program and returns its standard output.
pub trait CommandRunner {
    /// Run `program` with `args`, capturing stdout.
    ///
    /// A spawn failure or a non-zero exit status is an error.
    fn run(&self, program: &str, args: &[&str]) -> Result<String, ScanError>;
}

/// Runs commands with [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<String, ScanError> {
        debug!("Running {} {}", program, args.join(" "));

        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| ScanError::CommandFailed(format!("{}: {}", program, e)))?;

        if !output.status.success() {
            return Err(ScanError::ExitStatus {
                command: format!("{} {}", program, args.join(" ")),
                code: output.status.code(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Find the first wireless network interface.
///
/// Wireless interfaces expose a `wireless` directory under
/// `/sys/class/net/<iface>/`. Returns `None` if there is none (or no sysfs).
pub fn find_wireless_interface() -> Option<String> {
    let paths = glob::glob("/sys/class/net/*/wireless").ok()?;
    let mut names: Vec<String> = paths
        .flatten()
        .filter_map(|p| {
            p.parent()
                .and_then(|iface| iface.file_name())
                .map(|name| name.to_string_lossy().to_string())
        })
        .collect();
    names.sort();
    names.into_iter().next()
}
