//! Configuration and validation errors.

use std::fmt;

/// Errors that can occur while validating or parsing configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// SSID is empty.
    SsidEmpty,
    /// SSID exceeds maximum length.
    SsidTooLong { len: usize, max: usize },
    /// Passphrase is too short for WPA2.
    PasswordTooShort { len: usize, min: usize },
    /// Passphrase exceeds maximum length.
    PasswordTooLong { len: usize, max: usize },
    /// A configuration value could not be parsed.
    InvalidValue { name: String, value: String },
    /// Unknown command string.
    UnknownCommand(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SsidEmpty => write!(f, "SSID cannot be empty"),
            Self::SsidTooLong { len, max } => {
                write!(f, "SSID too long: {} bytes (max {})", len, max)
            }
            Self::PasswordTooShort { len, min } => {
                write!(f, "password too short: {} bytes (min {})", len, min)
            }
            Self::PasswordTooLong { len, max } => {
                write!(f, "password too long: {} bytes (max {})", len, max)
            }
            Self::InvalidValue { name, value } => {
                write!(f, "invalid value for {}: {:?}", name, value)
            }
            Self::UnknownCommand(cmd) => write!(f, "unknown command: {}", cmd),
        }
    }
}

impl std::error::Error for ConfigError {}
