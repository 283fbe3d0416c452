//! `configure-wifi` subcommands.

use super::ConfigError;
use std::fmt;

/// Commands accepted by the `configure-wifi` front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Add or replace a network.
    Add,
    /// Forget a network by SSID.
    Delete,
    /// Print the known networks.
    List,
    /// Re-render the supplicant config from the stored list.
    Render,
}

impl ConfigCommand {
    /// Convert command to its string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Delete => "delete",
            Self::List => "list",
            Self::Render => "render",
        }
    }

    /// Returns true if the command changes the stored list.
    pub fn is_mutating(&self) -> bool {
        matches!(self, Self::Add | Self::Delete)
    }
}

impl std::str::FromStr for ConfigCommand {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "add" => Ok(Self::Add),
            "delete" => Ok(Self::Delete),
            "list" => Ok(Self::List),
            "render" => Ok(Self::Render),
            _ => Err(ConfigError::UnknownCommand(s.to_string())),
        }
    }
}

impl fmt::Display for ConfigCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
