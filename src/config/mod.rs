//! Configuration types.
//!
//! # Components
//!
//! - [`ConfigError`] - validation and parsing errors
//! - [`ConfigCommand`] - commands accepted by `configure-wifi`
//! - [`DaemonConfig`] - environment-driven runtime settings

mod command;
mod daemon;
mod error;

pub use command::ConfigCommand;
pub use daemon::{DaemonConfig, DEFAULT_HTTP_PORT};
pub use error::ConfigError;
