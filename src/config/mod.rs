//! Configuration layer for retry-relay.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ValidatedConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Configuration values are resolved with the following priority (highest to lowest):
//!
//! 1. **Explicit CLI arguments** - Values explicitly passed via command line
//! 2. **TOML config file** - Values from the configuration file
//! 3. **Built-in defaults** - Hardcoded default values
//!
//! No field is required; an empty configuration runs the relay with defaults.
//!
//! # CLI-Only vs TOML-Only Options
//!
//! Some options are TOML-only (not available via CLI):
//! - `server.max_body_bytes` (default: 1 MiB)
//! - `queue.max_envelope_bytes` (default: 47 KiB)
//! - `queue.lease` (default: 120s)
//! - `queue.max_concurrent` (default: 16)
//!
//! For full configurability, use a config file.

mod cli;
pub mod defaults;
mod error;
mod toml;
mod validated;

#[cfg(test)]
mod cli_tests;
#[cfg(test)]
mod validated_tests;

pub use cli::{Cli, Command};
pub use error::ConfigError;
pub use toml::{QueueSection, RelaySection, ServerSection, TomlConfig, default_config_template};
pub use validated::{ValidatedConfig, write_default_config};
