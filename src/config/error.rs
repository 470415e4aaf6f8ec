//! Error types for configuration parsing and validation.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for configuration operations.
///
/// Covers errors from parsing, validation, and file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file '{}': {source}", path.display())]
    FileRead {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to write configuration file (for init command).
    #[error("Failed to write config file '{}': {source}", path.display())]
    FileWrite {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Listen address is not a socket address.
    #[error("Invalid listen address '{value}': {reason}")]
    InvalidListen {
        /// The invalid address string
        value: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Routing prefix is malformed.
    #[error("Invalid prefix '{value}': {reason}")]
    InvalidPrefix {
        /// The invalid prefix
        value: String,
        /// Reason for invalidity
        reason: &'static str,
    },

    /// Invalid duration value (zero or too large).
    #[error("Invalid duration for {field}: {reason}")]
    InvalidDuration {
        /// Name of the field
        field: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Invalid retry configuration.
    #[error("Invalid retry configuration: {0}")]
    InvalidRetry(String),

    /// Invalid size or count limit.
    #[error("Invalid limit for {field}: {reason}")]
    InvalidLimit {
        /// Name of the field
        field: &'static str,
        /// Reason for invalidity
        reason: String,
    },
}

impl ConfigError {
    /// Creates an `InvalidDuration` error for a zero duration.
    #[must_use]
    pub fn zero_duration(field: &'static str) -> Self {
        Self::InvalidDuration {
            field,
            reason: "must be greater than 0".to_string(),
        }
    }
}
