//! TOML configuration file parsing.
//!
//! Defines the structure of the configuration file with serde.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional to allow partial configuration
/// that can be merged with CLI arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Inbound server configuration
    #[serde(default)]
    pub server: ServerSection,

    /// Relay timeouts and backoff configuration
    #[serde(default)]
    pub relay: RelaySection,

    /// Delay queue configuration
    #[serde(default)]
    pub queue: QueueSection,
}

/// Inbound server configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Socket address to listen on
    pub listen: Option<String>,

    /// Routing prefix stripped from inbound paths
    pub prefix: Option<String>,

    /// Maximum inbound body size in bytes
    pub max_body_bytes: Option<usize>,
}

/// Relay configuration section. All durations are in seconds.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelaySection {
    /// Timeout for the first delivery attempt
    pub initial_request_timeout: Option<u64>,

    /// Timeout for each retry attempt
    pub retry_request_timeout: Option<u64>,

    /// Delay before the first retry
    pub initial_retry_delay: Option<u64>,

    /// Backoff cap and queued-retry lifetime
    pub max_retry_delay: Option<u64>,
}

/// Delay queue configuration section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueueSection {
    /// Directory where pending retries are persisted
    pub spool_dir: Option<PathBuf>,

    /// Maximum serialized envelope size in bytes
    pub max_envelope_bytes: Option<usize>,

    /// Seconds a delivered message stays hidden before redelivery
    pub lease: Option<u64>,

    /// Maximum number of retries processed at the same time
    pub max_concurrent: Option<u32>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# retry-relay Configuration File

[server]
# Socket address to listen on (default: 127.0.0.1:8080)
listen = "127.0.0.1:8080"

# Routing prefix; requests to <prefix><absolute-uri> are relayed (default: "/r/")
# prefix = "/r/"

# Maximum inbound body size in bytes (default: 1048576)
# max_body_bytes = 1048576

[relay]
# Timeout for the first, synchronous delivery attempt in seconds (default: 30)
# initial_request_timeout = 30

# Timeout for each scheduled retry attempt in seconds (default: 30)
# retry_request_timeout = 30

# Delay before the first retry in seconds (default: 300)
# Every further failure doubles the delay.
# initial_retry_delay = 300

# Backoff cap in seconds (default: 172800 = 2 days)
# A request is abandoned once the doubled delay would reach this value.
# max_retry_delay = 172800

[queue]
# Directory where pending retries are persisted across restarts
# (default: none, retries are kept in memory only)
# spool_dir = "spool"

# Maximum serialized retry envelope in bytes (default: 48128 = 47 KiB)
# Larger requests are answered with 413 instead of being queued.
# max_envelope_bytes = 48128

# Seconds a retry being processed stays hidden before it is redelivered
# (default: 120, must exceed relay.retry_request_timeout)
# lease = 120

# Maximum number of retries processed at the same time (default: 16)
# max_concurrent = 16
"#
    .to_string()
}
