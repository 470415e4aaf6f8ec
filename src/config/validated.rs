//! Validated configuration after merging CLI and TOML sources.
//!
//! This module contains the final, validated configuration that is used
//! by the application. All validation is performed during construction.

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::relay::RetryPolicy;

use super::cli::Cli;
use super::defaults;
use super::error::ConfigError;
use super::toml::TomlConfig;

/// Fully validated configuration ready for use by the application.
///
/// # Construction
///
/// Use [`ValidatedConfig::from_raw`] to create from CLI args and optional TOML config.
/// The function validates all inputs and returns errors for invalid configurations.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Address the inbound server binds to
    pub listen: SocketAddr,

    /// Routing prefix, starting and ending with `/`
    pub prefix: String,

    /// Largest inbound body accepted
    pub max_body_bytes: usize,

    /// Request timeouts and backoff schedule
    pub retry_policy: RetryPolicy,

    /// Spool directory for pending retries.
    /// If `None`, retries are kept in memory only.
    pub spool_dir: Option<PathBuf>,

    /// Largest serialized envelope accepted for retry
    pub max_envelope_bytes: usize,

    /// How long a delivered message stays hidden before redelivery
    pub lease: Duration,

    /// Maximum number of retries processed at the same time
    pub max_concurrent: u32,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let spool_dir_str = self
            .spool_dir
            .as_ref()
            .map_or_else(|| "none".to_string(), |p| p.display().to_string());

        write!(
            f,
            "Config {{ listen: {}, prefix: {}, timeouts: {}s/{}s, retry delay: {}s..{}s, \
             spool_dir: {}, lease: {}s, max_concurrent: {} }}",
            self.listen,
            self.prefix,
            self.retry_policy.initial_request_timeout.as_secs(),
            self.retry_policy.retry_request_timeout.as_secs(),
            self.retry_policy.initial_retry_delay.as_secs(),
            self.retry_policy.max_retry_delay.as_secs(),
            spool_dir_str,
            self.lease.as_secs(),
            self.max_concurrent,
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// CLI arguments take precedence over TOML config values, which take
    /// precedence over built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The listen address is not a socket address
    /// - The prefix does not start and end with `/`
    /// - A duration, byte limit, or concurrency limit is zero
    /// - `max_retry_delay` does not exceed `initial_retry_delay`
    /// - `lease` does not exceed `retry_request_timeout`
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let listen = Self::resolve_listen(cli, toml)?;
        let prefix = Self::resolve_prefix(cli, toml)?;

        let max_body_bytes = positive_limit(
            "max_body_bytes",
            toml.and_then(|t| t.server.max_body_bytes)
                .unwrap_or(defaults::MAX_BODY_BYTES),
        )?;

        let retry_policy = Self::build_retry_policy(cli, toml)?;

        // Resolve spool directory (CLI takes precedence over TOML)
        let spool_dir = cli
            .spool_dir
            .clone()
            .or_else(|| toml.and_then(|t| t.queue.spool_dir.clone()));

        let max_envelope_bytes = positive_limit(
            "max_envelope_bytes",
            toml.and_then(|t| t.queue.max_envelope_bytes)
                .unwrap_or(defaults::MAX_ENVELOPE_BYTES),
        )?;

        let lease = Self::resolve_lease(toml, &retry_policy)?;

        let max_concurrent = toml
            .and_then(|t| t.queue.max_concurrent)
            .unwrap_or(defaults::MAX_CONCURRENT);
        if max_concurrent == 0 {
            return Err(ConfigError::InvalidLimit {
                field: "max_concurrent",
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(Self {
            listen,
            prefix,
            max_body_bytes,
            retry_policy,
            spool_dir,
            max_envelope_bytes,
            lease,
            max_concurrent,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// If `cli.config` is set, loads the TOML file from that path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The merged configuration is invalid
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(path)?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    fn resolve_listen(cli: &Cli, toml: Option<&TomlConfig>) -> Result<SocketAddr, ConfigError> {
        // Priority: CLI explicit > TOML > default
        let listen_str = cli
            .listen
            .as_deref()
            .or_else(|| toml.and_then(|t| t.server.listen.as_deref()))
            .unwrap_or(defaults::LISTEN);

        listen_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidListen {
                value: listen_str.to_string(),
                reason: e.to_string(),
            })
    }

    fn resolve_prefix(cli: &Cli, toml: Option<&TomlConfig>) -> Result<String, ConfigError> {
        let prefix = cli
            .prefix
            .as_deref()
            .or_else(|| toml.and_then(|t| t.server.prefix.as_deref()))
            .unwrap_or(defaults::PREFIX);

        if !prefix.starts_with('/') || !prefix.ends_with('/') {
            return Err(ConfigError::InvalidPrefix {
                value: prefix.to_string(),
                reason: "must start and end with '/'",
            });
        }

        Ok(prefix.to_string())
    }

    fn build_retry_policy(
        cli: &Cli,
        toml: Option<&TomlConfig>,
    ) -> Result<RetryPolicy, ConfigError> {
        let relay = toml.map(|t| &t.relay);

        // Priority: CLI explicit > TOML > default
        let initial_timeout = positive_secs(
            "initial_request_timeout",
            cli.initial_timeout
                .or_else(|| relay.and_then(|r| r.initial_request_timeout))
                .unwrap_or(defaults::INITIAL_REQUEST_TIMEOUT_SECS),
        )?;

        let retry_timeout = positive_secs(
            "retry_request_timeout",
            cli.retry_timeout
                .or_else(|| relay.and_then(|r| r.retry_request_timeout))
                .unwrap_or(defaults::RETRY_REQUEST_TIMEOUT_SECS),
        )?;

        let initial_delay = positive_secs(
            "initial_retry_delay",
            cli.retry_delay
                .or_else(|| relay.and_then(|r| r.initial_retry_delay))
                .unwrap_or(defaults::INITIAL_RETRY_DELAY_SECS),
        )?;

        let max_delay = positive_secs(
            "max_retry_delay",
            cli.max_retry_delay
                .or_else(|| relay.and_then(|r| r.max_retry_delay))
                .unwrap_or(defaults::MAX_RETRY_DELAY_SECS),
        )?;

        if max_delay <= initial_delay {
            return Err(ConfigError::InvalidRetry(format!(
                "max_retry_delay ({}s) must be greater than initial_retry_delay ({}s)",
                max_delay.as_secs(),
                initial_delay.as_secs()
            )));
        }

        Ok(RetryPolicy::new()
            .with_initial_request_timeout(initial_timeout)
            .with_retry_request_timeout(retry_timeout)
            .with_initial_retry_delay(initial_delay)
            .with_max_retry_delay(max_delay))
    }

    fn resolve_lease(
        toml: Option<&TomlConfig>,
        policy: &RetryPolicy,
    ) -> Result<Duration, ConfigError> {
        let lease = toml
            .and_then(|t| t.queue.lease)
            .map_or(Ok(defaults::lease()), |secs| positive_secs("lease", secs))?;

        // Shorter leases redeliver envelopes whose attempt is still in flight
        if lease <= policy.retry_request_timeout {
            return Err(ConfigError::InvalidDuration {
                field: "lease",
                reason: format!(
                    "must be greater than retry_request_timeout ({}s)",
                    policy.retry_request_timeout.as_secs()
                ),
            });
        }

        Ok(lease)
    }
}

/// Writes the default configuration template to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

// Helper functions

fn positive_secs(field: &'static str, seconds: u64) -> Result<Duration, ConfigError> {
    if seconds == 0 {
        return Err(ConfigError::zero_duration(field));
    }
    Ok(Duration::from_secs(seconds))
}

fn positive_limit(field: &'static str, value: usize) -> Result<usize, ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidLimit {
            field,
            reason: "must be greater than 0".to_string(),
        });
    }
    Ok(value)
}
