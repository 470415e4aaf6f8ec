//! Application startup and utilities.
//!
//! This module contains exit codes, tracing setup, and error hints
//! that support the main entry point.

use retry_relay::config::ConfigError;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Application exit codes.
pub mod exit_code {
    use std::process::ExitCode;

    /// Success (exit code 0).
    pub const SUCCESS: ExitCode = ExitCode::SUCCESS;

    /// Configuration error (exit code 1) - invalid args, unreadable config file, etc.
    pub const CONFIG_ERROR: ExitCode = ExitCode::FAILURE;

    /// Runtime error (exit code 2) - bind failure, spool failure, server error.
    ///
    /// Note: This is a function rather than a constant because `ExitCode::from()` is not `const fn`.
    pub fn runtime_error() -> ExitCode {
        ExitCode::from(2)
    }
}

/// Returns a hint for common configuration errors, if one applies.
pub fn config_hint(error: &ConfigError) -> Option<&'static str> {
    match error {
        ConfigError::FileRead { .. } => {
            Some("Run 'retry-relay init' to generate a configuration template.")
        }
        ConfigError::InvalidDuration { field: "lease", .. } => {
            Some("Raise queue.lease or lower relay.retry_request_timeout.")
        }
        ConfigError::InvalidRetry(_) => {
            Some("Raise relay.max_retry_delay (--max-retry-delay) above the initial delay.")
        }
        _ => None,
    }
}

/// Prints helpful hints for common configuration errors.
pub fn print_config_hint(error: &ConfigError) {
    if let Some(hint) = config_hint(error) {
        eprintln!("\n{hint}");
    }
}

/// Sets up the tracing subscriber for logging.
pub fn setup_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn missing_file_suggests_init() {
        let error = ConfigError::FileRead {
            path: PathBuf::from("absent.toml"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(config_hint(&error).unwrap().contains("retry-relay init"));
    }

    #[test]
    fn short_lease_suggests_fix() {
        let error = ConfigError::InvalidDuration {
            field: "lease",
            reason: "must be greater than retry_request_timeout (30s)".to_string(),
        };
        assert!(config_hint(&error).unwrap().contains("queue.lease"));
    }

    #[test]
    fn other_errors_have_no_hint() {
        let error = ConfigError::InvalidPrefix {
            value: "r".to_string(),
            reason: "must start and end with '/'",
        };
        assert!(config_hint(&error).is_none());
    }

    #[test]
    fn runtime_error_is_two() {
        assert_eq!(
            format!("{:?}", exit_code::runtime_error()),
            format!("{:?}", std::process::ExitCode::from(2))
        );
    }
}
