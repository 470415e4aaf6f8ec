//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// retry-relay: HTTP relay with durable exponential-backoff retries
///
/// Forwards `<prefix><absolute-uri>` requests to the embedded target and,
/// if the target fails, keeps retrying with a doubling delay until it
/// accepts or the backoff cap is reached.
#[derive(Debug, Parser)]
#[command(name = "retry-relay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Socket address to listen on
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<String>,

    /// Routing prefix stripped from inbound paths (must start and end with '/')
    #[arg(long)]
    pub prefix: Option<String>,

    /// Timeout for the first delivery attempt in seconds
    #[arg(long = "initial-timeout", value_name = "SECS")]
    pub initial_timeout: Option<u64>,

    /// Timeout for each retry attempt in seconds
    #[arg(long = "retry-timeout", value_name = "SECS")]
    pub retry_timeout: Option<u64>,

    /// Delay before the first retry in seconds
    #[arg(long = "retry-delay", value_name = "SECS")]
    pub retry_delay: Option<u64>,

    /// Backoff cap in seconds; also the lifetime of every queued retry
    #[arg(long = "max-retry-delay", value_name = "SECS")]
    pub max_retry_delay: Option<u64>,

    /// Directory where pending retries are persisted (memory only if unset)
    #[arg(long = "spool-dir", value_name = "DIR")]
    pub spool_dir: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,
}

/// Subcommands for retry-relay
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = "retry-relay.toml")]
        output: PathBuf,
    },
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Command::Init { .. }))
    }
}
