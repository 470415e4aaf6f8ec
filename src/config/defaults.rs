//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::time::Duration;

use crate::relay::RetryPolicy;
use crate::service;

/// Default listen address.
pub const LISTEN: &str = "127.0.0.1:8080";

/// Default routing prefix.
pub const PREFIX: &str = service::DEFAULT_PREFIX;

/// Default inbound body limit in bytes (1 MiB).
pub const MAX_BODY_BYTES: usize = service::DEFAULT_MAX_BODY_BYTES;

/// Default first-attempt timeout in seconds.
pub const INITIAL_REQUEST_TIMEOUT_SECS: u64 =
    RetryPolicy::DEFAULT_INITIAL_REQUEST_TIMEOUT.as_secs();

/// Default retry-attempt timeout in seconds.
pub const RETRY_REQUEST_TIMEOUT_SECS: u64 = RetryPolicy::DEFAULT_RETRY_REQUEST_TIMEOUT.as_secs();

/// Default initial retry delay in seconds (5 minutes).
pub const INITIAL_RETRY_DELAY_SECS: u64 = RetryPolicy::DEFAULT_INITIAL_RETRY_DELAY.as_secs();

/// Default backoff cap in seconds (2 days).
pub const MAX_RETRY_DELAY_SECS: u64 = RetryPolicy::DEFAULT_MAX_RETRY_DELAY.as_secs();

/// Default serialized envelope ceiling in bytes (47 KiB).
pub const MAX_ENVELOPE_BYTES: usize = service::DEFAULT_MAX_ENVELOPE_BYTES;

/// Default queue lease in seconds.
pub const LEASE_SECS: u64 = 120;

/// Default number of retries processed at the same time.
pub const MAX_CONCURRENT: u32 = service::DEFAULT_MAX_CONCURRENT;

/// Default queue lease as Duration.
#[must_use]
pub const fn lease() -> Duration {
    Duration::from_secs(LEASE_SECS)
}
