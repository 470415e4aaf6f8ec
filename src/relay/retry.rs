//! Retry policy: request timeouts and exponential backoff arithmetic.

use std::time::Duration;

/// Configuration for relay timeouts and the exponential backoff schedule.
///
/// The first delivery attempt waits at most `initial_request_timeout`.
/// A failed delivery is retried after `initial_retry_delay`, and every
/// further failure doubles the delay. Once the doubled delay would meet or
/// exceed `max_retry_delay` the request is abandoned.
///
/// # Defaults
///
/// - `initial_request_timeout`: 30 seconds
/// - `retry_request_timeout`: 30 seconds
/// - `initial_retry_delay`: 5 minutes
/// - `max_retry_delay`: 2 days
///
/// # Example
///
/// ```
/// use retry_relay::relay::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new()
///     .with_initial_retry_delay(Duration::from_secs(10))
///     .with_max_retry_delay(Duration::from_secs(60));
///
/// assert_eq!(policy.next_delay(10.0), Some(20.0));
/// assert_eq!(policy.next_delay(20.0), Some(40.0));
/// assert_eq!(policy.next_delay(40.0), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum wait for the synchronous first attempt.
    pub initial_request_timeout: Duration,

    /// Maximum wait for each scheduled retry attempt.
    pub retry_request_timeout: Duration,

    /// Delay before the first retry.
    pub initial_retry_delay: Duration,

    /// Backoff cap.
    ///
    /// Also used as the time-to-live of every queued envelope.
    pub max_retry_delay: Duration,
}

impl RetryPolicy {
    /// Default timeout for the first attempt (30 seconds).
    pub const DEFAULT_INITIAL_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Default timeout for retry attempts (30 seconds).
    pub const DEFAULT_RETRY_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Default initial retry delay (5 minutes).
    pub const DEFAULT_INITIAL_RETRY_DELAY: Duration = Duration::from_secs(5 * 60);

    /// Default backoff cap (2 days).
    pub const DEFAULT_MAX_RETRY_DELAY: Duration = Duration::from_secs(2 * 24 * 60 * 60);

    /// Factor applied to the delay after each failed retry.
    pub const MULTIPLIER: f64 = 2.0;

    /// Creates a new retry policy with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            initial_request_timeout: Self::DEFAULT_INITIAL_REQUEST_TIMEOUT,
            retry_request_timeout: Self::DEFAULT_RETRY_REQUEST_TIMEOUT,
            initial_retry_delay: Self::DEFAULT_INITIAL_RETRY_DELAY,
            max_retry_delay: Self::DEFAULT_MAX_RETRY_DELAY,
        }
    }

    /// Sets the timeout for the first attempt.
    #[must_use]
    pub const fn with_initial_request_timeout(mut self, timeout: Duration) -> Self {
        self.initial_request_timeout = timeout;
        self
    }

    /// Sets the timeout for retry attempts.
    #[must_use]
    pub const fn with_retry_request_timeout(mut self, timeout: Duration) -> Self {
        self.retry_request_timeout = timeout;
        self
    }

    /// Sets the delay before the first retry.
    ///
    /// # Panics
    ///
    /// Panics if `delay` is zero. A zero delay never grows, so the
    /// schedule would never reach the cap.
    #[must_use]
    pub const fn with_initial_retry_delay(mut self, delay: Duration) -> Self {
        assert!(!delay.is_zero(), "initial_retry_delay must be positive");
        self.initial_retry_delay = delay;
        self
    }

    /// Sets the backoff cap.
    #[must_use]
    pub const fn with_max_retry_delay(mut self, delay: Duration) -> Self {
        self.max_retry_delay = delay;
        self
    }

    /// Returns the first retry delay in seconds, as stored in envelopes.
    #[must_use]
    pub fn initial_delay_secs(&self) -> f64 {
        self.initial_retry_delay.as_secs_f64()
    }

    /// Computes the delay that follows `current_secs` after a failed retry.
    ///
    /// Returns `None` when the doubled delay meets or exceeds
    /// `max_retry_delay`, meaning the request must be abandoned.
    #[must_use]
    pub fn next_delay(&self, current_secs: f64) -> Option<f64> {
        let next = current_secs * Self::MULTIPLIER;
        if next >= self.max_retry_delay.as_secs_f64() {
            None
        } else {
            Some(next)
        }
    }

    /// Returns every delay a request can be scheduled with, in order.
    ///
    /// Starts at `initial_retry_delay` and stops before the cap.
    /// Useful for logging the effective schedule at startup.
    #[must_use]
    pub fn schedule(&self) -> Vec<f64> {
        let mut delays = vec![self.initial_delay_secs()];
        let mut current = self.initial_delay_secs();
        while let Some(next) = self.next_delay(current) {
            delays.push(next);
            current = next;
        }
        delays
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}
