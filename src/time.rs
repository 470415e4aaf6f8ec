//! Time abstraction for testability.
//!
//! This module provides a [`Clock`] trait that allows injecting mock clocks
//! in tests while using the real system clock in production.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Abstraction over system time for testability.
///
/// Implementations provide the current time, allowing tests to inject
/// controlled time values instead of relying on actual system time.
///
/// # Example
///
/// ```
/// use retry_relay::time::{Clock, SystemClock};
///
/// let clock = SystemClock;
/// let now = clock.now();
/// assert!(now >= std::time::SystemTime::UNIX_EPOCH);
/// ```
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> SystemTime;

    /// Returns the current time as milliseconds since the Unix epoch.
    ///
    /// Pre-epoch times (never produced by a sane clock) map to 0.
    fn now_millis(&self) -> u64 {
        to_millis(self.now())
    }
}

/// Production clock using actual system time.
///
/// This is the default clock implementation that delegates to
/// [`SystemTime::now()`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

impl<C: Clock> Clock for Arc<C> {
    fn now(&self) -> SystemTime {
        (**self).now()
    }
}

/// Converts a point in time to milliseconds since the Unix epoch.
#[must_use]
pub fn to_millis(time: SystemTime) -> u64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Converts a duration to whole milliseconds, saturating on overflow.
#[must_use]
pub fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// A mock clock for testing that returns controlled time values.
    struct MockClock {
        /// Seconds since `UNIX_EPOCH`, atomically updated.
        secs: AtomicU64,
    }

    impl MockClock {
        fn new(initial_secs: u64) -> Self {
            Self {
                secs: AtomicU64::new(initial_secs),
            }
        }

        fn advance(&self, secs: u64) {
            self.secs.fetch_add(secs, Ordering::SeqCst);
        }
    }

    impl Clock for MockClock {
        fn now(&self) -> SystemTime {
            SystemTime::UNIX_EPOCH + Duration::from_secs(self.secs.load(Ordering::SeqCst))
        }
    }

    #[test]
    fn system_clock_returns_current_time() {
        let clock = SystemClock;
        let before = SystemTime::now();
        let result = clock.now();
        let after = SystemTime::now();

        assert!(result >= before);
        assert!(result <= after);
    }

    #[test]
    fn system_clock_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SystemClock>();
    }

    #[test]
    fn mock_clock_millis_track_seconds() {
        let clock = MockClock::new(1_000);
        assert_eq!(clock.now_millis(), 1_000_000);

        clock.advance(5);
        assert_eq!(clock.now_millis(), 1_005_000);
    }

    #[test]
    fn arc_clock_delegates_to_inner() {
        let clock = Arc::new(MockClock::new(42));
        let shared = Arc::clone(&clock);

        clock.advance(8);
        assert_eq!(shared.now(), SystemTime::UNIX_EPOCH + Duration::from_secs(50));
    }

    #[test]
    fn to_millis_maps_pre_epoch_to_zero() {
        let before_epoch = SystemTime::UNIX_EPOCH - Duration::from_secs(1);
        assert_eq!(to_millis(before_epoch), 0);
    }

    #[test]
    fn duration_millis_truncates_sub_millisecond_part() {
        assert_eq!(duration_millis(Duration::from_micros(2_500)), 2);
        assert_eq!(duration_millis(Duration::from_secs(3)), 3_000);
    }
}
