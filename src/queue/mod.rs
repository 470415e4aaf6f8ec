//! Delay queue: durable storage that hands envelopes back after a delay.
//!
//! The relay core only needs [`DelayQueue::enqueue`]. [`LocalQueue`] adds
//! the consumer side (receive, lease, acknowledge) used by the retry worker.
//!
//! # Delivery guarantees
//!
//! Delivery is **at-least-once**. A message whose lease elapses before it is
//! acknowledged becomes visible again, and a crash between processing and
//! acknowledgement replays it after restart. Consumers must tolerate seeing
//! the same envelope more than once; duplicate outbound attempts to a target
//! are an accepted consequence and are not deduplicated.

mod local;
mod spool;

#[cfg(test)]
mod spool_tests;

pub use local::{Delivery, LocalQueue};

use std::io;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while storing or removing messages.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Failed to read or write the spool directory.
    #[error("Spool I/O error: {0}")]
    Spool(#[source] io::Error),

    /// Failed to serialize a spooled message.
    #[error("Failed to serialize spooled message: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Abstraction for the queue that stores retry envelopes.
///
/// Implementations must withhold a message from consumers until
/// `visibility_delay` has elapsed, and drop it once `time_to_live` elapses
/// without it being consumed. Redelivery may happen later than requested,
/// never earlier.
pub trait DelayQueue: Send + Sync {
    /// Stores `payload` for delivery after `visibility_delay`.
    ///
    /// # Errors
    ///
    /// Returns an error if the message could not be stored durably.
    fn enqueue(
        &self,
        payload: Vec<u8>,
        time_to_live: Duration,
        visibility_delay: Duration,
    ) -> impl std::future::Future<Output = Result<(), QueueError>> + Send;
}

impl<Q: DelayQueue> DelayQueue for Arc<Q> {
    fn enqueue(
        &self,
        payload: Vec<u8>,
        time_to_live: Duration,
        visibility_delay: Duration,
    ) -> impl std::future::Future<Output = Result<(), QueueError>> + Send {
        (**self).enqueue(payload, time_to_live, visibility_delay)
    }
}
