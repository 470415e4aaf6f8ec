//! Replays due retry envelopes and reschedules them with a doubled delay.

use std::time::Duration;

use http::StatusCode;
use thiserror::Error;

use crate::envelope::{EnvelopeError, RetryEnvelope};
use crate::queue::{DelayQueue, QueueError};
use crate::relay::{Forwarder, HttpClient, Outcome, RetryPolicy};

/// Errors that prevent a failed retry from being rescheduled.
///
/// The envelope being processed must stay in the queue when this is
/// returned, so it is redelivered once its lease elapses.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The delay queue refused the rescheduled envelope.
    #[error("Failed to reschedule retry: {0}")]
    Enqueue(#[from] QueueError),

    /// The rescheduled envelope could not be serialized.
    #[error("Failed to encode rescheduled envelope: {0}")]
    Encode(#[source] EnvelopeError),
}

/// Why a retry chain ended without delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum AbandonReason {
    /// The request can never be sent (bad destination, method, or scheme).
    Invalid(String),

    /// The next delay would have met or exceeded the backoff cap.
    Exhausted {
        /// The delay, in seconds, that hit the cap.
        next_delay: f64,
    },
}

/// Result of processing one due envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome {
    /// The target accepted the replayed request.
    Delivered(StatusCode),

    /// The attempt failed and the envelope was re-queued.
    Rescheduled {
        /// The new delay in seconds.
        delay: f64,
    },

    /// The retry chain ended without delivery.
    Abandoned(AbandonReason),

    /// The payload was not a readable envelope and was discarded.
    Dropped(String),
}

/// Processes due envelopes one at a time.
///
/// # Type Parameters
///
/// - `H`: The shared transport
/// - `Q`: The delay queue rescheduled envelopes go back to
#[derive(Debug)]
pub struct RetryScheduler<H, Q> {
    forwarder: Forwarder<H>,
    queue: Q,
    policy: RetryPolicy,
}

impl<H, Q> RetryScheduler<H, Q> {
    /// Creates a scheduler.
    #[must_use]
    pub const fn new(forwarder: Forwarder<H>, queue: Q, policy: RetryPolicy) -> Self {
        Self {
            forwarder,
            queue,
            policy,
        }
    }
}

impl<H: HttpClient, Q: DelayQueue> RetryScheduler<H, Q> {
    /// Replays the envelope in `payload` once.
    ///
    /// On a retryable failure the envelope goes back to the queue with its
    /// delay doubled, unless the doubled delay reaches the backoff cap, in
    /// which case the request is abandoned.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError`] only when a failed attempt could not be
    /// rescheduled.
    pub async fn process(&self, payload: &[u8]) -> Result<RetryOutcome, SchedulerError> {
        let mut envelope = match RetryEnvelope::from_bytes(payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping unreadable retry envelope");
                return Ok(RetryOutcome::Dropped(e.to_string()));
            }
        };

        let request = match envelope.to_request() {
            Ok(request) => request,
            Err(e) => {
                tracing::info!(
                    destination = envelope.destination(),
                    error = %e,
                    "Abandoning invalid request"
                );
                return Ok(RetryOutcome::Abandoned(AbandonReason::Invalid(e.to_string())));
            }
        };

        let failure = match self
            .forwarder
            .attempt(request, self.policy.retry_request_timeout)
            .await
        {
            Outcome::Ok(status) => {
                tracing::info!(destination = envelope.destination(), %status, "Succeeded to replay");
                return Ok(RetryOutcome::Delivered(status));
            }
            Outcome::Invalid(reason) => {
                tracing::info!(
                    destination = envelope.destination(),
                    %reason,
                    "Abandoning invalid request"
                );
                return Ok(RetryOutcome::Abandoned(AbandonReason::Invalid(reason)));
            }
            Outcome::Retryable(failure) => failure,
        };

        let Some(delay) = envelope.reschedule(&self.policy) else {
            let next_delay = envelope.delay_seconds() * RetryPolicy::MULTIPLIER;
            tracing::info!(
                destination = envelope.destination(),
                %failure,
                next_delay,
                "Reached max retry delay, abandoning request"
            );
            return Ok(RetryOutcome::Abandoned(AbandonReason::Exhausted { next_delay }));
        };

        let payload = envelope.to_bytes().map_err(SchedulerError::Encode)?;
        self.queue
            .enqueue(payload, self.policy.max_retry_delay, delay_duration(delay))
            .await?;

        tracing::info!(
            destination = envelope.destination(),
            %failure,
            delay_secs = delay,
            "Postponed request"
        );
        Ok(RetryOutcome::Rescheduled { delay })
    }
}

/// Converts an envelope delay to a queue visibility delay.
///
/// Envelope delays are positive and finite once decoded; anything that does
/// not fit a [`Duration`] saturates.
fn delay_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}
