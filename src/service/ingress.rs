//! First delivery attempt and hand-off to the delay queue.

use http::StatusCode;

use crate::envelope::RetryEnvelope;
use crate::queue::DelayQueue;
use crate::relay::{
    Failure, Forwarder, HttpClient, HttpRequest, Outcome, RetryPolicy, carries_body,
    is_relayed_method,
};

/// Default ceiling for one serialized envelope (47 KiB).
///
/// A 48 KiB queue message limit minus 1 KiB reserved for message metadata.
pub const DEFAULT_MAX_ENVELOPE_BYTES: usize = 47 * 1024;

/// An inbound relay request, with the routing prefix already removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRequest {
    /// The inbound HTTP verb, reused for the outbound request.
    pub method: http::Method,
    /// Everything after the routing prefix: an absolute URI including any query.
    pub target: String,
    /// The raw inbound body.
    pub body: Vec<u8>,
}

impl InboundRequest {
    /// Creates an inbound request.
    #[must_use]
    pub fn new(method: http::Method, target: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            method,
            target: target.into(),
            body,
        }
    }
}

/// What the caller is told about its relay request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngressResponse {
    /// The first attempt succeeded.
    Delivered {
        /// Status returned by the target.
        status: StatusCode,
        /// The parsed target URI.
        target: url::Url,
    },

    /// The first attempt failed and a retry was scheduled.
    Queued {
        /// Why the first attempt failed.
        failure: Failure,
        /// The parsed target URI.
        target: url::Url,
    },

    /// The target is malformed or was refused by the transport. Never retried.
    Rejected(String),

    /// The inbound verb is not one that is relayed.
    MethodNotAllowed(http::Method),

    /// The retry envelope would exceed the queue's message ceiling.
    TooLarge {
        /// Serialized envelope size.
        size: usize,
        /// Configured ceiling.
        limit: usize,
    },

    /// The delay queue refused the retry envelope.
    Unavailable(String),
}

impl IngressResponse {
    /// HTTP status returned to the caller.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Delivered { .. } | Self::Queued { .. } => StatusCode::OK,
            Self::Rejected(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Plain-text body returned to the caller.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Delivered { status, target } => format!("Received {status} from {target}"),
            Self::Queued { failure, target } => format!("Received {failure} from {target}"),
            Self::Rejected(reason) | Self::Unavailable(reason) => reason.clone(),
            Self::MethodNotAllowed(method) => format!("Method {method} is not relayed"),
            Self::TooLarge { size, limit } => {
                format!("Request too large to queue for retry ({size} bytes, limit {limit})")
            }
        }
    }
}

/// Relays an inbound request once and schedules a retry on failure.
///
/// # Type Parameters
///
/// - `H`: The shared transport
/// - `Q`: The delay queue receiving retry envelopes
#[derive(Debug)]
pub struct IngressHandler<H, Q> {
    forwarder: Forwarder<H>,
    queue: Q,
    policy: RetryPolicy,
    max_envelope_bytes: usize,
}

impl<H, Q> IngressHandler<H, Q> {
    /// Creates a handler with the default envelope ceiling.
    #[must_use]
    pub const fn new(forwarder: Forwarder<H>, queue: Q, policy: RetryPolicy) -> Self {
        Self {
            forwarder,
            queue,
            policy,
            max_envelope_bytes: DEFAULT_MAX_ENVELOPE_BYTES,
        }
    }

    /// Sets the largest serialized envelope accepted for retry.
    #[must_use]
    pub const fn with_max_envelope_bytes(mut self, limit: usize) -> Self {
        self.max_envelope_bytes = limit;
        self
    }
}

impl<H: HttpClient, Q: DelayQueue> IngressHandler<H, Q> {
    /// Validates the target, attempts delivery once and queues a retry if
    /// the attempt failed in a retryable way.
    ///
    /// A malformed target is rejected without any outbound attempt or
    /// queue interaction. A successful first attempt enqueues nothing.
    pub async fn handle(&self, inbound: InboundRequest) -> IngressResponse {
        let InboundRequest {
            method,
            target,
            body,
        } = inbound;

        let Ok(url) = url::Url::parse(&target) else {
            return IngressResponse::Rejected(format!("{target} is not valid absolute Uri"));
        };

        if !is_relayed_method(&method) {
            return IngressResponse::MethodNotAllowed(method);
        }

        let mut request = HttpRequest::new(method.clone(), url.clone());
        if carries_body(&method) {
            request = request.with_body(body.clone());
        }

        match self
            .forwarder
            .attempt(request, self.policy.initial_request_timeout)
            .await
        {
            Outcome::Ok(status) => IngressResponse::Delivered {
                status,
                target: url,
            },
            Outcome::Invalid(reason) => {
                tracing::info!(%url, %reason, "Rejected invalid request");
                IngressResponse::Rejected(reason)
            }
            Outcome::Retryable(failure) => {
                let envelope =
                    RetryEnvelope::new(target, &method, Some(body), self.policy.initial_delay_secs());
                self.schedule(envelope, failure, url).await
            }
        }
    }

    async fn schedule(
        &self,
        envelope: RetryEnvelope,
        failure: Failure,
        url: url::Url,
    ) -> IngressResponse {
        let payload = match envelope.to_bytes() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(%url, error = %e, "Failed to encode retry envelope");
                return IngressResponse::Unavailable(e.to_string());
            }
        };

        if payload.len() > self.max_envelope_bytes {
            tracing::warn!(
                %url,
                size = payload.len(),
                limit = self.max_envelope_bytes,
                "Request too large to queue for retry"
            );
            return IngressResponse::TooLarge {
                size: payload.len(),
                limit: self.max_envelope_bytes,
            };
        }

        let delay = self.policy.initial_retry_delay;
        if let Err(e) = self
            .queue
            .enqueue(payload, self.policy.max_retry_delay, delay)
            .await
        {
            tracing::error!(%url, error = %e, "Failed to queue retry");
            return IngressResponse::Unavailable(format!("Failed to queue retry: {e}"));
        }

        tracing::info!(%url, %failure, delay_secs = delay.as_secs_f64(), "Queued retry");
        IngressResponse::Queued {
            failure,
            target: url,
        }
    }
}

