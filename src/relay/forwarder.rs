//! Single-shot delivery attempts with a bounded wait.

use std::fmt;
use std::time::Duration;

use super::{HttpClient, HttpError, HttpRequest, HttpResponse};

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The target answered with a success status before the timeout.
    Ok(http::StatusCode),

    /// The transport rejected the request before sending it.
    ///
    /// Permanent: retrying the same request can never succeed.
    Invalid(String),

    /// The attempt failed in a way that may succeed later.
    Retryable(Failure),
}

/// Why a retryable attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The target answered with a non-success status.
    Status(http::StatusCode),

    /// No answer arrived within the attempt timeout.
    Timeout,

    /// The connection failed (DNS, refused, reset, truncated body).
    Transport(String),
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => write!(f, "{status}"),
            Self::Timeout => f.write_str("timeout"),
            Self::Transport(reason) => f.write_str(reason),
        }
    }
}

/// Reduces a transport result to an [`Outcome`].
///
/// Pure function of its input, so identical results always classify
/// identically.
#[must_use]
pub fn classify(result: Result<HttpResponse, HttpError>) -> Outcome {
    match result {
        Ok(response) if response.is_success() => Outcome::Ok(response.status),
        Ok(response) => Outcome::Retryable(Failure::Status(response.status)),
        Err(HttpError::InvalidUrl(reason)) => Outcome::Invalid(reason),
        Err(HttpError::Timeout) => Outcome::Retryable(Failure::Timeout),
        Err(HttpError::Connection(e)) => Outcome::Retryable(Failure::Transport(e.to_string())),
    }
}

/// Performs exactly one outbound attempt and classifies the result.
///
/// Never retries on its own and never surfaces transport errors; callers
/// only ever see an [`Outcome`]. The wrapped client is the shared transport
/// handle and is never recreated per call.
#[derive(Debug, Clone)]
pub struct Forwarder<H> {
    client: H,
}

impl<H> Forwarder<H> {
    /// Creates a forwarder over the given transport.
    #[must_use]
    pub const fn new(client: H) -> Self {
        Self { client }
    }

    /// Returns the underlying transport.
    #[must_use]
    pub const fn client(&self) -> &H {
        &self.client
    }
}

impl<H: HttpClient> Forwarder<H> {
    /// Sends `request`, racing it against `timeout`.
    ///
    /// If the timer wins, the in-flight call is dropped and the attempt is
    /// [`Outcome::Retryable`] with [`Failure::Timeout`].
    pub async fn attempt(&self, request: HttpRequest, timeout: Duration) -> Outcome {
        let method = request.method.clone();
        let url = request.url.clone();

        let Ok(result) = tokio::time::timeout(timeout, self.client.request(request)).await else {
            tracing::debug!(%method, %url, ?timeout, "Attempt timed out");
            return Outcome::Retryable(Failure::Timeout);
        };

        if let Ok(response) = &result {
            if response.is_success() {
                tracing::debug!(
                    %method,
                    %url,
                    status = %response.status,
                    body = response.body_text().unwrap_or("<binary>"),
                    "Received response"
                );
            }
        }

        let outcome = classify(result);
        if let Outcome::Retryable(Failure::Transport(reason)) = &outcome {
            tracing::info!(%method, %url, %reason, "Request exception");
        }
        outcome
    }
}
