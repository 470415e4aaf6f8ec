//! Error types for outbound HTTP operations.

use thiserror::Error;

/// Error type for transport-level failures.
///
/// Describes what went wrong without dictating recovery strategy.
/// The [`Forwarder`](super::Forwarder) reduces these to an [`Outcome`](super::Outcome).
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network connection failed.
    ///
    /// This includes DNS resolution failures, connection refused,
    /// resets, and errors while reading the response body.
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request timed out inside the transport.
    #[error("Request timed out")]
    Timeout,

    /// The transport refused to build the request.
    ///
    /// Raised before anything is sent, e.g. for an unsupported URL scheme.
    /// This is a permanent failure, not a transient one.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
