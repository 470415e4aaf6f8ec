//! The persisted record of one pending relay attempt.
//!
//! A [`RetryEnvelope`] is created when the first delivery attempt fails and
//! travels through the delay queue until the request is delivered or
//! abandoned. Only its delay ever changes.

use serde::{Deserialize, Serialize};
use serde_with::base64::Base64;
use serde_with::serde_as;
use thiserror::Error;

use crate::relay::{HttpRequest, RetryPolicy, carries_body, is_relayed_method};

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;

/// Current wire format version.
///
/// Increment this when making breaking changes to the format.
/// Payloads carrying any other version are rejected.
pub const ENVELOPE_VERSION: u32 = 1;

/// Errors from encoding, decoding, or replaying an envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Failed to serialize the envelope.
    #[error("Failed to encode envelope: {0}")]
    Encode(#[source] serde_json::Error),

    /// The payload is not a well-formed envelope.
    #[error("Malformed envelope: {0}")]
    Malformed(String),

    /// The payload uses a wire format this build does not understand.
    #[error("Unsupported envelope version {0} (expected {ENVELOPE_VERSION})")]
    UnsupportedVersion(u32),

    /// The stored destination or method cannot form a request.
    #[error("Envelope cannot be replayed: {0}")]
    Unreplayable(String),
}

/// On-the-wire representation.
///
/// Kept separate from [`RetryEnvelope`] so the version tag never leaks into
/// the in-memory type. The body is base64 so the encoded size stays close to
/// the body size.
#[serde_as]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEnvelope {
    version: u32,
    destination: String,
    method: String,
    #[serde_as(as = "Option<Base64>")]
    body: Option<Vec<u8>>,
    delay_seconds: f64,
}

/// One pending relay attempt.
///
/// `destination`, `method` and `body` are fixed at construction and have no
/// setters. `delay_seconds` only moves forward through [`reschedule`].
///
/// [`reschedule`]: RetryEnvelope::reschedule
#[derive(Debug, Clone, PartialEq)]
pub struct RetryEnvelope {
    destination: String,
    method: String,
    body: Option<Vec<u8>>,
    delay_seconds: f64,
}

impl RetryEnvelope {
    /// Creates an envelope for a failed first attempt.
    ///
    /// The body is dropped for GET and HEAD, which never carry one.
    #[must_use]
    pub fn new(
        destination: impl Into<String>,
        method: &http::Method,
        body: Option<Vec<u8>>,
        delay_seconds: f64,
    ) -> Self {
        Self {
            destination: destination.into(),
            method: method.as_str().to_string(),
            body: body.filter(|_| carries_body(method)),
            delay_seconds,
        }
    }

    /// The absolute target URI, exactly as received.
    #[must_use]
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// The HTTP verb token.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The original request body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// The current backoff delay in seconds.
    #[must_use]
    pub const fn delay_seconds(&self) -> f64 {
        self.delay_seconds
    }

    /// Doubles the delay if the policy still allows another retry.
    ///
    /// Returns the new delay, or `None` (leaving the envelope untouched)
    /// when the doubled delay would reach the backoff cap.
    pub fn reschedule(&mut self, policy: &RetryPolicy) -> Option<f64> {
        let next = policy.next_delay(self.delay_seconds)?;
        self.delay_seconds = next;
        Some(next)
    }

    /// Rebuilds the outbound request this envelope stands for.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Unreplayable`] if the destination is not an
    /// absolute URI or the method is not a relayed verb.
    pub fn to_request(&self) -> Result<HttpRequest, EnvelopeError> {
        let url = url::Url::parse(&self.destination).map_err(|e| {
            EnvelopeError::Unreplayable(format!("destination '{}': {e}", self.destination))
        })?;

        let method = http::Method::from_bytes(self.method.as_bytes())
            .ok()
            .filter(is_relayed_method)
            .ok_or_else(|| {
                EnvelopeError::Unreplayable(format!("unsupported method '{}'", self.method))
            })?;

        let mut request = HttpRequest::new(method, url);
        if carries_body(&request.method) {
            request.body = Some(self.body.clone().unwrap_or_default());
        }
        Ok(request)
    }

    /// Serializes to the versioned JSON wire format.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Encode`] if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        let wire = WireEnvelope {
            version: ENVELOPE_VERSION,
            destination: self.destination.clone(),
            method: self.method.clone(),
            body: self.body.clone(),
            delay_seconds: self.delay_seconds,
        };
        serde_json::to_vec(&wire).map_err(EnvelopeError::Encode)
    }

    /// Parses a payload produced by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [`EnvelopeError::Malformed`] for invalid JSON or a delay that is
    ///   not a positive finite number
    /// - [`EnvelopeError::UnsupportedVersion`] for any other version tag
    pub fn from_bytes(payload: &[u8]) -> Result<Self, EnvelopeError> {
        let wire: WireEnvelope =
            serde_json::from_slice(payload).map_err(|e| EnvelopeError::Malformed(e.to_string()))?;

        if wire.version != ENVELOPE_VERSION {
            return Err(EnvelopeError::UnsupportedVersion(wire.version));
        }

        if !(wire.delay_seconds.is_finite() && wire.delay_seconds > 0.0) {
            return Err(EnvelopeError::Malformed(format!(
                "delaySeconds must be a positive number, got {}",
                wire.delay_seconds
            )));
        }

        Ok(Self {
            destination: wire.destination,
            method: wire.method,
            body: wire.body,
            delay_seconds: wire.delay_seconds,
        })
    }
}
