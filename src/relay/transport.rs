//! HTTP request/response types and client trait.

use std::sync::Arc;

use super::HttpError;

/// HTTP verbs accepted for relaying.
pub const RELAYED_METHODS: [http::Method; 7] = [
    http::Method::DELETE,
    http::Method::GET,
    http::Method::HEAD,
    http::Method::OPTIONS,
    http::Method::POST,
    http::Method::PUT,
    http::Method::TRACE,
];

/// Returns true if the method is one of [`RELAYED_METHODS`].
#[must_use]
pub fn is_relayed_method(method: &http::Method) -> bool {
    RELAYED_METHODS.contains(method)
}

/// Returns true if requests with this method forward a body.
///
/// GET and HEAD requests never carry a body.
#[must_use]
pub fn carries_body(method: &http::Method) -> bool {
    *method != http::Method::GET && *method != http::Method::HEAD
}

/// An outbound HTTP request to a relay target.
///
/// This is a value type that can be constructed and passed to any
/// [`HttpClient`] implementation. The body is opaque and forwarded verbatim.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method (GET, POST, PUT, DELETE, etc.)
    pub method: http::Method,
    /// Target URL
    pub url: url::Url,
    /// Optional request body
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Creates a new HTTP request with the given method and URL.
    ///
    /// The body is `None`.
    #[must_use]
    pub const fn new(method: http::Method, url: url::Url) -> Self {
        Self {
            method,
            url,
            body: None,
        }
    }

    /// Creates a GET request to the given URL.
    #[must_use]
    pub const fn get(url: url::Url) -> Self {
        Self::new(http::Method::GET, url)
    }

    /// Creates a POST request to the given URL.
    #[must_use]
    pub const fn post(url: url::Url) -> Self {
        Self::new(http::Method::POST, url)
    }

    /// Sets the request body.
    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }
}

/// An HTTP response received from a relay target.
///
/// The body is fully buffered into memory.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: http::StatusCode,
    /// Response body (fully buffered)
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a new HTTP response.
    #[must_use]
    pub const fn new(status: http::StatusCode, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    /// Returns true if the status code indicates success (2xx).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the body as a UTF-8 string, if valid.
    #[must_use]
    pub fn body_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}

/// Trait for making HTTP requests.
///
/// # Design
///
/// This trait abstracts the shared transport handle, enabling:
/// - Dependency injection for testing with mock clients
/// - Swapping HTTP libraries without changing calling code
/// - One pooled client owned by the process and cloned into every consumer
///
/// # Example
///
/// ```ignore
/// use retry_relay::relay::{HttpClient, HttpRequest, HttpResponse, HttpError};
///
/// struct MockClient {
///     response: HttpResponse,
/// }
///
/// impl HttpClient for MockClient {
///     async fn request(&self, _req: HttpRequest) -> Result<HttpResponse, HttpError> {
///         Ok(self.response.clone())
///     }
/// }
/// ```
pub trait HttpClient: Send + Sync {
    /// Sends an HTTP request and returns the response.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] when:
    /// - Network connection fails ([`HttpError::Connection`])
    /// - Request times out ([`HttpError::Timeout`])
    /// - The transport rejects the request before sending ([`HttpError::InvalidUrl`])
    fn request(
        &self,
        req: HttpRequest,
    ) -> impl std::future::Future<Output = Result<HttpResponse, HttpError>> + Send;
}

impl<T: HttpClient> HttpClient for Arc<T> {
    fn request(
        &self,
        req: HttpRequest,
    ) -> impl std::future::Future<Output = Result<HttpResponse, HttpError>> + Send {
        (**self).request(req)
    }
}
