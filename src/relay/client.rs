//! Shared outbound transport built on reqwest.

use std::time::Duration;

use super::{HttpClient, HttpError, HttpRequest, HttpResponse};

/// `User-Agent` sent with every relayed request.
pub const USER_AGENT: &str = concat!("retry-relay/", env!("CARGO_PKG_VERSION"));

/// How long an idle pooled connection to a target is kept open.
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// The relay's shared transport.
///
/// Wraps one pooled `reqwest::Client`. Clones share the pool, so a single
/// instance is created at startup and handed to both the ingress path and
/// the retry path. No request timeout is set here: every attempt is bounded
/// by the [`Forwarder`](super::Forwarder) instead.
///
/// # Example
///
/// ```no_run
/// use retry_relay::relay::{HttpClient, HttpRequest, ReqwestClient};
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ReqwestClient::new()?;
/// let url = Url::parse("https://endpoint.example/path")?;
/// let response = client
///     .request(HttpRequest::post(url).with_body(b"abc".to_vec()))
///     .await?;
/// println!("Status: {}", response.status);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    inner: reqwest::Client,
}

impl ReqwestClient {
    /// Creates the transport with the relay's settings.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::builder().build().map(Self::from_client)
    }

    /// Returns a builder preset with the relay's user agent and pool settings.
    ///
    /// Use it to add settings (proxies, certificates) before building a
    /// client for [`from_client`](Self::from_client).
    #[must_use]
    pub fn builder() -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
    }

    /// Wraps an already configured reqwest client.
    #[must_use]
    pub const fn from_client(client: reqwest::Client) -> Self {
        Self { inner: client }
    }
}

impl HttpClient for ReqwestClient {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        let HttpRequest { method, url, body } = req;

        let mut outbound = self.inner.request(method, url.as_str());
        if let Some(body) = body {
            outbound = outbound.body(body);
        }

        let response = outbound.send().await.map_err(send_error)?;
        let status = response.status();

        // A target that hangs up mid-body has not accepted the request
        let body = response
            .bytes()
            .await
            .map_err(|e| HttpError::Connection(Box::new(e)))?;

        Ok(HttpResponse::new(status, body.to_vec()))
    }
}

/// Sorts a failed send into permanent and transient transport errors.
fn send_error(error: reqwest::Error) -> HttpError {
    if error.is_builder() {
        HttpError::InvalidUrl(error.to_string())
    } else if error.is_timeout() {
        HttpError::Timeout
    } else {
        HttpError::Connection(Box::new(error))
    }
}
