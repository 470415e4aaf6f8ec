//! Inbound HTTP trigger: `ANY <prefix><absolute-uri>`.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use tower_http::trace::TraceLayer;

use crate::queue::DelayQueue;
use crate::relay::HttpClient;

use super::{InboundRequest, IngressHandler};

/// Default routing prefix stripped from inbound paths.
pub const DEFAULT_PREFIX: &str = "/r/";

/// Default limit on inbound body size (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared state behind every inbound request.
#[derive(Debug)]
pub struct RelayState<H, Q> {
    ingress: IngressHandler<H, Q>,
    prefix: String,
    max_body_bytes: usize,
}

impl<H, Q> RelayState<H, Q> {
    /// Creates the state with the default prefix and body limit.
    #[must_use]
    pub fn new(ingress: IngressHandler<H, Q>) -> Self {
        Self {
            ingress,
            prefix: DEFAULT_PREFIX.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Sets the routing prefix. It should start and end with `/`.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the largest inbound body accepted.
    #[must_use]
    pub const fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }
}

/// Builds the router serving every path through the relay handler.
pub fn router<H, Q>(state: Arc<RelayState<H, Q>>) -> Router
where
    H: HttpClient + 'static,
    Q: DelayQueue + 'static,
{
    Router::new()
        .fallback(relay_handler::<H, Q>)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn relay_handler<H, Q>(
    State(state): State<Arc<RelayState<H, Q>>>,
    request: Request<Body>,
) -> Response
where
    H: HttpClient + 'static,
    Q: DelayQueue + 'static,
{
    let (parts, body) = request.into_parts();

    let path_and_query = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path(), |pq| pq.as_str());

    let Some(target) = path_and_query.strip_prefix(state.prefix.as_str()) else {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    };
    let target = target.to_string();

    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes.to_vec(),
        Err(e) => {
            tracing::debug!(error = %e, "Failed to read request body");
            let message = format!("Request body exceeds {} bytes", state.max_body_bytes);
            return (StatusCode::PAYLOAD_TOO_LARGE, message).into_response();
        }
    };

    tracing::info!(method = %parts.method, %target, "Received request");

    let response = state
        .ingress
        .handle(InboundRequest::new(parts.method, target, body))
        .await;

    (response.status(), response.message()).into_response()
}
