//! Shared test fixtures: scripted transports, controllable clocks, local targets.

use std::net::SocketAddr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};

use tokio::net::TcpListener;

use crate::relay::{HttpClient, HttpError, HttpRequest, HttpResponse};
use crate::time::Clock;

type Responder = Box<dyn Fn(&HttpRequest) -> Result<HttpResponse, HttpError> + Send + Sync>;

/// Mock HTTP client driven by a responder closure.
///
/// Records every request it receives so tests can assert on what was sent.
pub struct MockClient {
    responder: Responder,
    delay: Option<Duration>,
    requests: Mutex<Vec<HttpRequest>>,
    call_count: AtomicUsize,
}

impl MockClient {
    pub fn new(
        responder: impl Fn(&HttpRequest) -> Result<HttpResponse, HttpError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            delay: None,
            requests: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Always answers with the given status and an empty body.
    pub fn status(status: http::StatusCode) -> Self {
        Self::new(move |_| Ok(HttpResponse::new(status, vec![])))
    }

    pub fn ok() -> Self {
        Self::status(http::StatusCode::OK)
    }

    pub fn server_error() -> Self {
        Self::status(http::StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Always fails with a transport-level rejection.
    pub fn invalid() -> Self {
        Self::new(|_| Err(HttpError::InvalidUrl("URL scheme is not allowed".to_string())))
    }

    /// Always fails with a connection error.
    pub fn refused() -> Self {
        Self::new(|_| {
            Err(HttpError::Connection(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))))
        })
    }

    /// Waits `delay` before answering.
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn captured_requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpClient for MockClient {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let result = (self.responder)(&req);
        self.requests.lock().unwrap().push(req);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

/// Mock clock with millisecond resolution that only moves when told to.
pub struct MockClock {
    millis: AtomicU64,
}

impl MockClock {
    pub fn new(initial_secs: u64) -> Self {
        Self {
            millis: AtomicU64::new(initial_secs * 1000),
        }
    }

    pub fn advance(&self, by: Duration) {
        let millis = u64::try_from(by.as_millis()).unwrap();
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for MockClock {
    fn now(&self) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

/// Serves `router` on an ephemeral local port and returns its address.
pub async fn spawn_target(router: axum::Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Returns a local address that nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Production client that bypasses any proxy configured in the environment.
pub fn local_client() -> crate::relay::ReqwestClient {
    let client = crate::relay::ReqwestClient::builder()
        .no_proxy()
        .build()
        .unwrap();
    crate::relay::ReqwestClient::from_client(client)
}
