//! Application execution logic.
//!
//! This module wires the relay together: the shared transport, the delay
//! queue, the inbound server, and the retry worker, and runs them until a
//! shutdown signal arrives.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::oneshot;

use retry_relay::config::ValidatedConfig;
use retry_relay::queue::{LocalQueue, QueueError};
use retry_relay::relay::{Forwarder, ReqwestClient, RetryPolicy};
use retry_relay::service::{IngressHandler, RelayState, RetryScheduler, RetryWorker, router};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// Failed to open the spool directory.
    #[error("Failed to open spool directory: {0}")]
    Spool(#[source] QueueError),

    /// Failed to create the shared HTTP transport.
    #[error("Failed to create HTTP client: {0}")]
    Transport(#[source] reqwest::Error),

    /// Failed to bind the listen address.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// The configured listen address
        addr: SocketAddr,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The inbound server stopped with an error.
    #[error("Server error: {0}")]
    Serve(#[source] io::Error),
}

/// Runs the relay until a shutdown signal (Ctrl+C or SIGTERM).
///
/// This function:
/// 1. Opens the delay queue (spooled or in-memory)
/// 2. Creates the shared HTTP transport
/// 3. Starts the retry worker
/// 4. Serves inbound requests until shutdown
/// 5. Stops the worker once the server has drained
///
/// # Errors
///
/// Returns an error if:
/// - The spool directory cannot be opened
/// - The HTTP transport cannot be created
/// - The listen address cannot be bound
/// - The server fails while running
///
/// # Coverage Note
///
/// This function is excluded from coverage because it requires
/// a real listener and OS signal handling.
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig) -> Result<(), RunError> {
    let queue = Arc::new(open_queue(&config)?);
    let client = ReqwestClient::new().map_err(RunError::Transport)?;

    tracing::info!("Retry schedule: {}", describe_schedule(&config.retry_policy));

    let ingress = IngressHandler::new(
        Forwarder::new(client.clone()),
        Arc::clone(&queue),
        config.retry_policy.clone(),
    )
    .with_max_envelope_bytes(config.max_envelope_bytes);

    let state = RelayState::new(ingress)
        .with_prefix(config.prefix.clone())
        .with_max_body_bytes(config.max_body_bytes);

    let scheduler = RetryScheduler::new(
        Forwarder::new(client),
        Arc::clone(&queue),
        config.retry_policy.clone(),
    );
    let worker = RetryWorker::new(Arc::new(scheduler), Arc::clone(&queue))
        .with_max_concurrent(config.max_concurrent);

    let listener = TcpListener::bind(config.listen)
        .await
        .map_err(|e| RunError::Bind {
            addr: config.listen,
            source: e,
        })?;
    tracing::info!("Listening on {} (prefix {})", config.listen, config.prefix);

    let (stop_worker, worker_stopped) = oneshot::channel::<()>();
    let worker_task = tokio::spawn(worker.run(async {
        let _ = worker_stopped.await;
    }));

    let served = axum::serve(listener, router(Arc::new(state)))
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, stopping...");
        })
        .await;

    // Worker keeps running until the server has drained
    let _ = stop_worker.send(());
    if let Err(e) = worker_task.await {
        tracing::error!("Retry worker failed: {e}");
    }

    if !queue.is_empty() {
        match queue.spool_dir() {
            Some(dir) => tracing::info!(
                "{} pending retries kept in {}",
                queue.len(),
                dir.display()
            ),
            None => tracing::warn!("{} pending retries dropped on exit", queue.len()),
        }
    }

    served.map_err(RunError::Serve)
}

/// Opens the spooled queue if a directory is configured, else an in-memory one.
fn open_queue(config: &ValidatedConfig) -> Result<LocalQueue, RunError> {
    if let Some(ref dir) = config.spool_dir {
        tracing::info!("Spool directory: {}", dir.display());
        LocalQueue::open(dir, config.lease).map_err(RunError::Spool)
    } else {
        tracing::warn!("No spool directory configured, pending retries will not survive a restart");
        Ok(LocalQueue::in_memory(config.lease))
    }
}

/// Renders the retry delays a failed request goes through, for the startup log.
fn describe_schedule(policy: &RetryPolicy) -> String {
    let delays = policy.schedule();
    let rendered: Vec<String> = delays.iter().map(|secs| format!("{secs}s")).collect();
    format!(
        "{} (up to {} retries, abandoned at {}s)",
        rendered.join(", "),
        delays.len(),
        policy.max_retry_delay.as_secs()
    )
}

/// Returns a future that completes when a shutdown signal is received.
///
/// Excluded from coverage - requires OS signal handling.
#[cfg(not(tarpaulin_include))]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
