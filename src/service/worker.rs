//! Background loop that feeds due envelopes to the retry scheduler.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::queue::{DelayQueue, Delivery, LocalQueue};
use crate::relay::HttpClient;
use crate::time::{Clock, SystemClock};

use super::{RetryOutcome, RetryScheduler};

/// Default limit on retries processed at the same time.
pub const DEFAULT_MAX_CONCURRENT: u32 = 16;

/// Consumes due deliveries from a [`LocalQueue`] and runs each through the
/// [`RetryScheduler`] on its own task.
///
/// A delivery is acknowledged once the scheduler has finished with it,
/// whatever the outcome. If rescheduling fails the delivery is left alone
/// and the queue hands it out again after the lease, so every envelope is
/// processed at least once and possibly more than once.
///
/// # Type Parameters
///
/// - `H`: The shared transport
/// - `Q`: The queue the scheduler reschedules into (usually the same [`LocalQueue`])
/// - `C`: The queue's clock (defaults to [`SystemClock`])
#[derive(Debug)]
pub struct RetryWorker<H, Q, C = SystemClock> {
    scheduler: Arc<RetryScheduler<H, Q>>,
    queue: Arc<LocalQueue<C>>,
    max_concurrent: u32,
}

impl<H, Q, C> RetryWorker<H, Q, C> {
    /// Creates a worker with the default concurrency limit.
    #[must_use]
    pub const fn new(scheduler: Arc<RetryScheduler<H, Q>>, queue: Arc<LocalQueue<C>>) -> Self {
        Self {
            scheduler,
            queue,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }

    /// Sets how many deliveries may be processed at the same time.
    ///
    /// # Panics
    ///
    /// Panics if `limit` is zero, since no delivery could ever be processed.
    #[must_use]
    pub const fn with_max_concurrent(mut self, limit: u32) -> Self {
        assert!(limit > 0, "max_concurrent must be positive");
        self.max_concurrent = limit;
        self
    }
}

impl<H, Q, C> RetryWorker<H, Q, C>
where
    H: HttpClient + 'static,
    Q: DelayQueue + 'static,
    C: Clock + 'static,
{
    /// Processes deliveries until `shutdown` completes.
    ///
    /// On shutdown no new delivery is taken; deliveries already being
    /// processed are awaited before this returns.
    pub async fn run(self, shutdown: impl Future<Output = ()> + Send) {
        let permits = Arc::new(Semaphore::new(self.max_concurrent as usize));
        tokio::pin!(shutdown);

        tracing::info!(max_concurrent = self.max_concurrent, "Retry worker started");

        loop {
            let permit = tokio::select! {
                biased;
                () = &mut shutdown => break,
                permit = Arc::clone(&permits).acquire_owned() => permit,
            };
            // Only fails once the semaphore is closed, which never happens here
            let Ok(permit) = permit else { break };

            let delivery = tokio::select! {
                biased;
                () = &mut shutdown => break,
                delivery = self.queue.receive() => delivery,
            };

            let scheduler = Arc::clone(&self.scheduler);
            let queue = Arc::clone(&self.queue);
            tokio::spawn(async move {
                process_delivery(&scheduler, &queue, delivery).await;
                drop(permit);
            });
        }

        // Wait for in-flight deliveries
        let _all = permits.acquire_many(self.max_concurrent).await;
        tracing::info!("Retry worker stopped");
    }
}

async fn process_delivery<H, Q, C>(
    scheduler: &RetryScheduler<H, Q>,
    queue: &LocalQueue<C>,
    delivery: Delivery,
) where
    H: HttpClient,
    Q: DelayQueue,
    C: Clock,
{
    let Delivery {
        id,
        payload,
        delivery_count,
    } = delivery;

    if delivery_count > 1 {
        tracing::debug!(id, delivery_count, "Processing redelivered envelope");
    }

    match scheduler.process(&payload).await {
        Ok(outcome) => {
            if let RetryOutcome::Dropped(reason) = &outcome {
                tracing::warn!(id, %reason, "Dropped message");
            }
            if let Err(e) = queue.ack(id).await {
                tracing::warn!(id, error = %e, "Failed to acknowledge message");
            }
        }
        Err(e) => {
            tracing::error!(
                id,
                delivery_count,
                error = %e,
                "Retry not rescheduled, message will be redelivered"
            );
        }
    }
}
