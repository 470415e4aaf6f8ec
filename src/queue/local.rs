//! In-process delay queue with optional on-disk spool.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;

use crate::time::{Clock, SystemClock, duration_millis};

use super::spool::{Spool, StoredMessage};
use super::{DelayQueue, QueueError};

/// A message handed to a consumer.
///
/// The message stays in the queue, hidden for the lease duration, until it
/// is acknowledged with [`LocalQueue::ack`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Queue-assigned message identifier.
    pub id: u64,
    /// The stored payload.
    pub payload: Vec<u8>,
    /// 1 on first delivery, incremented on every redelivery.
    pub delivery_count: u32,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    messages: BTreeMap<u64, StoredMessage>,
}

/// Delay queue backed by process memory and, optionally, a spool directory.
///
/// Without a spool, pending messages are lost when the process exits.
/// With one, every message is persisted on enqueue and deleted on
/// acknowledgement, so pending retries survive a restart.
///
/// # Type Parameters
///
/// - `C`: The clock used for visibility and expiry (defaults to [`SystemClock`])
#[derive(Debug)]
pub struct LocalQueue<C = SystemClock> {
    state: Mutex<State>,
    notify: Notify,
    clock: C,
    lease: Duration,
    spool: Option<Spool>,
}

impl LocalQueue<SystemClock> {
    /// Creates a queue that keeps messages in memory only.
    ///
    /// `lease` is how long a delivered message stays hidden before it is
    /// handed out again if not acknowledged.
    #[must_use]
    pub fn in_memory(lease: Duration) -> Self {
        Self::from_parts(SystemClock, lease, None, Vec::new())
    }

    /// Opens a queue persisted in `dir`, reloading any pending messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or listed.
    pub fn open(dir: impl Into<PathBuf>, lease: Duration) -> Result<Self, QueueError> {
        let (spool, messages) = Spool::open(dir)?;
        if !messages.is_empty() {
            tracing::info!(
                pending = messages.len(),
                dir = %spool.dir().display(),
                "Reloaded spooled messages"
            );
        }
        Ok(Self::from_parts(SystemClock, lease, Some(spool), messages))
    }
}

impl<C> LocalQueue<C> {
    fn from_parts(
        clock: C,
        lease: Duration,
        spool: Option<Spool>,
        loaded: Vec<StoredMessage>,
    ) -> Self {
        let next_id = loaded.iter().map(|m| m.id + 1).max().unwrap_or(1);
        let messages = loaded.into_iter().map(|m| (m.id, m)).collect();

        Self {
            state: Mutex::new(State { next_id, messages }),
            notify: Notify::new(),
            clock,
            lease,
            spool,
        }
    }

    /// Replaces the clock.
    ///
    /// This is primarily useful for testing with a controllable clock.
    #[must_use]
    pub fn with_clock<C2>(self, clock: C2) -> LocalQueue<C2> {
        LocalQueue {
            state: self.state,
            notify: self.notify,
            clock,
            lease: self.lease,
            spool: self.spool,
        }
    }

    /// Returns the lease duration.
    #[must_use]
    pub const fn lease(&self) -> Duration {
        self.lease
    }

    /// Returns the spool directory, if persistence is enabled.
    #[must_use]
    pub fn spool_dir(&self) -> Option<&Path> {
        self.spool.as_ref().map(Spool::dir)
    }

    /// Returns the number of stored messages, visible or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().messages.len()
    }

    /// Returns true if no messages are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deletes a delivered message so it is never handed out again.
    ///
    /// Acknowledging an unknown or already-acknowledged id is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the spool file could not be deleted. The message
    /// is already gone from memory, but would be reloaded after a restart.
    pub async fn ack(&self, id: u64) -> Result<(), QueueError> {
        let removed = self.lock().messages.remove(&id).is_some();
        match &self.spool {
            Some(spool) if removed => spool.remove(id).await,
            _ => Ok(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // State mutations are single assignments, so a poisoned lock still
        // holds consistent data.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Clock> LocalQueue<C> {
    /// Hands out the next visible message, if any, and leases it.
    ///
    /// Messages past their time-to-live are purged first. Among visible
    /// messages the one that became visible earliest is returned.
    pub async fn try_receive(&self) -> Option<Delivery> {
        let now = self.clock.now_millis();

        let (delivery, expired) = {
            let mut state = self.lock();
            let expired = take_expired(&mut state, now);
            (self.lease_next(&mut state, now), expired)
        };

        // Spool files are deleted after the lock is released
        self.discard_expired(expired).await;
        delivery
    }

    fn lease_next(&self, state: &mut State, now: u64) -> Option<Delivery> {
        let message = state
            .messages
            .values_mut()
            .filter(|m| m.visible_at_ms <= now)
            .min_by_key(|m| (m.visible_at_ms, m.id))?;

        message.visible_at_ms = now.saturating_add(duration_millis(self.lease));
        message.deliveries += 1;

        Some(Delivery {
            id: message.id,
            payload: message.payload.clone(),
            delivery_count: message.deliveries,
        })
    }

    /// Waits for the next visible message and leases it.
    ///
    /// Wakes up when a message's visibility delay elapses or when a new
    /// message is enqueued, whichever comes first.
    pub async fn receive(&self) -> Delivery {
        loop {
            let notified = self.notify.notified();

            if let Some(delivery) = self.try_receive().await {
                return delivery;
            }

            match self.until_next_visible() {
                Some(wait) => {
                    tokio::select! {
                        () = notified => {}
                        () = tokio::time::sleep(wait) => {}
                    }
                }
                None => notified.await,
            }
        }
    }

    /// Time until the earliest hidden message becomes visible.
    fn until_next_visible(&self) -> Option<Duration> {
        let now = self.clock.now_millis();
        self.lock()
            .messages
            .values()
            .map(|m| m.visible_at_ms)
            .min()
            .map(|at| Duration::from_millis(at.saturating_sub(now)))
    }

    async fn discard_expired(&self, expired: Vec<u64>) {
        for id in expired {
            tracing::info!(id, "Dropped message after its time-to-live elapsed");
            if let Some(spool) = &self.spool {
                if let Err(e) = spool.remove(id).await {
                    tracing::warn!(id, error = %e, "Failed to delete expired spool file");
                }
            }
        }
    }
}

/// Removes every message whose time-to-live has elapsed and returns their ids.
fn take_expired(state: &mut State, now: u64) -> Vec<u64> {
    let expired: Vec<u64> = state
        .messages
        .values()
        .filter(|m| m.expires_at_ms <= now)
        .map(|m| m.id)
        .collect();

    for id in &expired {
        state.messages.remove(id);
    }
    expired
}

impl<C: Clock> DelayQueue for LocalQueue<C> {
    async fn enqueue(
        &self,
        payload: Vec<u8>,
        time_to_live: Duration,
        visibility_delay: Duration,
    ) -> Result<(), QueueError> {
        let now = self.clock.now_millis();
        let id = {
            let mut state = self.lock();
            let id = state.next_id;
            state.next_id += 1;
            id
        };

        let message = StoredMessage {
            id,
            payload,
            visible_at_ms: now.saturating_add(duration_millis(visibility_delay)),
            expires_at_ms: now.saturating_add(duration_millis(time_to_live)),
            deliveries: 0,
        };

        if let Some(spool) = &self.spool {
            spool.write(message.clone()).await?;
        }

        self.lock().messages.insert(id, message);
        self.notify.notify_one();

        tracing::debug!(id, ?visibility_delay, ?time_to_live, "Enqueued message");
        Ok(())
    }
}
