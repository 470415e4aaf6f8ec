//! Relay services wired around the relay core.
//!
//! This module provides:
//! - The first delivery attempt and hand-off to the queue ([`IngressHandler`])
//! - Replay of due envelopes with exponential backoff ([`RetryScheduler`])
//! - The background consumer of the local queue ([`RetryWorker`])
//! - The inbound HTTP trigger ([`router`], [`RelayState`])
//!
//! ```text
//! caller -> router -> IngressHandler -> Forwarder --ok--> 200
//!                                          |
//!                                       failure -> DelayQueue
//!                                                      |
//!                     RetryWorker <- (delay elapses) <-+
//!                          |
//!                   RetryScheduler -> Forwarder --ok--> done
//!                                          |
//!                                       failure -> DelayQueue (delay doubled)
//! ```

mod ingress;
mod scheduler;
mod server;
mod worker;


pub use ingress::{DEFAULT_MAX_ENVELOPE_BYTES, InboundRequest, IngressHandler, IngressResponse};
pub use scheduler::{AbandonReason, RetryOutcome, RetryScheduler, SchedulerError};
pub use server::{DEFAULT_MAX_BODY_BYTES, DEFAULT_PREFIX, RelayState, router};
pub use worker::{DEFAULT_MAX_CONCURRENT, RetryWorker};
