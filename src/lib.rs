//! retry-relay: HTTP relay with durable exponential-backoff retries
//!
//! A library for forwarding inbound requests to third-party targets and
//! replaying the ones that fail through a delay queue until they are
//! delivered or the backoff cap is reached.

pub mod config;
pub mod envelope;
pub mod queue;
pub mod relay;
pub mod service;
pub mod time;

#[cfg(test)]
mod test_fixtures;
