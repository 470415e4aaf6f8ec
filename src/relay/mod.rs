//! Outbound relay layer: one-shot delivery attempts against third-party targets.
//!
//! This module provides types and traits for:
//! - Building outbound requests ([`HttpRequest`])
//! - Inspecting target responses ([`HttpResponse`])
//! - Abstracting the shared transport ([`HttpClient`])
//! - Production transport implementation ([`ReqwestClient`])
//! - Single-attempt forwarding with a bounded wait ([`Forwarder`], [`Outcome`])
//! - Backoff arithmetic and request timeouts ([`RetryPolicy`])

mod client;
mod error;
mod forwarder;
mod retry;
mod transport;

#[cfg(test)]
mod transport_tests;

pub use client::{ReqwestClient, USER_AGENT};
pub use error::HttpError;
pub use forwarder::{Failure, Forwarder, Outcome, classify};
pub use transport::{
    HttpClient, HttpRequest, HttpResponse, RELAYED_METHODS, carries_body, is_relayed_method,
};
pub use retry::RetryPolicy;
