// Path: crates/telemetry/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # daokit Telemetry
//!
//! Structured logging initialization, a Prometheus metrics endpoint, and
//! sink traits that keep instrumented crates independent of the backend.

/// `/metrics` and `/healthz` server.
pub mod http;
/// Global structured logging.
pub mod init;
/// Prometheus implementation of the sinks.
pub mod prometheus;
/// `*MetricsSink` traits and the global sink accessors.
pub mod sinks;
/// RAII request timer.
pub mod time;

pub use sinks::{error_metrics, proxy_metrics, publish_metrics};
