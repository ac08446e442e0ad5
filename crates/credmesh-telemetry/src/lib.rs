#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo
    )
)]

//! Structured logging, Prometheus metrics, and sinks shared across the
//! Credibility Mesh node.

pub mod http;
pub mod init;
pub mod prometheus;
pub mod sinks;
pub mod time;

pub use sinks::{credibility_metrics, drift_metrics, error_metrics, ledger_metrics, replication_metrics};
