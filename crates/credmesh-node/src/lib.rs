#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo
    )
)]

//! Process wiring and the query API for one Credibility Mesh node
//! (spec §5, §6): the crate that assembles every component crate behind
//! [`state::NodeState`] and serves it over axum.

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod state;

pub mod prelude {
    pub use crate::api::{router as api_router, snapshot_signals, ApiError, Role};
    pub use crate::clock::Clock;
    pub use crate::config::{ClockMode, CryptoBackend, NodeConfig};
    pub use crate::state::NodeState;
}
