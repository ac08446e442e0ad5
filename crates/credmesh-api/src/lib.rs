//! # credmesh-api
//!
//! Shared error kinds and the process-wide lifecycle registry for the
//! Distributed Credibility Mesh core. Every other crate in the workspace
//! depends on this one for its error surface; this crate depends on
//! nothing internal, mirroring the teacher kernel's `api` crate sitting at
//! the bottom of the dependency graph.
#![cfg_attr(
    not(test),
    deny(clippy::unwrap_used, clippy::expect_used, clippy::panic, clippy::todo)
)]

pub mod error;
pub mod registry;

pub mod prelude {
    pub use crate::error::{CmResult, CredMeshError, ErrorKind};
    pub use crate::registry::{slots, LifecycleRegistry};
}
