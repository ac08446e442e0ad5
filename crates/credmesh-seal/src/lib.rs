#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo
    )
)]

//! Episode sealing, transparency log, and admissibility pack verification (C14).

pub mod admissibility;
pub mod episode;
pub mod error;
pub mod transparency_log;

pub mod prelude {
    pub use crate::admissibility::{
        abp_all_checks_pass, AdmissibilityCheck, AdmissibilityReport, CheckResult, ExitCode, Pack,
        verify_pack,
    };
    pub use crate::episode::{commit_hash, seal_episode, verify_commit_hash, EPISODE_CHAIN_GENESIS};
    pub use crate::transparency_log::{TransparencyLog, TransparencyLogEntry, LOG_GENESIS};
}
