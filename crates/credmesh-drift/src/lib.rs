#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo
    )
)]

//! Drift detector and patch & re-seal engine (C11-C12).

pub mod detector;
pub mod error;
pub mod patch_engine;

pub mod prelude {
    pub use crate::detector::{
        derive_severity, fingerprint, freshness_severity, recommended_patch_type, time_severity,
        verify_severity, DriftObservation, RecurrenceTracker, ALGORITHM_VERSION,
        RECURRENCE_THRESHOLD, RECURRENCE_WINDOW,
    };
    pub use crate::patch_engine::{
        apply_patch, approval_gate_for, propose_patch, ApprovalGate, ApprovalRole, ApprovalState,
    };
}
