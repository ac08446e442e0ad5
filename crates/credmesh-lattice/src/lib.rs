#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo
    )
)]

//! Claim lattice, quorum/correlation engine, and TTL/half-life manager
//! (C7-C9).

pub mod error;
pub mod lattice;
pub mod quorum;
pub mod ttl;

pub mod prelude {
    pub use crate::lattice::{detects_contradiction, recompute_status, ClaimFlip, RecomputeInput, RecomputeResult};
    pub use crate::quorum::{
        default_requirement, evaluate_quorum, quorum_margin, AgreeingSource, QuorumOutcome,
        QuorumRequirement, TierRequirement, MAX_AUTHORITY_PER_REGION,
    };
    pub use crate::ttl::{
        decay_step, default_evidence_ttl, implied_refresh_trigger, DecayStep, RefreshTrigger,
        SourceWatermark, WATERMARK_STALL_THRESHOLD,
    };
}
