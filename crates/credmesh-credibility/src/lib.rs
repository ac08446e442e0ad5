#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo
    )
)]

//! Credibility Index Scorer (C10): a composite 0-100 institutional trust
//! score computed from a signed scoring policy and a lattice snapshot.

pub mod error;
pub mod policy;
pub mod scorer;

pub mod prelude {
    pub use crate::policy::{drift_severity_weight, ComponentWeights, CredibilityBand, ScoringPolicy};
    pub use crate::scorer::{compute_score, ComponentContributions, CredibilityScore, SnapshotSignals};
}
