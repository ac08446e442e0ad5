//! Credibility Index Scorer (C10, spec §4.10): composite 0-100 score from
//! six weighted components, deterministic given a lattice snapshot and a
//! declared scoring policy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use credmesh_types::model::StatusLight;

use crate::policy::{drift_severity_weight, CredibilityBand, ScoringPolicy};

/// Raw per-component signals, computed by the caller from a lattice
/// snapshot (claims, drift signals, quorum state). Kept separate from the
/// scorer itself so the scorer stays a pure function of its inputs.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSignals {
    /// `(tier, claims_meeting_confidence_floor, total_claims_in_tier)` per tier.
    pub tier_integrity: Vec<(u8, u32, u32)>,
    /// Active drift signal status lights, one entry per active signal;
    /// `tier0_dependent_fanout` is how many dependent claims a Tier-0 drift
    /// cascades through (0 for non-Tier-0 drift).
    pub active_drift: Vec<(StatusLight, u32)>,
    /// Max source fan-out observed for any single source, and the largest
    /// single-region share of agreeing sources across active claims (0-1).
    pub max_source_fanout: u32,
    pub max_region_share: f64,
    /// `(accepting_sources, k)` per claim currently near its quorum floor.
    pub quorum_margins: Vec<(u32, u32)>,
    /// `(count_past_ttl, avg_ms_past_ttl)`.
    pub ttl_expired: (u32, i64),
    /// `(independent_sources, correlation_groups)` per claim, for the
    /// confirmation bonus.
    pub confirmations: Vec<(u32, u32)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentContributions {
    pub tier_weighted_integrity: f64,
    pub drift_penalty: f64,
    pub correlation_risk: f64,
    pub quorum_margin_compression: f64,
    pub ttl_expiration: f64,
    pub independent_confirmation_bonus: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredibilityScore {
    pub score: f64,
    #[serde(with = "CredibilityBandSerde")]
    pub band: CredibilityBand,
    pub components: ComponentContributions,
    pub policy_hash: String,
    #[serde(with = "credmesh_types::model::common::ts")]
    pub computed_at: DateTime<Utc>,
}

// `CredibilityBand` carries no payload, so a label round-trip is enough;
// kept local rather than deriving Serialize on the enum to leave the band
// labels stable if the bands gain a reordering later.
#[derive(Serialize, Deserialize)]
#[serde(remote = "CredibilityBand", rename_all = "snake_case")]
enum CredibilityBandSerde {
    Stable,
    MinorDrift,
    ElevatedRisk,
    StructuralDegradation,
    Compromised,
}

fn tier_weighted_integrity(signals: &SnapshotSignals) -> f64 {
    if signals.tier_integrity.is_empty() {
        return 1.0;
    }
    let (meeting, total): (u32, u32) = signals
        .tier_integrity
        .iter()
        .fold((0, 0), |(m, t), (_, meeting, total)| (m + meeting, t + total));
    if total == 0 {
        1.0
    } else {
        meeting as f64 / total as f64
    }
}

fn drift_penalty(signals: &SnapshotSignals) -> f64 {
    signals
        .active_drift
        .iter()
        .map(|(status, fanout)| drift_severity_weight(*status) * (1 + fanout) as f64)
        .sum()
}

fn correlation_risk(signals: &SnapshotSignals) -> f64 {
    let fanout_term = (signals.max_source_fanout as f64).ln_1p();
    let concentration_term = signals.max_region_share.powi(2);
    fanout_term + concentration_term * 10.0
}

fn quorum_margin_compression(signals: &SnapshotSignals) -> f64 {
    signals
        .quorum_margins
        .iter()
        .map(|(accepting, k)| {
            let margin = accepting.saturating_sub(*k);
            if margin == 0 {
                3.0
            } else {
                1.0 / margin as f64
            }
        })
        .sum()
}

fn ttl_expiration(signals: &SnapshotSignals) -> f64 {
    let (count, avg_ms_past) = signals.ttl_expired;
    if count == 0 {
        0.0
    } else {
        let hours_past = (avg_ms_past as f64 / 3_600_000.0).max(0.0);
        count as f64 * (1.0 + hours_past)
    }
}

fn independent_confirmation_bonus(signals: &SnapshotSignals) -> f64 {
    signals
        .confirmations
        .iter()
        .map(|(sources, groups)| {
            if *sources >= 3 && *groups >= 3 {
                2.0
            } else if *sources >= 3 && *groups >= 2 {
                1.0
            } else {
                0.0
            }
        })
        .sum()
}

/// Computes the composite score. Deterministic given `signals` and
/// `policy`; `at` is stamped on the result, not used in the math.
pub fn compute_score(signals: &SnapshotSignals, policy: &ScoringPolicy, at: DateTime<Utc>) -> CredibilityScore {
    let w = &policy.weights;

    let components = ComponentContributions {
        tier_weighted_integrity: w.tier_weighted_integrity * tier_weighted_integrity(signals),
        drift_penalty: -(w.drift_penalty * drift_penalty(signals)),
        correlation_risk: -(w.correlation_risk * correlation_risk(signals)),
        quorum_margin_compression: -(w.quorum_margin_compression * quorum_margin_compression(signals)),
        ttl_expiration: -(w.ttl_expiration * ttl_expiration(signals)),
        independent_confirmation_bonus: w.independent_confirmation_bonus
            * independent_confirmation_bonus(signals),
    };

    let base = 80.0;
    let raw = base
        + components.tier_weighted_integrity
        + components.drift_penalty
        + components.correlation_risk
        + components.quorum_margin_compression
        + components.ttl_expiration
        + components.independent_confirmation_bonus;
    let score = raw.clamp(0.0, 100.0);

    CredibilityScore {
        score,
        band: CredibilityBand::for_score(score),
        components,
        policy_hash: policy.hash(),
        computed_at: at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean_signals() -> SnapshotSignals {
        SnapshotSignals {
            tier_integrity: vec![(0, 10, 10)],
            active_drift: vec![],
            max_source_fanout: 1,
            max_region_share: 0.2,
            quorum_margins: vec![(4, 1)],
            ttl_expired: (0, 0),
            confirmations: vec![(3, 3)],
        }
    }

    #[test]
    fn clean_snapshot_scores_stable() {
        let score = compute_score(&clean_signals(), &ScoringPolicy::default(), Utc::now());
        assert_eq!(score.band, CredibilityBand::Stable);
    }

    #[test]
    fn red_drift_strictly_decreases_score() {
        let policy = ScoringPolicy::default();
        let baseline = compute_score(&clean_signals(), &policy, Utc::now());

        let mut degraded = clean_signals();
        degraded.active_drift.push((StatusLight::Red, 0));
        let drifted = compute_score(&degraded, &policy, Utc::now());

        assert!(drifted.score < baseline.score);
    }

    #[test]
    fn zero_quorum_margin_is_severe() {
        let policy = ScoringPolicy::default();
        let mut signals = clean_signals();
        signals.quorum_margins = vec![(1, 1)];
        let score = compute_score(&signals, &policy, Utc::now());
        assert!(score.components.quorum_margin_compression < -1.0);
    }
}
