//! Drift Detector (C11, spec §4.11): severity derivation, fingerprinting,
//! and recurrence tracking over sealed episodes and lattice state.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use credmesh_types::canonical::canonical_hash;
use credmesh_types::model::{DriftType, Fingerprint, RecommendedPatchType, StatusLight};

/// Bumped whenever the fingerprinting rule changes, so old fingerprints
/// don't silently collide with new ones (spec §4.11).
pub const ALGORITHM_VERSION: u32 = 1;

/// Recurrence window for the `DRT-001` trigger (spec §4.11: "repeats >= 3x
/// in 14 days").
pub const RECURRENCE_WINDOW: Duration = Duration::days(14);
pub const RECURRENCE_THRESHOLD: u32 = 3;

/// Raw observation feeding severity derivation. Not every field applies to
/// every `DriftType`; each derivation function reads only what it needs.
#[derive(Debug, Clone, Default)]
pub struct DriftObservation {
    pub deadline_ms: Option<i64>,
    pub actual_ms: Option<i64>,
    pub ttl_exceeded_while_used: bool,
    pub is_tier0: bool,
    pub verify_failures: u32,
    pub hard_fail: bool,
}

/// `time`: green within deadline, yellow <= 1.25x over, red otherwise.
pub fn time_severity(deadline_ms: i64, actual_ms: i64) -> StatusLight {
    if actual_ms <= deadline_ms {
        StatusLight::Green
    } else if (actual_ms as f64) <= deadline_ms as f64 * 1.25 {
        StatusLight::Yellow
    } else {
        StatusLight::Red
    }
}

/// `freshness`: yellow if TTL exceeded while in use, red if Tier-0
/// evidence went stale.
pub fn freshness_severity(ttl_exceeded_while_used: bool, is_tier0_stale: bool) -> StatusLight {
    if is_tier0_stale {
        StatusLight::Red
    } else if ttl_exceeded_while_used {
        StatusLight::Yellow
    } else {
        StatusLight::Green
    }
}

/// `verify`: yellow on a single failure, red on Tier-0 or repeated failure.
pub fn verify_severity(failures: u32, is_tier0: bool) -> StatusLight {
    if failures == 0 {
        StatusLight::Green
    } else if is_tier0 || failures > 1 {
        StatusLight::Red
    } else {
        StatusLight::Yellow
    }
}

/// Generic fallback for drift types the spec leaves as "e.g." (fallback,
/// bypass, outcome, fanout, contention, contradiction, stale_reference):
/// a hard failure is always red, a Tier-0 involvement escalates a
/// borderline observation to red, otherwise any observed drift is yellow.
pub fn generic_severity(observation: &DriftObservation) -> StatusLight {
    if observation.hard_fail {
        return StatusLight::Red;
    }
    if observation.is_tier0 {
        return StatusLight::Red;
    }
    StatusLight::Yellow
}

pub fn derive_severity(drift_type: DriftType, observation: &DriftObservation) -> StatusLight {
    match drift_type {
        DriftType::Time => match (observation.deadline_ms, observation.actual_ms) {
            (Some(deadline), Some(actual)) => time_severity(deadline, actual),
            _ => generic_severity(observation),
        },
        DriftType::Freshness => {
            freshness_severity(observation.ttl_exceeded_while_used, observation.is_tier0)
        }
        DriftType::Verify => verify_severity(observation.verify_failures, observation.is_tier0),
        _ => generic_severity(observation),
    }
}

/// Per-`driftType` recommended patch table (spec §4.11).
pub fn recommended_patch_type(drift_type: DriftType) -> RecommendedPatchType {
    match drift_type {
        DriftType::Time => RecommendedPatchType::DteChange,
        DriftType::Freshness => RecommendedPatchType::TtlChange,
        DriftType::Fallback => RecommendedPatchType::CacheBundleChange,
        DriftType::Bypass => RecommendedPatchType::ManualReview,
        DriftType::Verify => RecommendedPatchType::VerificationChange,
        DriftType::Outcome => RecommendedPatchType::ManualReview,
        DriftType::Fanout => RecommendedPatchType::ActionScopeTighten,
        DriftType::Contention => RecommendedPatchType::RoutingChange,
        DriftType::Contradiction => RecommendedPatchType::RoutingChange,
        DriftType::StaleReference => RecommendedPatchType::TtlChange,
    }
}

/// `fp.key = sha256_canonical({driftType, minimized-evidence-signature,
/// algorithmVersion})[:8]` (spec §4.11).
pub fn fingerprint(drift_type: DriftType, minimized_evidence_signature: &str) -> Fingerprint {
    let material = serde_json::json!({
        "driftType": drift_type,
        "minimizedEvidenceSignature": minimized_evidence_signature,
        "algorithmVersion": ALGORITHM_VERSION,
    });
    let full = canonical_hash(&material).unwrap_or_default();
    let short = full
        .strip_prefix("sha256:")
        .unwrap_or(&full)
        .chars()
        .take(8)
        .collect();
    Fingerprint {
        key: short,
        version: ALGORITHM_VERSION,
    }
}

/// Tracks how often a fingerprint recurs, deduplicating repeat signals
/// while preserving the recurrence count needed by `DRT-001`.
#[derive(Debug, Default)]
pub struct RecurrenceTracker {
    events: HashMap<String, Vec<DateTime<Utc>>>,
}

impl RecurrenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an occurrence and returns the recurrence count within the
    /// trailing 14-day window (inclusive of this occurrence).
    pub fn record(&mut self, fingerprint_key: &str, at: DateTime<Utc>) -> u32 {
        let entries = self.events.entry(fingerprint_key.to_string()).or_default();
        entries.push(at);
        entries.retain(|t| at.signed_duration_since(*t) <= RECURRENCE_WINDOW);
        entries.len() as u32
    }

    /// `DRT-001`: fingerprint repeats >= 3x within 14 days.
    pub fn triggers_delegation_review(&self, fingerprint_key: &str, at: DateTime<Utc>) -> bool {
        self.events
            .get(fingerprint_key)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|t| at.signed_duration_since(**t) <= RECURRENCE_WINDOW)
                    .count() as u32
                    >= RECURRENCE_THRESHOLD
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_severity_thresholds() {
        assert_eq!(time_severity(1000, 900), StatusLight::Green);
        assert_eq!(time_severity(1000, 1200), StatusLight::Yellow);
        assert_eq!(time_severity(1000, 1300), StatusLight::Red);
    }

    #[test]
    fn verify_single_failure_is_yellow_tier0_is_red() {
        assert_eq!(verify_severity(1, false), StatusLight::Yellow);
        assert_eq!(verify_severity(1, true), StatusLight::Red);
        assert_eq!(verify_severity(2, false), StatusLight::Red);
    }

    #[test]
    fn fingerprint_is_deterministic_and_eight_chars() {
        let a = fingerprint(DriftType::Verify, "E1,E2");
        let b = fingerprint(DriftType::Verify, "E1,E2");
        assert_eq!(a, b);
        assert_eq!(a.key.len(), 8);
    }

    #[test]
    fn recurrence_triggers_drt_001_on_third_occurrence_within_window() {
        let mut tracker = RecurrenceTracker::new();
        let base = Utc::now();
        tracker.record("fp1", base);
        tracker.record("fp1", base + Duration::days(1));
        assert!(!tracker.triggers_delegation_review("fp1", base + Duration::days(1)));
        tracker.record("fp1", base + Duration::days(2));
        assert!(tracker.triggers_delegation_review("fp1", base + Duration::days(2)));
    }

    #[test]
    fn recurrence_outside_window_does_not_count() {
        let mut tracker = RecurrenceTracker::new();
        let base = Utc::now();
        tracker.record("fp1", base);
        tracker.record("fp1", base + Duration::days(20));
        tracker.record("fp1", base + Duration::days(21));
        assert!(!tracker.triggers_delegation_review("fp1", base + Duration::days(21)));
    }
}
