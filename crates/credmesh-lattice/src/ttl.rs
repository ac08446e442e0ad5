//! TTL / Half-Life Manager (C9, spec §4.9).

use chrono::{DateTime, Duration, Utc};

use credmesh_types::model::{Claim, EvidenceNode, StatusLight, Tier};

/// Per-tier evidence TTL defaults (spec §4.9: Tier-0 minutes-hours, Tier-1
/// hours-1d, Tier-2 1-7d, Tier-3 1-30d). Each default sits at the low end
/// of its tier's stated range.
pub fn default_evidence_ttl(tier: Tier) -> Duration {
    match tier {
        Tier::Tier0 => Duration::minutes(30),
        Tier::Tier1 => Duration::hours(6),
        Tier::Tier2 => Duration::days(1),
        Tier::Tier3 => Duration::days(1),
    }
}

/// Watermark stall threshold: no event_time progress for this long triggers
/// `SignalLoss` (spec §4.9).
pub const WATERMARK_STALL_THRESHOLD: Duration = Duration::minutes(5);

/// Per-source monotonically nondecreasing high-water mark of fully
/// acknowledged evidence `event_time`.
#[derive(Debug, Clone)]
pub struct SourceWatermark {
    pub source_id: String,
    pub high_water_event_time: DateTime<Utc>,
    pub observed_at: DateTime<Utc>,
}

impl SourceWatermark {
    /// Advances the watermark; silently ignores regressions (the watermark
    /// is monotonic by definition).
    pub fn advance(&mut self, evidence: &EvidenceNode, now: DateTime<Utc>) {
        if evidence.event_time > self.high_water_event_time {
            self.high_water_event_time = evidence.event_time;
        }
        self.observed_at = now;
    }

    pub fn is_stalled(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.observed_at) > WATERMARK_STALL_THRESHOLD
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshTrigger {
    Expiry,
    Contradiction,
    NewSource,
    Schedule,
    Other(String),
}

impl RefreshTrigger {
    pub fn from_label(label: &str) -> Self {
        match label {
            "expiry" => Self::Expiry,
            "contradiction" => Self::Contradiction,
            "new_source" => Self::NewSource,
            "schedule" => Self::Schedule,
            other => Self::Other(other.to_string()),
        }
    }
}

/// The outcome of one decay step against a claim (spec §4.9 lifecycle):
/// after a half-life, confidence halves and `statusLight` must be
/// re-derived by the caller using the new confidence.
#[derive(Debug, Clone, PartialEq)]
pub struct DecayStep {
    pub claim_id: String,
    pub decayed_confidence: f64,
    pub is_expired: bool,
}

pub fn decay_step(claim: &Claim, at: DateTime<Utc>) -> DecayStep {
    DecayStep {
        claim_id: claim.claim_id.clone(),
        decayed_confidence: claim.decayed_confidence(at),
        is_expired: claim.is_expired_at(at),
    }
}

/// Helper for the status-light derivation: a red/yellow status can itself
/// be a `refreshTrigger` candidate (expiry or contradiction), per the
/// lifecycle note in spec §3/§4.9.
pub fn implied_refresh_trigger(status: StatusLight, is_expired: bool) -> Option<RefreshTrigger> {
    if is_expired {
        return Some(RefreshTrigger::Expiry);
    }
    if status == StatusLight::Red {
        return Some(RefreshTrigger::Contradiction);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use credmesh_types::model::{
        Confidence, HalfLife, HalfLifeUnit, Scope, TruthType,
    };

    fn sample_claim() -> Claim {
        let now = Utc::now();
        Claim {
            claim_id: "CLAIM-2026-0001".into(),
            statement: "rates rose last quarter".into(),
            scope: Scope {
                domain: "finance".into(),
                jurisdiction: None,
                valid_from: now - Duration::days(1),
                valid_until: None,
                context_tags: vec![],
            },
            truth_type: TruthType::Observation,
            confidence: Confidence::new(0.9, "seed"),
            status_light: None,
            sources: vec!["S1".into()],
            evidence: vec!["E1".into()],
            owner: "node-a".into(),
            timestamp_created: now,
            version: "1.0.0".into(),
            half_life: HalfLife {
                value: 1,
                unit: HalfLifeUnit::Hours,
                expires_at: now + Duration::hours(1),
                refresh_trigger: None,
            },
            graph: Default::default(),
            seal: None,
        }
    }

    #[test]
    fn decay_step_halves_confidence_after_one_half_life() {
        let claim = sample_claim();
        let step = decay_step(&claim, claim.timestamp_created + Duration::hours(1));
        assert!((step.decayed_confidence - 0.45).abs() < 1e-9);
    }

    #[test]
    fn watermark_stall_detected_after_threshold() {
        let now = Utc::now();
        let mut wm = SourceWatermark {
            source_id: "S1".into(),
            high_water_event_time: now - Duration::minutes(10),
            observed_at: now - Duration::minutes(10),
        };
        assert!(wm.is_stalled(now));
        wm.observed_at = now;
        assert!(!wm.is_stalled(now));
    }
}
