//! Claim, Scope, Confidence, HalfLife, and Claim Graph (spec §3, §4.7-§4.9).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{ts, ts_opt, StatusLight, TruthType};

/// The jurisdiction/applicability window a claim is scoped to.
///
/// Resolves Open Question "what fields does Scope carry" (SPEC_FULL §5.2):
/// domain is mandatory, everything else narrows it further.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    pub domain: String,
    #[serde(default)]
    pub jurisdiction: Option<String>,
    #[serde(with = "ts")]
    pub valid_from: DateTime<Utc>,
    #[serde(default, with = "ts_opt")]
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub context_tags: Vec<String>,
}

impl Scope {
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        at >= self.valid_from && self.valid_until.map_or(true, |until| at <= until)
    }

    /// Two scopes overlap iff they share a domain and their validity
    /// windows intersect (used when detecting claim conflicts).
    pub fn overlaps(&self, other: &Scope) -> bool {
        if self.domain != other.domain {
            return false;
        }
        let self_end = self.valid_until.unwrap_or(DateTime::<Utc>::MAX_UTC);
        let other_end = other.valid_until.unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.valid_from <= other_end && other.valid_from <= self_end
    }
}

/// `confidence{score, explanation}` (spec §3, Claim).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confidence {
    pub score: f64,
    #[serde(default)]
    pub explanation: String,
}

impl Confidence {
    pub fn new(score: f64, explanation: impl Into<String>) -> Self {
        Self {
            score: score.clamp(0.0, 1.0),
            explanation: explanation.into(),
        }
    }
}

/// Half-life unit (spec §3, `halfLife{value,unit,...}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HalfLifeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl HalfLifeUnit {
    pub fn as_millis(self, value: i64) -> i64 {
        let factor = match self {
            HalfLifeUnit::Seconds => 1_000,
            HalfLifeUnit::Minutes => 60_000,
            HalfLifeUnit::Hours => 3_600_000,
            HalfLifeUnit::Days => 86_400_000,
        };
        value * factor
    }
}

/// `halfLife{value,unit,expiresAt,refreshTrigger}` (spec §3, Claim).
/// `value == 0` denotes a perpetual half-life, legal only for
/// `norm`/`constraint` claims (spec §4.9, §8 boundary behaviors).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HalfLife {
    pub value: i64,
    pub unit: HalfLifeUnit,
    #[serde(with = "ts")]
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub refresh_trigger: Option<String>,
}

impl HalfLife {
    pub fn is_perpetual(&self) -> bool {
        self.value == 0
    }

    pub fn half_life_ms(&self) -> i64 {
        self.unit.as_millis(self.value)
    }

    /// Exponential decay: `confidence(t) = confidence0 * 0.5^(elapsed / half_life)`.
    /// Perpetual half-lives never decay.
    pub fn decay(&self, confidence0: f64, elapsed_ms: i64) -> f64 {
        if self.is_perpetual() || elapsed_ms <= 0 {
            return confidence0;
        }
        let ratio = elapsed_ms as f64 / self.half_life_ms() as f64;
        confidence0 * 0.5_f64.powf(ratio)
    }
}

/// `graph{dependsOn[],contradicts[],supersedes?,patches[],supports[]}`
/// (spec §3, Claim).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimGraphEdges {
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub contradicts: Vec<String>,
    #[serde(default)]
    pub supersedes: Option<String>,
    #[serde(default)]
    pub patches: Vec<String>,
    #[serde(default)]
    pub supports: Vec<String>,
}

/// A claim: a scoped, confidence-weighted assertion backed by evidence and
/// subject to quorum/correlation rules (spec §3, Claim).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// `"CLAIM-YYYY-NNNN"`.
    pub claim_id: String,
    /// Single testable sentence, `>= 10` chars.
    pub statement: String,
    pub scope: Scope,
    pub truth_type: TruthType,
    pub confidence: Confidence,
    /// Derived; see [`super::common::StatusLight`] and §4.4 rules.
    #[serde(default)]
    pub status_light: Option<StatusLight>,
    pub sources: Vec<String>,
    pub evidence: Vec<String>,
    pub owner: String,
    #[serde(with = "ts")]
    pub timestamp_created: DateTime<Utc>,
    /// Semver string, bumped on every `supersede`.
    pub version: String,
    pub half_life: HalfLife,
    #[serde(default)]
    pub graph: ClaimGraphEdges,
    #[serde(default)]
    pub seal: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ClaimValidationError {
    #[error("statement must be at least 10 characters")]
    StatementTooShort,
    #[error("perpetual half-life only allowed for norm/constraint claims, got {0:?}")]
    PerpetualHalfLifeNotAllowed(TruthType),
    #[error("claim must cite at least one source")]
    NoSources,
    #[error("claim must cite at least one evidence node")]
    NoEvidence,
}

impl Claim {
    pub fn validate(&self) -> Result<(), ClaimValidationError> {
        if self.statement.trim().chars().count() < 10 {
            return Err(ClaimValidationError::StatementTooShort);
        }
        if self.half_life.is_perpetual() && !self.truth_type.allows_perpetual_half_life() {
            return Err(ClaimValidationError::PerpetualHalfLifeNotAllowed(
                self.truth_type,
            ));
        }
        if self.sources.is_empty() {
            return Err(ClaimValidationError::NoSources);
        }
        if self.evidence.is_empty() {
            return Err(ClaimValidationError::NoEvidence);
        }
        Ok(())
    }

    /// Decays `confidence.score` from `timestamp_created` to `at`.
    pub fn decayed_confidence(&self, at: DateTime<Utc>) -> f64 {
        let elapsed_ms = (at - self.timestamp_created).num_milliseconds();
        self.half_life.decay(self.confidence.score, elapsed_ms)
    }

    pub fn is_expired_at(&self, at: DateTime<Utc>) -> bool {
        !self.half_life.is_perpetual() && at > self.half_life.expires_at
    }
}

/// The full claim lattice: every claim known to a node, addressable by id
/// (spec §4.7, Claim Lattice — C7). Edges live inline on each claim's
/// `graph` field; this type is the lookup/traversal surface over them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimGraph {
    pub claims: Vec<Claim>,
}

impl ClaimGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, claim_id: &str) -> Option<&Claim> {
        self.claims.iter().find(|c| c.claim_id == claim_id)
    }

    pub fn contradictions_of<'a>(&'a self, claim_id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.claims.iter().flat_map(move |c| {
            if c.claim_id == claim_id {
                c.graph.contradicts.iter().map(String::as_str).collect::<Vec<_>>()
            } else if c.graph.contradicts.iter().any(|id| id == claim_id) {
                vec![c.claim_id.as_str()]
            } else {
                vec![]
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_scope() -> Scope {
        Scope {
            domain: "finance".into(),
            jurisdiction: None,
            valid_from: Utc::now() - Duration::days(1),
            valid_until: None,
            context_tags: vec![],
        }
    }

    fn sample_claim(truth_type: TruthType, half_life_value: i64) -> Claim {
        let now = Utc::now();
        Claim {
            claim_id: "CLAIM-2026-0001".into(),
            statement: "interest rates rose last quarter".into(),
            scope: sample_scope(),
            truth_type,
            confidence: Confidence::new(0.9, "initial"),
            status_light: None,
            sources: vec!["S1".into()],
            evidence: vec!["E1".into()],
            owner: "node-a".into(),
            timestamp_created: now,
            version: "1.0.0".into(),
            half_life: HalfLife {
                value: half_life_value,
                unit: HalfLifeUnit::Hours,
                expires_at: now + Duration::hours(24),
                refresh_trigger: None,
            },
            graph: ClaimGraphEdges::default(),
            seal: None,
        }
    }

    #[test]
    fn perpetual_half_life_rejected_for_observation() {
        let claim = sample_claim(TruthType::Observation, 0);
        assert!(matches!(
            claim.validate(),
            Err(ClaimValidationError::PerpetualHalfLifeNotAllowed(_))
        ));
    }

    #[test]
    fn perpetual_half_life_allowed_for_constraint() {
        let claim = sample_claim(TruthType::Constraint, 0);
        assert!(claim.validate().is_ok());
    }

    #[test]
    fn short_statement_rejected() {
        let mut claim = sample_claim(TruthType::Observation, 6);
        claim.statement = "too short".into();
        assert!(matches!(
            claim.validate(),
            Err(ClaimValidationError::StatementTooShort)
        ));
    }

    #[test]
    fn decay_halves_at_half_life() {
        let hl = HalfLife {
            value: 1,
            unit: HalfLifeUnit::Seconds,
            expires_at: Utc::now(),
            refresh_trigger: None,
        };
        let v = hl.decay(1.0, 1000);
        assert!((v - 0.5).abs() < 1e-9);
    }

    #[test]
    fn perpetual_never_decays() {
        let hl = HalfLife {
            value: 0,
            unit: HalfLifeUnit::Seconds,
            expires_at: Utc::now(),
            refresh_trigger: None,
        };
        assert_eq!(hl.decay(0.8, 1_000_000), 0.8);
    }

    #[test]
    fn scopes_overlap_requires_same_domain() {
        let a = sample_scope();
        let mut b = sample_scope();
        b.domain = "health".into();
        assert!(!a.overlaps(&b));
    }
}
