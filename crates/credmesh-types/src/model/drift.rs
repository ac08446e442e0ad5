//! Drift Signal (spec §3, §4.11-§4.12 — C11/C12).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{ts, StatusLight};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftType {
    Time,
    Freshness,
    Fallback,
    Bypass,
    Verify,
    Outcome,
    Fanout,
    Contention,
    Contradiction,
    StaleReference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedPatchType {
    DteChange,
    TtlChange,
    CacheBundleChange,
    RoutingChange,
    VerificationChange,
    ActionScopeTighten,
    ManualReview,
}

/// `fingerprint{key,version}` (spec §3, Drift Signal). `key` is a stable
/// hash of `{driftType, normalized-evidence-signature}`, used to deduplicate
/// recurring drift of the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub key: String,
    pub version: u32,
}

/// `{driftId, episodeId, driftType, severity, detectedAt, evidenceRefs[],
/// recommendedPatchType, fingerprint{key,version}, notes?}` (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftSignal {
    pub drift_id: String,
    pub episode_id: String,
    pub drift_type: DriftType,
    pub severity: StatusLight,
    #[serde(with = "ts")]
    pub detected_at: DateTime<Utc>,
    pub evidence_refs: Vec<String>,
    pub recommended_patch_type: RecommendedPatchType,
    pub fingerprint: Fingerprint,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A proposed additive correction emitted by the Patch & Re-seal Engine
/// (C12). Patches never mutate a sealed episode; they create a new
/// episode version that `supersedes` the original (spec §4.12, §3
/// lifecycles).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    pub patch_id: String,
    pub drift_id: String,
    pub patch_type: RecommendedPatchType,
    pub description: String,
    #[serde(with = "ts")]
    pub proposed_at: DateTime<Utc>,
    pub supersedes_episode_id: String,
    /// How to undo this patch if it turns out to be wrong.
    pub rollback_plan: String,
    /// Signed estimate of how much this patch should move the credibility
    /// index, checked post-apply against the actual delta (spec §4.12).
    pub expected_ci_impact: f64,
    #[serde(default)]
    pub applied: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_roundtrips_through_json() {
        let f = Fingerprint {
            key: "sha256:abc".into(),
            version: 1,
        };
        let s = serde_json::to_string(&f).unwrap();
        let back: Fingerprint = serde_json::from_str(&s).unwrap();
        assert_eq!(f, back);
    }
}
