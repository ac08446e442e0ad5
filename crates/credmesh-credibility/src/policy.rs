//! Scoring policy (spec §4.10): component weights are signals with
//! direction, not fixed coefficients — every score embeds the policy's
//! hash so a verifier can tell which weights produced it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentWeights {
    pub tier_weighted_integrity: f64,
    pub drift_penalty: f64,
    pub correlation_risk: f64,
    pub quorum_margin_compression: f64,
    pub ttl_expiration: f64,
    pub independent_confirmation_bonus: f64,
}

impl Default for ComponentWeights {
    fn default() -> Self {
        Self {
            tier_weighted_integrity: 20.0,
            drift_penalty: 1.0,
            correlation_risk: 8.0,
            quorum_margin_compression: 6.0,
            ttl_expiration: 0.5,
            independent_confirmation_bonus: 1.0,
        }
    }
}

/// Signed artifact: weights, the confidence floor used by the integrity
/// component, and a version tag. Hashing this lets two nodes agree they
/// scored a snapshot under the same rules (spec §4.10).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub policy_version: String,
    pub weights: ComponentWeights,
    pub integrity_confidence_threshold: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            policy_version: "1.0.0".into(),
            weights: ComponentWeights::default(),
            integrity_confidence_threshold: 0.80,
        }
    }
}

impl ScoringPolicy {
    pub fn hash(&self) -> String {
        credmesh_types::canonical::canonical_hash(self)
            .unwrap_or_else(|_| "sha256:unhashable-policy".to_string())
    }
}

/// Severity weight used by the drift-penalty component (spec §4.10 table).
pub fn drift_severity_weight(status: credmesh_types::model::StatusLight) -> f64 {
    use credmesh_types::model::StatusLight;
    match status {
        StatusLight::Green => 0.01,
        StatusLight::Yellow => 0.5,
        StatusLight::Red => 3.0,
    }
}

/// Score bands (spec §4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredibilityBand {
    Stable,
    MinorDrift,
    ElevatedRisk,
    StructuralDegradation,
    Compromised,
}

impl CredibilityBand {
    pub fn for_score(score: f64) -> Self {
        if score >= 95.0 {
            Self::Stable
        } else if score >= 85.0 {
            Self::MinorDrift
        } else if score >= 70.0 {
            Self::ElevatedRisk
        } else if score >= 50.0 {
            Self::StructuralDegradation
        } else {
            Self::Compromised
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_match_spec_boundaries() {
        assert_eq!(CredibilityBand::for_score(100.0), CredibilityBand::Stable);
        assert_eq!(CredibilityBand::for_score(95.0), CredibilityBand::Stable);
        assert_eq!(CredibilityBand::for_score(94.9), CredibilityBand::MinorDrift);
        assert_eq!(CredibilityBand::for_score(85.0), CredibilityBand::MinorDrift);
        assert_eq!(CredibilityBand::for_score(84.9), CredibilityBand::ElevatedRisk);
        assert_eq!(CredibilityBand::for_score(70.0), CredibilityBand::ElevatedRisk);
        assert_eq!(CredibilityBand::for_score(69.9), CredibilityBand::StructuralDegradation);
        assert_eq!(CredibilityBand::for_score(50.0), CredibilityBand::StructuralDegradation);
        assert_eq!(CredibilityBand::for_score(49.9), CredibilityBand::Compromised);
    }

    #[test]
    fn policy_hash_is_stable_for_equal_policies() {
        let a = ScoringPolicy::default();
        let b = ScoringPolicy::default();
        assert_eq!(a.hash(), b.hash());
    }
}
