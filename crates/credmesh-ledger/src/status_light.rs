//! Status Light derivation for claims (spec §4.4, used by §4.7).
//!
//! Two thresholds appear in the source material: `confidence >= 0.80` and
//! an implicit higher bar. This module implements the stricter reading —
//! green requires both the confidence floor AND a tier-0/1 active source
//! AND zero unresolved contradictions — and records the policy actually
//! applied as [`StatusLightPolicy::hash`], embedded in every derived score
//! so a verifier can tell which threshold a given light used.

use credmesh_types::model::StatusLight;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusLightPolicy {
    pub green_confidence_floor: f64,
    pub yellow_confidence_floor: f64,
}

impl Default for StatusLightPolicy {
    fn default() -> Self {
        Self {
            green_confidence_floor: 0.80,
            yellow_confidence_floor: 0.50,
        }
    }
}

impl StatusLightPolicy {
    pub fn hash(&self) -> String {
        credmesh_types::canonical::sha256_text(&format!(
            "{:.4}:{:.4}",
            self.green_confidence_floor, self.yellow_confidence_floor
        ))
    }

    /// `green` iff `confidence >= floor` AND at least one high-reliability
    /// source AND no unresolved contradiction; `yellow` iff
    /// `yellow_floor <= confidence < green_floor` OR sources are of mixed
    /// reliability; `red` otherwise, and a contradiction always forces at
    /// most yellow (never green), per the structural rule policy packs may
    /// not override (spec §4.4).
    pub fn derive(
        &self,
        confidence: f64,
        has_high_reliability_source: bool,
        sources_mixed_reliability: bool,
        has_unresolved_contradiction: bool,
    ) -> StatusLight {
        if has_unresolved_contradiction || confidence < self.yellow_confidence_floor {
            return StatusLight::Red;
        }
        if confidence >= self.green_confidence_floor
            && has_high_reliability_source
            && !sources_mixed_reliability
        {
            return StatusLight::Green;
        }
        StatusLight::Yellow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn green_requires_all_three_conditions() {
        let policy = StatusLightPolicy::default();
        assert_eq!(
            policy.derive(0.9, true, false, false),
            StatusLight::Green
        );
    }

    #[test]
    fn contradiction_forces_at_most_yellow() {
        let policy = StatusLightPolicy::default();
        // High confidence and a good source, but an unresolved
        // contradiction must still prevent green.
        assert_eq!(policy.derive(0.99, true, false, true), StatusLight::Red);
    }

    #[test]
    fn low_confidence_is_red() {
        let policy = StatusLightPolicy::default();
        assert_eq!(policy.derive(0.3, true, false, false), StatusLight::Red);
    }

    #[test]
    fn mixed_reliability_caps_at_yellow() {
        let policy = StatusLightPolicy::default();
        assert_eq!(policy.derive(0.95, true, true, false), StatusLight::Yellow);
    }
}
