//! Claim Lattice (C7, spec §4.7): typed edges, contradiction detection,
//! and status-light recomputation.

use chrono::{DateTime, Utc};

use credmesh_ledger::status_light::StatusLightPolicy;
use credmesh_types::model::{Claim, ClaimGraph, StatusLight};

use crate::quorum::{evaluate_quorum, AgreeingSource, QuorumOutcome, QuorumRequirement};

/// Emitted when a claim's agreeing-source count drops below `K` and it
/// flips to `UNKNOWN` — "honest" because the mesh refuses to report a
/// confidence it can no longer back with quorum (spec §4.7).
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimFlip {
    pub claim_id: String,
    pub from: Option<StatusLight>,
    pub reason: String,
    pub at: DateTime<Utc>,
}

/// Per-claim recompute input: the sources currently agreeing with it plus
/// whatever the policy needs to derive green/yellow/red.
pub struct RecomputeInput<'a> {
    pub claim: &'a Claim,
    pub agreeing_sources: Vec<AgreeingSource>,
    pub requirement: QuorumRequirement,
    pub has_high_reliability_source: bool,
    pub sources_mixed_reliability: bool,
}

pub struct RecomputeResult {
    pub claim_id: String,
    /// `None` exactly when the claim flips to UNKNOWN (no status light).
    pub status: Option<StatusLight>,
    pub flip: Option<ClaimFlip>,
}

/// Re-derives `statusLight` for one claim, honoring quorum honesty (spec
/// §8.7: below-quorum claims MUST report UNKNOWN, never a stale light).
pub fn recompute_status(
    input: &RecomputeInput,
    policy: &StatusLightPolicy,
    graph: &ClaimGraph,
    at: DateTime<Utc>,
) -> RecomputeResult {
    let outcome = evaluate_quorum(&input.agreeing_sources, input.requirement);
    let broken_reason = match outcome {
        QuorumOutcome::Unknown { reason } => Some(reason),
        QuorumOutcome::RegionConcentration { region, share } => Some(format!(
            "correlation group {region} holds {:.0}% of agreeing sources, exceeding the 40% authority cap",
            share * 100.0
        )),
        QuorumOutcome::Met => None,
    };

    if let Some(reason) = broken_reason {
        return RecomputeResult {
            claim_id: input.claim.claim_id.clone(),
            status: None,
            flip: Some(ClaimFlip {
                claim_id: input.claim.claim_id.clone(),
                from: input.claim.status_light,
                reason,
                at,
            }),
        };
    }

    let has_unresolved_contradiction = !graph
        .contradictions_of(&input.claim.claim_id)
        .collect::<Vec<_>>()
        .is_empty();

    let confidence = input.claim.decayed_confidence(at);
    let status = policy.derive(
        confidence,
        input.has_high_reliability_source,
        input.sources_mixed_reliability,
        has_unresolved_contradiction,
    );

    RecomputeResult {
        claim_id: input.claim.claim_id.clone(),
        status: Some(status),
        flip: None,
    }
}

/// Two claims contradict only if their scopes overlap; contradictions can
/// only be resolved by superseding one side (spec §4.7).
pub fn detects_contradiction(a: &Claim, b: &Claim) -> bool {
    a.scope.overlaps(&b.scope) && a.claim_id != b.claim_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quorum::TierRequirement;
    use credmesh_types::model::{Confidence, HalfLife, HalfLifeUnit, Scope, Tier, TruthType};

    fn sample_claim(id: &str) -> Claim {
        let now = Utc::now();
        Claim {
            claim_id: id.into(),
            statement: "rates rose last quarter".into(),
            scope: Scope {
                domain: "finance".into(),
                jurisdiction: None,
                valid_from: now - chrono::Duration::days(1),
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
                value: 0,
                unit: HalfLifeUnit::Hours,
                expires_at: now + chrono::Duration::hours(1),
                refresh_trigger: None,
            },
            graph: Default::default(),
            seal: None,
        }
    }

    #[test]
    fn below_quorum_flips_to_unknown_status_none() {
        let claim = sample_claim("CLAIM-2026-0001");
        let graph = ClaimGraph { claims: vec![claim.clone()] };
        let input = RecomputeInput {
            claim: &claim,
            agreeing_sources: vec![],
            requirement: QuorumRequirement {
                n: 4,
                k: 3,
                min_correlation_groups: 2,
                requires_tier0: TierRequirement::Required,
            },
            has_high_reliability_source: true,
            sources_mixed_reliability: false,
        };
        let result = recompute_status(&input, &StatusLightPolicy::default(), &graph, Utc::now());
        assert!(result.status.is_none());
        assert!(result.flip.is_some());
    }

    #[test]
    fn met_quorum_with_contradiction_caps_at_red() {
        let mut claim = sample_claim("CLAIM-2026-0001");
        claim.graph.contradicts.push("CLAIM-2026-0002".into());
        let other = {
            let mut c = sample_claim("CLAIM-2026-0002");
            c.graph.contradicts.push("CLAIM-2026-0001".into());
            c
        };
        let graph = ClaimGraph { claims: vec![claim.clone(), other] };

        let input = RecomputeInput {
            claim: &claim,
            agreeing_sources: vec![AgreeingSource {
                source_id: "S1".into(),
                correlation_group: "g1".into(),
                tier: Tier::Tier2,
            }],
            requirement: QuorumRequirement {
                n: 1,
                k: 1,
                min_correlation_groups: 1,
                requires_tier0: TierRequirement::NotRequired,
            },
            has_high_reliability_source: true,
            sources_mixed_reliability: false,
        };
        let result = recompute_status(&input, &StatusLightPolicy::default(), &graph, Utc::now());
        assert_eq!(result.status, Some(StatusLight::Red));
    }
}
