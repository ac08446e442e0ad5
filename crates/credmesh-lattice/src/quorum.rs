//! Quorum & Correlation Engine (C8, spec §4.7).

use credmesh_types::model::Tier;

/// `{N, K, min_correlation_groups, requires_tier0}` per claim.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuorumRequirement {
    pub n: u32,
    pub k: u32,
    pub min_correlation_groups: u32,
    pub requires_tier0: TierRequirement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierRequirement {
    Required,
    Recommended,
    NotRequired,
}

/// Per-tier defaults (spec §4.7).
pub fn default_requirement(tier: Tier) -> QuorumRequirement {
    match tier {
        Tier::Tier0 => QuorumRequirement {
            n: 4,
            k: 3,
            min_correlation_groups: 2,
            requires_tier0: TierRequirement::Required,
        },
        Tier::Tier1 => QuorumRequirement {
            n: 3,
            k: 2,
            min_correlation_groups: 2,
            requires_tier0: TierRequirement::Recommended,
        },
        Tier::Tier2 | Tier::Tier3 => QuorumRequirement {
            n: 2,
            k: 1,
            min_correlation_groups: 1,
            requires_tier0: TierRequirement::NotRequired,
        },
    }
}

/// An agreeing source, for quorum evaluation.
#[derive(Debug, Clone)]
pub struct AgreeingSource {
    pub source_id: String,
    pub correlation_group: String,
    pub tier: Tier,
}

/// Maximum share of agreeing sources any single correlation group ("region")
/// may hold (spec §4.7: "max authority per region 40%").
pub const MAX_AUTHORITY_PER_REGION: f64 = 0.40;

#[derive(Debug, Clone, PartialEq)]
pub enum QuorumOutcome {
    /// Quorum honesty invariant holds; claim status may be derived normally.
    Met,
    /// `accepting_sources < K` or `distinct_correlation_groups < min_required`
    /// — claim MUST flip to UNKNOWN regardless of confidence (spec §8.7).
    Unknown { reason: String },
    /// A single correlation group exceeds the 40% authority cap; quorum is
    /// broken even if `K`/group-count numerically pass.
    RegionConcentration { region: String, share: f64 },
}

/// Evaluates whether `sources` satisfy `requirement` (spec §4.7, §8.7
/// quorum honesty).
pub fn evaluate_quorum(sources: &[AgreeingSource], requirement: QuorumRequirement) -> QuorumOutcome {
    let accepting = sources.len() as u32;
    let distinct_groups: std::collections::HashSet<&str> =
        sources.iter().map(|s| s.correlation_group.as_str()).collect();

    if accepting < requirement.k {
        return QuorumOutcome::Unknown {
            reason: format!("accepting_sources {accepting} < K {}", requirement.k),
        };
    }
    if (distinct_groups.len() as u32) < requirement.min_correlation_groups {
        return QuorumOutcome::Unknown {
            reason: format!(
                "distinct_correlation_groups {} < min_required {}",
                distinct_groups.len(),
                requirement.min_correlation_groups
            ),
        };
    }
    if requirement.requires_tier0 == TierRequirement::Required
        && !sources.iter().any(|s| s.tier == Tier::Tier0)
    {
        return QuorumOutcome::Unknown {
            reason: "requires_tier0 but no tier-0 source agrees".into(),
        };
    }

    if !sources.is_empty() {
        let mut counts: std::collections::HashMap<&str, u32> = std::collections::HashMap::new();
        for s in sources {
            *counts.entry(s.correlation_group.as_str()).or_insert(0) += 1;
        }
        let total = sources.len() as f64;
        if let Some((&region, &count)) = counts.iter().max_by_key(|(_, c)| **c) {
            let share = count as f64 / total;
            if share > MAX_AUTHORITY_PER_REGION {
                return QuorumOutcome::RegionConcentration {
                    region: region.to_string(),
                    share,
                };
            }
        }
    }

    QuorumOutcome::Met
}

/// How close a claim is to losing quorum, for the credibility scorer's
/// "quorum margin compression" penalty (spec §4.10): `N - K`, floor 0.
pub fn quorum_margin(accepting_sources: u32, requirement: QuorumRequirement) -> u32 {
    accepting_sources.saturating_sub(requirement.k)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(id: &str, group: &str, tier: Tier) -> AgreeingSource {
        AgreeingSource {
            source_id: id.into(),
            correlation_group: group.into(),
            tier,
        }
    }

    #[test]
    fn tier0_requires_four_sources_three_agreeing_two_groups_and_a_tier0_source() {
        let req = default_requirement(Tier::Tier0);
        assert_eq!(req, QuorumRequirement {
            n: 4,
            k: 3,
            min_correlation_groups: 2,
            requires_tier0: TierRequirement::Required,
        });
    }

    #[test]
    fn below_k_flips_to_unknown() {
        let req = default_requirement(Tier::Tier2);
        let sources = vec![source("s1", "g1", Tier::Tier2)];
        assert!(matches!(evaluate_quorum(&sources, req), QuorumOutcome::Met));

        let req0 = default_requirement(Tier::Tier0);
        let outcome = evaluate_quorum(&sources, req0);
        assert!(matches!(outcome, QuorumOutcome::Unknown { .. }));
    }

    #[test]
    fn region_concentration_above_40_percent_breaks_quorum() {
        let req = QuorumRequirement {
            n: 5,
            k: 2,
            min_correlation_groups: 1,
            requires_tier0: TierRequirement::NotRequired,
        };
        let sources = vec![
            source("s1", "g1", Tier::Tier2),
            source("s2", "g1", Tier::Tier2),
            source("s3", "g1", Tier::Tier2),
            source("s4", "g2", Tier::Tier2),
        ];
        let outcome = evaluate_quorum(&sources, req);
        assert!(matches!(outcome, QuorumOutcome::RegionConcentration { .. }));
    }
}
