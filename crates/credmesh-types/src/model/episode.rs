//! Sealed DecisionEpisode and its hash-scope commit (spec §3, §4.14).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::ts;

/// Decision Log Record: what was decided.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dlr {
    pub decision_id: String,
    pub summary: String,
    pub claim_ids: Vec<String>,
}

/// Reflection Session: aggregated episode summary (what happened, what
/// degraded).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectionSession {
    pub narrative: String,
    pub degradations: Vec<String>,
}

/// Drift summary bundled into a sealed episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriftSummary {
    pub drift_ids: Vec<String>,
}

/// Memory-graph diff produced while sealing an episode: nodes/edges added
/// relative to the prior episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryGraphDiff {
    pub added_node_ids: Vec<String>,
    pub added_edge_descriptions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputHash {
    pub path: String,
    pub sha256: String,
}

/// `hash_scope` carried in a seal packet (spec §4.14). `commit_hash` is
/// `sha256_canonical(hash_scope)`; identical inputs + identical `clock`
/// MUST reproduce it exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashScope {
    pub inputs: Vec<InputHash>,
    pub prompts: Vec<String>,
    pub policies: Vec<String>,
    pub schemas: Vec<String>,
    pub parameters: HashScopeParameters,
    /// Fields intentionally excluded from the commit hash, e.g.
    /// `observed_at`, `artifacts_emitted`.
    pub exclusions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashScopeParameters {
    #[serde(with = "ts")]
    pub clock: DateTime<Utc>,
    pub deterministic_mode: bool,
}

/// Bundles DLR + RS + DS + MG-diff under one `episode_id`. Sealing freezes
/// the entire bundle; corrections are additive via new episode versions
/// carrying `supersedes_episode_id` (spec §3, Sealed DecisionEpisode).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SealedDecisionEpisode {
    pub episode_id: String,
    pub dlr: Dlr,
    pub reflection: ReflectionSession,
    pub drift_summary: DriftSummary,
    pub memory_diff: MemoryGraphDiff,
    pub hash_scope: HashScope,
    pub commit_hash: String,
    #[serde(with = "ts")]
    pub sealed_at: DateTime<Utc>,
    pub hash_chain: String,
    pub version: u32,
    #[serde(default)]
    pub supersedes_episode_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn episode_serializes_without_panicking() {
        let ep = SealedDecisionEpisode {
            episode_id: "ep-001".into(),
            dlr: Dlr {
                decision_id: "D1".into(),
                summary: "approved".into(),
                claim_ids: vec!["CLAIM-2026-0001".into()],
            },
            reflection: ReflectionSession {
                narrative: "nominal".into(),
                degradations: vec![],
            },
            drift_summary: DriftSummary::default(),
            memory_diff: MemoryGraphDiff::default(),
            hash_scope: HashScope {
                inputs: vec![],
                prompts: vec![],
                policies: vec![],
                schemas: vec![],
                parameters: HashScopeParameters {
                    clock: Utc::now(),
                    deterministic_mode: true,
                },
                exclusions: vec!["observed_at".into(), "artifacts_emitted".into()],
            },
            commit_hash: "sha256:abc".into(),
            sealed_at: Utc::now(),
            hash_chain: "sha256:chain".into(),
            version: 1,
            supersedes_episode_id: None,
        };
        assert!(serde_json::to_string(&ep).is_ok());
    }
}
