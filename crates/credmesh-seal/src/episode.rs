//! Episode sealing (spec §4.14): computes `commit_hash` from `hash_scope`
//! and chains each sealed episode to the previous one via `hash_chain`,
//! the same continuity pattern the authority ledger and seal chain use.

use chrono::{DateTime, Utc};

use credmesh_types::canonical::canonical_hash;
use credmesh_types::model::{Dlr, DriftSummary, HashScope, MemoryGraphDiff, ReflectionSession, SealedDecisionEpisode};

use crate::error::{CmResult, CredMeshError, ErrorKind};

pub const EPISODE_CHAIN_GENESIS: &str = "GENESIS";

/// Computes `commit_hash = sha256_canonical(hash_scope)` (spec §4.14).
/// Determinism invariant: identical inputs + identical `clock` reproduce
/// this exactly, since `hash_scope.parameters.clock` is itself part of the
/// hashed structure.
pub fn commit_hash(hash_scope: &HashScope) -> CmResult<String> {
    canonical_hash(hash_scope).map_err(|e| CredMeshError::new(ErrorKind::InputInvalid, e.to_string()))
}

#[allow(clippy::too_many_arguments)]
pub fn seal_episode(
    episode_id: impl Into<String>,
    dlr: Dlr,
    reflection: ReflectionSession,
    drift_summary: DriftSummary,
    memory_diff: MemoryGraphDiff,
    hash_scope: HashScope,
    version: u32,
    supersedes_episode_id: Option<String>,
    prev_hash_chain: Option<&str>,
    sealed_at: DateTime<Utc>,
) -> CmResult<SealedDecisionEpisode> {
    let commit = commit_hash(&hash_scope)?;
    let chain_basis = serde_json::json!({
        "prev_hash_chain": prev_hash_chain.unwrap_or(EPISODE_CHAIN_GENESIS),
        "commit_hash": commit,
    });
    let hash_chain = canonical_hash(&chain_basis)
        .map_err(|e| CredMeshError::new(ErrorKind::InputInvalid, e.to_string()))?;

    Ok(SealedDecisionEpisode {
        episode_id: episode_id.into(),
        dlr,
        reflection,
        drift_summary,
        memory_diff,
        hash_scope,
        commit_hash: commit,
        sealed_at,
        hash_chain,
        version,
        supersedes_episode_id,
    })
}

/// Re-derives `commit_hash` and checks it against the episode's stored
/// value (used by the admissibility pack's "commit_hash reproducible" and
/// determinism checks).
pub fn verify_commit_hash(episode: &SealedDecisionEpisode) -> CmResult<bool> {
    Ok(commit_hash(&episode.hash_scope)? == episode.commit_hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use credmesh_types::model::{HashScopeParameters, InputHash};

    fn sample_hash_scope(clock: DateTime<Utc>) -> HashScope {
        HashScope {
            inputs: vec![InputHash {
                path: "decision.json".into(),
                sha256: "sha256:abc".into(),
            }],
            prompts: vec![],
            policies: vec![],
            schemas: vec![],
            parameters: HashScopeParameters {
                clock,
                deterministic_mode: true,
            },
            exclusions: vec!["observed_at".into(), "artifacts_emitted".into()],
        }
    }

    #[test]
    fn same_inputs_and_clock_reproduce_commit_hash() {
        let clock = Utc::now();
        let a = commit_hash(&sample_hash_scope(clock)).unwrap();
        let b = commit_hash(&sample_hash_scope(clock)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn seal_episode_chains_from_prior_hash_chain() {
        let clock = Utc::now();
        let episode = seal_episode(
            "EP-2",
            Dlr { decision_id: "D2".into(), summary: "ok".into(), claim_ids: vec![] },
            ReflectionSession { narrative: "nominal".into(), degradations: vec![] },
            DriftSummary::default(),
            MemoryGraphDiff::default(),
            sample_hash_scope(clock),
            2,
            Some("EP-1".into()),
            Some("sha256:prior-chain"),
            clock,
        )
        .unwrap();
        assert!(verify_commit_hash(&episode).unwrap());
        assert_ne!(episode.hash_chain, "sha256:prior-chain");
    }
}
