//! Seal Authority role (spec §4.6): chains seals into `seal_chain.log`.

use chrono::Utc;

use credmesh_storage::log_store::LogStore;
use credmesh_types::model::{Aggregate, NodeRole, Seal, SEAL_GENESIS};

use crate::error::{CmResult, CredMeshError, ErrorKind};

pub struct SealAuthority {
    log: LogStore,
}

impl SealAuthority {
    pub fn new(log: LogStore) -> Self {
        Self { log }
    }

    /// Seals an aggregate snapshot under `policy_hash`, chaining from the
    /// last seal (or `"GENESIS"` for the first). `seal_hash` is computed
    /// over the canonical form with `seal_hash=""` (spec §4.6).
    pub fn seal(&self, aggregate: &Aggregate, policy_hash: impl Into<String>) -> CmResult<Seal> {
        let existing = self.log.load_all::<Seal>()?;
        let prev_seal_hash = existing
            .last()
            .map(|s| s.seal_hash.clone())
            .unwrap_or_else(|| SEAL_GENESIS.to_string());
        let chain_length = existing.len() as u64 + 1;

        let snapshot_hash = credmesh_types::canonical::canonical_hash(aggregate)
            .map_err(|e| CredMeshError::new(ErrorKind::InputInvalid, e.to_string()))?;

        let mut seal = Seal {
            seal_hash: String::new(),
            prev_seal_hash,
            policy_hash: policy_hash.into(),
            snapshot_hash,
            sealed_at: Utc::now(),
            role: NodeRole::SealAuthority,
            chain_length,
        };

        let value = serde_json::to_value(&seal)
            .map_err(|e| CredMeshError::new(ErrorKind::InputInvalid, e.to_string()))?;
        seal.seal_hash = credmesh_types::canonical::canonical_hash_with_blanked_field(value, "seal_hash")
            .map_err(|e| CredMeshError::new(ErrorKind::InputInvalid, e.to_string()))?;

        self.log.append(&seal)?;
        Ok(seal)
    }

    /// Re-derives every `seal_hash` and checks `prev_seal_hash` continuity;
    /// any node can independently perform this (spec §4.6).
    pub fn verify_chain(&self) -> CmResult<()> {
        let seals = self.log.load_all::<Seal>()?;
        let mut prev = SEAL_GENESIS.to_string();
        for seal in &seals {
            if seal.prev_seal_hash != prev {
                return Err(CredMeshError::new(
                    ErrorKind::ChainBreak,
                    "seal chain prev_seal_hash mismatch",
                ));
            }
            let value = serde_json::to_value(seal)
                .map_err(|e| CredMeshError::new(ErrorKind::InputInvalid, e.to_string()))?;
            let recomputed = credmesh_types::canonical::canonical_hash_with_blanked_field(value, "seal_hash")
                .map_err(|e| CredMeshError::new(ErrorKind::InputInvalid, e.to_string()))?;
            if recomputed != seal.seal_hash {
                return Err(CredMeshError::new(
                    ErrorKind::LedgerTamper,
                    "seal_hash does not match recomputed value",
                ));
            }
            prev = seal.seal_hash.clone();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credmesh_types::model::RegionGroupCount;

    fn sample_aggregate(id: &str) -> Aggregate {
        Aggregate {
            aggregate_id: id.into(),
            claim_id: "CLAIM-2026-0001".into(),
            accepts_by_region_group: vec![RegionGroupCount {
                region: "us-east".into(),
                correlation_group: "g1".into(),
                accepts: 3,
            }],
            envelope_ids: vec!["ENV-1".into()],
            computed_at: Utc::now(),
        }
    }

    #[test]
    fn first_seal_chains_from_genesis() {
        let dir = tempfile::tempdir().unwrap();
        let log = LogStore::open(dir.path().join("seal_chain.ndjson")).unwrap();
        let authority = SealAuthority::new(log);
        let seal = authority.seal(&sample_aggregate("AGG-1"), "sha256:policy").unwrap();
        assert_eq!(seal.prev_seal_hash, "GENESIS");
        assert_eq!(seal.chain_length, 1);
    }

    #[test]
    fn chain_verifies_across_multiple_seals() {
        let dir = tempfile::tempdir().unwrap();
        let log = LogStore::open(dir.path().join("seal_chain.ndjson")).unwrap();
        let authority = SealAuthority::new(log);
        authority.seal(&sample_aggregate("AGG-1"), "sha256:policy").unwrap();
        authority.seal(&sample_aggregate("AGG-2"), "sha256:policy").unwrap();
        assert!(authority.verify_chain().is_ok());
    }
}
