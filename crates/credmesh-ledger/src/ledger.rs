//! Authority Ledger (C4, spec §4.4).

use chrono::{DateTime, Utc};
use serde_json::Value;

use credmesh_storage::log_store::LogStore;
use credmesh_types::model::{AuthorityLedgerEntry, GrantType};

use crate::error::{CmResult, CredMeshError, ErrorKind};

/// Append-only, hash-chained record of authority grants and revocations.
pub struct AuthorityLedger {
    store: LogStore,
}

impl AuthorityLedger {
    pub fn open(path: impl Into<std::path::PathBuf>) -> CmResult<Self> {
        Ok(Self {
            store: LogStore::open(path)?,
        })
    }

    /// Computes `entry_hash` by canonicalizing the entry with
    /// `entry_hash=""`, sets `prev_entry_hash` to the last entry's hash (or
    /// `None`), then appends (spec §4.4).
    pub fn append(&self, mut entry: AuthorityLedgerEntry) -> CmResult<AuthorityLedgerEntry> {
        let last = self.last_entry()?;
        entry.prev_entry_hash = last.map(|e| e.entry_hash);
        entry.entry_hash = String::new();

        let value = serde_json::to_value(&entry)
            .map_err(|e| CredMeshError::new(ErrorKind::InputInvalid, e.to_string()))?;
        entry.entry_hash = credmesh_types::canonical::canonical_hash_with_blanked_field(
            value,
            "entry_hash",
        )
        .map_err(|e| CredMeshError::new(ErrorKind::InputInvalid, e.to_string()))?;

        self.store.append(&entry)?;
        Ok(entry)
    }

    fn last_entry(&self) -> CmResult<Option<AuthorityLedgerEntry>> {
        Ok(self.store.load_all::<AuthorityLedgerEntry>()?.into_iter().last())
    }

    /// `find_active_for_actor(actor_id, at_time)`: the single entry where
    /// `grant_type != revocation`, `effective_at <= at_time`,
    /// (`expires_at == null` or `at_time <= expires_at`), and no later
    /// revocation entry targets the same `authority_id` at-or-before
    /// `at_time` (spec §4.4).
    pub fn find_active_for_actor(
        &self,
        actor_id: &str,
        at_time: DateTime<Utc>,
    ) -> CmResult<Option<AuthorityLedgerEntry>> {
        let entries = self.store.load_all::<AuthorityLedgerEntry>()?;
        let revoked_authority_ids: std::collections::HashSet<&str> = entries
            .iter()
            .filter(|e| e.grant_type == GrantType::Revocation && e.effective_at <= at_time)
            .map(|e| e.authority_id.as_str())
            .collect();

        Ok(entries
            .iter()
            .find(|e| {
                e.actor_id == actor_id
                    && e.grant_type != GrantType::Revocation
                    && e.effective_at <= at_time
                    && e.expires_at.map_or(true, |exp| at_time <= exp)
                    && !revoked_authority_ids.contains(e.authority_id.as_str())
            })
            .cloned())
    }

    /// Re-derives each `entry_hash` and checks continuity end-to-end.
    /// Any break fails with `LEDGER_TAMPER` (spec §4.4).
    pub fn verify_chain(&self) -> CmResult<()> {
        let entries = self.store.load_all::<AuthorityLedgerEntry>()?;
        let mut prev_hash: Option<String> = None;
        for entry in &entries {
            if entry.prev_entry_hash != prev_hash {
                return Err(CredMeshError::new(
                    ErrorKind::ChainBreak,
                    format!("entry {} has mismatched prev_entry_hash", entry.entry_id),
                ));
            }
            let recomputed = recompute_entry_hash(entry)?;
            if recomputed != entry.entry_hash {
                return Err(CredMeshError::new(
                    ErrorKind::LedgerTamper,
                    format!("entry {} hash mismatch", entry.entry_id),
                ));
            }
            prev_hash = Some(entry.entry_hash.clone());
        }
        Ok(())
    }
}

fn recompute_entry_hash(entry: &AuthorityLedgerEntry) -> CmResult<String> {
    let value: Value = serde_json::to_value(entry)
        .map_err(|e| CredMeshError::new(ErrorKind::InputInvalid, e.to_string()))?;
    credmesh_types::canonical::canonical_hash_with_blanked_field(value, "entry_hash")
        .map_err(|e| CredMeshError::new(ErrorKind::InputInvalid, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_entry(actor_id: &str, grant_type: GrantType, authority_id: &str) -> AuthorityLedgerEntry {
        let now = Utc::now();
        AuthorityLedgerEntry {
            entry_version: 1,
            entry_id: format!("AUTH-{authority_id}"),
            entry_hash: String::new(),
            prev_entry_hash: None,
            authority_id: authority_id.into(),
            actor_id: actor_id.into(),
            actor_role: "analyst".into(),
            grant_type,
            scope_bound: "finance".into(),
            policy_version: "1".into(),
            policy_hash: "sha256:abc".into(),
            effective_at: now - Duration::days(1),
            expires_at: None,
            revoked_at: None,
            signing_key_id: None,
            signature_ref: None,
            observed_at: now,
        }
    }

    #[test]
    fn append_chains_hashes() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = AuthorityLedger::open(dir.path().join("authority.ndjson")).unwrap();
        let e1 = ledger.append(sample_entry("a1", GrantType::Direct, "G1")).unwrap();
        let e2 = ledger.append(sample_entry("a2", GrantType::Direct, "G2")).unwrap();
        assert_eq!(e2.prev_entry_hash, Some(e1.entry_hash));
        assert!(ledger.verify_chain().is_ok());
    }

    #[test]
    fn revocation_removes_active_status() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = AuthorityLedger::open(dir.path().join("authority.ndjson")).unwrap();
        ledger.append(sample_entry("a1", GrantType::Direct, "G1")).unwrap();
        assert!(ledger.find_active_for_actor("a1", Utc::now()).unwrap().is_some());

        let mut revoke = sample_entry("a1", GrantType::Revocation, "G1");
        revoke.observed_at = Utc::now();
        ledger.append(revoke).unwrap();
        assert!(ledger.find_active_for_actor("a1", Utc::now()).unwrap().is_none());
    }
}
