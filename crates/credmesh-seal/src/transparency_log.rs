//! Transparency Log (spec §4.14): a separate append-only NDJSON recording
//! every seal event, chained the same way the authority ledger is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use credmesh_storage::log_store::LogStore;
use credmesh_types::canonical::canonical_hash_with_blanked_field;
use credmesh_types::model::common::ts;

use crate::error::{CmResult, CredMeshError, ErrorKind};

pub const LOG_GENESIS: &str = "GENESIS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransparencyLogEntry {
    #[serde(with = "ts")]
    pub sealed_at: DateTime<Utc>,
    pub commit_hash: String,
    pub prev_log_hash: String,
    #[serde(default)]
    pub log_hash: String,
}

pub struct TransparencyLog {
    store: LogStore,
}

impl TransparencyLog {
    pub fn open(path: impl Into<std::path::PathBuf>) -> CmResult<Self> {
        Ok(Self {
            store: LogStore::open(path)?,
        })
    }

    pub fn append(&self, sealed_at: DateTime<Utc>, commit_hash: impl Into<String>) -> CmResult<TransparencyLogEntry> {
        let prev_log_hash = self
            .store
            .load_all::<TransparencyLogEntry>()?
            .last()
            .map(|e| e.log_hash.clone())
            .unwrap_or_else(|| LOG_GENESIS.to_string());

        let mut entry = TransparencyLogEntry {
            sealed_at,
            commit_hash: commit_hash.into(),
            prev_log_hash,
            log_hash: String::new(),
        };
        entry.log_hash = recompute_log_hash(&entry)?;
        self.store.append(&entry)?;
        Ok(entry)
    }

    pub fn verify_chain(&self) -> CmResult<()> {
        let entries = self.store.load_all::<TransparencyLogEntry>()?;
        let mut prev = LOG_GENESIS.to_string();
        for entry in &entries {
            if entry.prev_log_hash != prev {
                return Err(CredMeshError::new(
                    ErrorKind::ChainBreak,
                    "transparency log prev_log_hash mismatch",
                ));
            }
            let recomputed = recompute_log_hash(entry)?;
            if recomputed != entry.log_hash {
                return Err(CredMeshError::new(
                    ErrorKind::LedgerTamper,
                    "transparency log entry hash mismatch",
                ));
            }
            prev = entry.log_hash.clone();
        }
        Ok(())
    }
}

fn recompute_log_hash(entry: &TransparencyLogEntry) -> CmResult<String> {
    let value = serde_json::to_value(entry)
        .map_err(|e| CredMeshError::new(ErrorKind::InputInvalid, e.to_string()))?;
    canonical_hash_with_blanked_field(value, "log_hash")
        .map_err(|e| CredMeshError::new(ErrorKind::InputInvalid, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_chains_and_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let log = TransparencyLog::open(dir.path().join("transparency.ndjson")).unwrap();
        log.append(Utc::now(), "sha256:commit1").unwrap();
        log.append(Utc::now(), "sha256:commit2").unwrap();
        assert!(log.verify_chain().is_ok());
    }

    #[test]
    fn tampered_entry_breaks_verification() {
        use std::io::Write;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transparency.ndjson");
        let log = TransparencyLog::open(&path).unwrap();
        log.append(Utc::now(), "sha256:commit1").unwrap();
        let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(
            f,
            r#"{{"sealed_at":"2026-01-01T00:00:00.000Z","commit_hash":"sha256:forged","prev_log_hash":"GENESIS","log_hash":"sha256:forged"}}"#
        )
        .unwrap();
        assert!(log.verify_chain().is_err());
    }
}
