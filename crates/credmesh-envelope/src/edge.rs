//! Edge role (spec §4.6): produces signed `Envelope`s from local events.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use credmesh_crypto::provider::CryptoProvider;
use credmesh_storage::log_store::LogStore;
use credmesh_types::model::{Envelope, NodeRole};

use crate::error::{CmResult, CredMeshError, ErrorKind};

/// Canonicalizes a payload, signs it, and appends the resulting envelope
/// to `envelopes.log`. Replication to peers is the caller's concern
/// (credmesh-replication); this type only produces and persists.
pub struct Edge {
    tenant_id: String,
    node_id: String,
    signer: Arc<dyn CryptoProvider>,
    log: LogStore,
    last_envelope_hash: std::sync::Mutex<Option<String>>,
}

impl Edge {
    pub fn new(tenant_id: impl Into<String>, node_id: impl Into<String>, signer: Arc<dyn CryptoProvider>, log: LogStore) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            node_id: node_id.into(),
            signer,
            log,
            last_envelope_hash: std::sync::Mutex::new(None),
        }
    }

    pub fn produce<T: Serialize>(&self, envelope_id: impl Into<String>, payload: &T) -> CmResult<Envelope> {
        let payload_bytes = credmesh_types::canonical::to_canonical_bytes(payload)
            .map_err(|e| CredMeshError::new(ErrorKind::InputInvalid, e.to_string()))?;
        let payload_hash = credmesh_types::canonical::sha256_text(
            &String::from_utf8_lossy(&payload_bytes),
        );
        let signature_bytes = self.signer.sign(payload_hash.as_bytes())?;

        let prev_envelope_hash = self
            .last_envelope_hash
            .lock()
            .map_err(|_| CredMeshError::new(ErrorKind::Filesystem, "envelope chain lock poisoned"))?
            .clone();

        let envelope = Envelope {
            envelope_id: envelope_id.into(),
            tenant_id: self.tenant_id.clone(),
            node_id: self.node_id.clone(),
            role: NodeRole::Edge,
            payload_hash,
            signature: hex::encode(signature_bytes),
            key_id: self.signer.key_id().to_string(),
            timestamp: Utc::now(),
            prev_envelope_hash,
        };

        self.log.append(&envelope)?;

        let envelope_value_hash = credmesh_types::canonical::canonical_hash(&envelope)
            .map_err(|e| CredMeshError::new(ErrorKind::InputInvalid, e.to_string()))?;
        let mut guard = self
            .last_envelope_hash
            .lock()
            .map_err(|_| CredMeshError::new(ErrorKind::Filesystem, "envelope chain lock poisoned"))?;
        *guard = Some(envelope_value_hash);

        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credmesh_crypto::provider::{Algorithm, Ed25519Provider};
    use serde::Deserialize;

    #[derive(Serialize, Deserialize)]
    struct Payload {
        claim_id: String,
    }

    #[test]
    fn produce_chains_prev_envelope_hash() {
        let dir = tempfile::tempdir().unwrap();
        let signer = Arc::new(Ed25519Provider::generate("k1", Algorithm::EdPrimary).unwrap());
        let log = LogStore::open(dir.path().join("envelopes.ndjson")).unwrap();
        let edge = Edge::new("tenant-a", "node-1", signer, log);

        let e1 = edge.produce("ENV-1", &Payload { claim_id: "C1".into() }).unwrap();
        assert!(e1.prev_envelope_hash.is_none());

        let e2 = edge.produce("ENV-2", &Payload { claim_id: "C2".into() }).unwrap();
        assert!(e2.prev_envelope_hash.is_some());
    }
}
