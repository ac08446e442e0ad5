//! Wire types for the replication transport (spec §6): push batches, pull
//! cursors, and the status/topology responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use credmesh_types::model::{Aggregate, Envelope, Seal, Validation};

use crate::peer_health::PeerState;

/// POST `/mesh/{tenant}/{node}/push` body: canonical-JSON batches of new
/// records beyond the sender's own cursor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushBatch {
    #[serde(default)]
    pub envelopes: Vec<Envelope>,
    #[serde(default)]
    pub validations: Vec<Validation>,
    #[serde(default)]
    pub aggregates: Vec<Aggregate>,
    #[serde(default)]
    pub seals: Vec<Seal>,
}

impl PushBatch {
    pub fn is_empty(&self) -> bool {
        self.envelopes.is_empty()
            && self.validations.is_empty()
            && self.aggregates.is_empty()
            && self.seals.is_empty()
    }
}

/// Response to a push: per-kind counts actually appended, and the error
/// kind if the receiver refused the batch (e.g. `CHAIN_BREAK` -> 409).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushResult {
    pub accepted_envelopes: usize,
    pub accepted_validations: usize,
    pub accepted_aggregates: usize,
    pub accepted_seals: usize,
}

/// A cursor into one node's logs, one offset per kind. Offsets are record
/// counts, not byte offsets (spec §4.3: logs are read via streaming
/// iterators, never by byte seek).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub envelopes: usize,
    pub validations: usize,
    pub aggregates: usize,
    pub seals: usize,
}

/// GET `/mesh/{tenant}/{node}/status` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeStatus {
    pub tenant_id: String,
    pub node_id: String,
    pub cursor: Cursor,
    pub observed_at: DateTime<Utc>,
}

/// GET `/mesh/{tenant}/topology` response: every peer this node knows
/// about and its last-observed health state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyEntry {
    pub peer_id: String,
    pub identity: PeerIdentity,
    pub state: PeerState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topology {
    pub tenant_id: String,
    pub peers: Vec<TopologyEntry>,
}

/// SPIFFE-style peer identity: `spiffe://{tenant}/node/{node_id}`, with an
/// optional pinned mTLS certificate fingerprint (spec §4.15: "Optional
/// mTLS with pinned per-peer fingerprint; peer identity in SPIFFE-style
/// form").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerIdentity {
    pub spiffe_id: String,
    #[serde(default)]
    pub pinned_fingerprint: Option<String>,
}

impl PeerIdentity {
    pub fn new(tenant_id: &str, node_id: &str) -> Self {
        Self {
            spiffe_id: format!("spiffe://{tenant_id}/node/{node_id}"),
            pinned_fingerprint: None,
        }
    }

    pub fn with_pinned_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.pinned_fingerprint = Some(fingerprint.into());
        self
    }

    /// Checks a presented certificate fingerprint (hex sha256) against the
    /// pin. A peer with no pin configured accepts any presented
    /// fingerprint — mTLS pinning is opt-in per peer.
    pub fn accepts_fingerprint(&self, presented: &str) -> bool {
        match &self.pinned_fingerprint {
            Some(pinned) => pinned.eq_ignore_ascii_case(presented),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spiffe_id_has_expected_form() {
        let id = PeerIdentity::new("acme", "node-7");
        assert_eq!(id.spiffe_id, "spiffe://acme/node/node-7");
    }

    #[test]
    fn unpinned_identity_accepts_any_fingerprint() {
        let id = PeerIdentity::new("acme", "node-7");
        assert!(id.accepts_fingerprint("anything"));
    }

    #[test]
    fn pinned_identity_rejects_mismatched_fingerprint() {
        let id = PeerIdentity::new("acme", "node-7").with_pinned_fingerprint("AB:CD");
        assert!(id.accepts_fingerprint("ab:cd"));
        assert!(!id.accepts_fingerprint("ff:ff"));
    }
}
