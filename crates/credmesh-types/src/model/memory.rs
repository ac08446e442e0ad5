//! Memory Graph node/edge kinds (spec §3, §4.13 — C13).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::ts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemoryNodeKind {
    Episode,
    Action,
    Drift,
    Patch,
    Evidence,
    Claim,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemoryEdgeKind {
    Produced,
    Triggered,
    ResolvedBy,
    EvidenceOf,
    Recurrence,
    Caused,
    ClaimSupports,
    ClaimContradicts,
    Supersedes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryNode {
    pub node_id: String,
    pub kind: MemoryNodeKind,
    #[serde(with = "ts")]
    pub created_at: DateTime<Utc>,
    /// Free-form tags used by the `RECALL` query (spec §4.13).
    #[serde(default)]
    pub tags: Vec<String>,
    /// Reference to the concrete artifact this node represents (episode
    /// id, claim id, drift id, ...).
    pub ref_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEdge {
    pub from_node_id: String,
    pub to_node_id: String,
    pub kind: MemoryEdgeKind,
    #[serde(with = "ts")]
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_and_edge_roundtrip() {
        let n = MemoryNode {
            node_id: "n1".into(),
            kind: MemoryNodeKind::Episode,
            created_at: Utc::now(),
            tags: vec!["ep-001".into()],
            ref_id: "ep-001".into(),
        };
        let s = serde_json::to_string(&n).unwrap();
        assert!(s.contains("\"EPISODE\""));
        let e = MemoryEdge {
            from_node_id: "n1".into(),
            to_node_id: "n2".into(),
            kind: MemoryEdgeKind::ResolvedBy,
            created_at: Utc::now(),
        };
        let s2 = serde_json::to_string(&e).unwrap();
        assert!(s2.contains("\"RESOLVED_BY\""));
    }
}
