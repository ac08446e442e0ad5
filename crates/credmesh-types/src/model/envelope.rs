//! Signed Envelope, Validation, Aggregate, and Seal (spec §3, §4.6 — C6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::ts;

/// Role a node plays in the envelope pipeline (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    Edge,
    Validator,
    Aggregator,
    SealAuthority,
}

/// `{envelope_id, tenant_id, node_id, role, payload_hash, signature, key_id,
/// timestamp, prev_envelope_hash?}` (spec §3, Envelope). Produced and
/// signed by an Edge node; append-only, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub envelope_id: String,
    pub tenant_id: String,
    pub node_id: String,
    pub role: NodeRole,
    pub payload_hash: String,
    pub signature: String,
    pub key_id: String,
    #[serde(with = "ts")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub prev_envelope_hash: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accept,
    Reject,
}

/// Rejection reasons a Validator may emit (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    BadSignature,
    StaleTimestamp,
    PolicyDeny,
}

/// One line of `validations.log`; deduplicated by
/// `(envelope_id, validator_node_id)` (spec §4.6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    pub envelope_id: String,
    pub validator_node_id: String,
    pub verdict: Verdict,
    #[serde(default)]
    pub reason: Option<RejectionReason>,
    #[serde(with = "ts")]
    pub validated_at: DateTime<Utc>,
}

/// One line of `aggregates.log`: ACCEPT counts for a claim grouped by
/// validator region and correlation group (spec §4.6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub aggregate_id: String,
    pub claim_id: String,
    /// `(region, correlation_group) -> accept count`.
    pub accepts_by_region_group: Vec<RegionGroupCount>,
    pub envelope_ids: Vec<String>,
    #[serde(with = "ts")]
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionGroupCount {
    pub region: String,
    pub correlation_group: String,
    pub accepts: u64,
}

/// Sentinel `prev_seal_hash` for the first seal in a chain (spec §4.6).
pub const SEAL_GENESIS: &str = "GENESIS";

/// One line of `seal_chain.log` (spec §4.6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seal {
    #[serde(default)]
    pub seal_hash: String,
    pub prev_seal_hash: String,
    pub policy_hash: String,
    pub snapshot_hash: String,
    #[serde(with = "ts")]
    pub sealed_at: DateTime<Utc>,
    pub role: NodeRole,
    pub chain_length: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_seal_has_sentinel_prev_hash() {
        let seal = Seal {
            seal_hash: String::new(),
            prev_seal_hash: SEAL_GENESIS.into(),
            policy_hash: "sha256:abc".into(),
            snapshot_hash: "sha256:def".into(),
            sealed_at: Utc::now(),
            role: NodeRole::SealAuthority,
            chain_length: 1,
        };
        assert_eq!(seal.prev_seal_hash, "GENESIS");
    }
}
