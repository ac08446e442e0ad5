//! Authority Boundary Primitive (spec §3, §4.5 — C5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::ts_opt;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbpObjectives {
    #[serde(default)]
    pub allowed: Vec<String>,
    #[serde(default)]
    pub denied: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbpTools {
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbpData {
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbpApprovals {
    #[serde(default)]
    pub required: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbpEscalation {
    #[serde(default)]
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbpRuntime {
    #[serde(default)]
    pub validators: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbpProof {
    #[serde(default)]
    pub required: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbpComposition {
    #[serde(default)]
    pub parent_abp_id: Option<String>,
    #[serde(default)]
    pub parent_abp_hash: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
}

/// A delegation review trigger: fires when the bound activity matches, and
/// routes to `approver_role` with an `output` disposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegationTrigger {
    pub trigger_id: String,
    pub severity: DelegationSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelegationSeverity {
    Warn,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegationReviewPolicy {
    pub approver_role: String,
    pub output: String,
    pub timeout_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegationReview {
    pub triggers: Vec<DelegationTrigger>,
    pub policy: DelegationReviewPolicy,
}

/// Authority Boundary Primitive: the pre-runtime declaration of what an
/// agent may do, bound to an authority ledger entry (spec §3, ABP).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Abp {
    pub abp_version: String,
    #[serde(default)]
    pub abp_id: String,
    pub scope: String,
    pub authority_ref: String,
    pub objectives: AbpObjectives,
    pub tools: AbpTools,
    pub data: AbpData,
    pub approvals: AbpApprovals,
    pub escalation: AbpEscalation,
    pub runtime: AbpRuntime,
    pub proof: AbpProof,
    #[serde(default)]
    pub composition: AbpComposition,
    #[serde(default)]
    pub delegation_review: Option<DelegationReview>,
    #[serde(with = "ts_opt", default)]
    pub effective_at: Option<DateTime<Utc>>,
    #[serde(default, with = "ts_opt")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(with = "super::common::ts")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub hash: String,
}

/// One of the eight individually reported ABP verification checks
/// (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbpCheck {
    SchemaConformance,
    HashIntegrity,
    IdDeterminism,
    AuthorityRefValid,
    AuthorityNotExpired,
    CompositionValid,
    NoContradictions,
    DelegationReviewValid,
}

impl AbpCheck {
    pub const ALL: [AbpCheck; 8] = [
        AbpCheck::SchemaConformance,
        AbpCheck::HashIntegrity,
        AbpCheck::IdDeterminism,
        AbpCheck::AuthorityRefValid,
        AbpCheck::AuthorityNotExpired,
        AbpCheck::CompositionValid,
        AbpCheck::NoContradictions,
        AbpCheck::DelegationReviewValid,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbpCheckResult {
    pub check: AbpCheck,
    pub pass: bool,
    #[serde(default)]
    pub detail: Option<String>,
}

impl Abp {
    /// Contradiction-free invariant (spec §3, §8.9): no id in both
    /// `allowed`/`denied`, no tool name in both `allow`/`deny`.
    pub fn has_contradictions(&self) -> bool {
        self.objectives
            .allowed
            .iter()
            .any(|id| self.objectives.denied.contains(id))
            || self.tools.allow.iter().any(|t| self.tools.deny.contains(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_abp() -> Abp {
        Abp {
            abp_version: "1".into(),
            abp_id: String::new(),
            scope: "finance".into(),
            authority_ref: "L1".into(),
            objectives: AbpObjectives::default(),
            tools: AbpTools::default(),
            data: AbpData::default(),
            approvals: AbpApprovals::default(),
            escalation: AbpEscalation::default(),
            runtime: AbpRuntime::default(),
            proof: AbpProof::default(),
            composition: AbpComposition::default(),
            delegation_review: None,
            effective_at: None,
            expires_at: None,
            created_at: Utc::now(),
            hash: String::new(),
        }
    }

    #[test]
    fn contradiction_detected_on_shared_objective() {
        let mut abp = base_abp();
        abp.objectives.allowed.push("obj.read".into());
        abp.objectives.denied.push("obj.read".into());
        assert!(abp.has_contradictions());
    }

    #[test]
    fn no_contradiction_on_disjoint_sets() {
        let mut abp = base_abp();
        abp.objectives.allowed.push("obj.read".into());
        abp.objectives.denied.push("obj.write".into());
        assert!(!abp.has_contradictions());
    }
}
