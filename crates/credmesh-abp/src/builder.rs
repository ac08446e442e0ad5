//! `build_abp` and `compose_abps` (C5, spec §4.5).

use chrono::{DateTime, Utc};

use credmesh_types::model::{
    Abp, AbpComposition, AbpData, AbpEscalation, AbpObjectives, AbpProof, AbpRuntime, AbpTools,
    DelegationReview,
};

use crate::error::{CmResult, CredMeshError, ErrorKind};

#[derive(Debug, Clone)]
pub struct AbpConfig {
    pub abp_version: String,
    pub objectives: AbpObjectives,
    pub tools: AbpTools,
    pub data: AbpData,
    pub approvals: credmesh_types::model::AbpApprovals,
    pub escalation: AbpEscalation,
    pub runtime: AbpRuntime,
    pub proof: AbpProof,
    pub delegation_review: Option<DelegationReview>,
    pub effective_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// `build_abp(scope, authority_ref, config, clock)` (spec §4.5):
/// 1. `created_at = clock`.
/// 2. Assemble the full ABP with empty `abp_id`/`hash`.
/// 3. `abp_id = "ABP-" + sha256_canonical({scope, authority_ref, created_at})[:8]`.
/// 4. Reject contradictions with `ABP_CONTRADICTION`.
/// 5. Compute `hash`.
pub fn build_abp(
    scope: impl Into<String>,
    authority_ref: impl Into<String>,
    config: AbpConfig,
    clock: DateTime<Utc>,
) -> CmResult<Abp> {
    let scope = scope.into();
    let authority_ref = authority_ref.into();

    let mut abp = Abp {
        abp_version: config.abp_version,
        abp_id: String::new(),
        scope: scope.clone(),
        authority_ref: authority_ref.clone(),
        objectives: config.objectives,
        tools: config.tools,
        data: config.data,
        approvals: config.approvals,
        escalation: config.escalation,
        runtime: config.runtime,
        proof: config.proof,
        composition: AbpComposition::default(),
        delegation_review: config.delegation_review,
        effective_at: config.effective_at,
        expires_at: config.expires_at,
        created_at: clock,
        hash: String::new(),
    };

    if abp.has_contradictions() {
        return Err(CredMeshError::new(
            ErrorKind::PolicyViolation,
            "ABP_CONTRADICTION: objective or tool present in both allow and deny",
        ));
    }

    let id_basis = serde_json::json!({
        "scope": scope,
        "authority_ref": authority_ref,
        "created_at": clock,
    });
    let id_hash = credmesh_types::canonical::canonical_hash(&id_basis)
        .map_err(|e| CredMeshError::new(ErrorKind::InputInvalid, e.to_string()))?;
    let short = id_hash.trim_start_matches("sha256:").chars().take(8).collect::<String>();
    abp.abp_id = format!("ABP-{short}");

    abp.hash = hash_abp(&abp)?;
    Ok(abp)
}

pub fn hash_abp(abp: &Abp) -> CmResult<String> {
    let value = serde_json::to_value(abp)
        .map_err(|e| CredMeshError::new(ErrorKind::InputInvalid, e.to_string()))?;
    credmesh_types::canonical::canonical_hash_with_blanked_field(value, "hash")
        .map_err(|e| CredMeshError::new(ErrorKind::InputInvalid, e.to_string()))
}

/// Merges `children` into `parent`: concatenates list fields, unions
/// `proof.required`, deduplicates `delegation_review.triggers` by id (first
/// wins), takes the tightest `review_policy.timeout_ms`, then recomputes
/// the parent hash with the children injected (spec §4.5).
pub fn compose_abps(mut parent: Abp, children: &[Abp]) -> CmResult<Abp> {
    for child in children {
        parent.objectives.allowed.extend(child.objectives.allowed.clone());
        parent.objectives.denied.extend(child.objectives.denied.clone());
        parent.tools.allow.extend(child.tools.allow.clone());
        parent.tools.deny.extend(child.tools.deny.clone());
        parent.data.permissions.extend(child.data.permissions.clone());
        parent.approvals.required.extend(child.approvals.required.clone());
        parent.escalation.paths.extend(child.escalation.paths.clone());
        parent.runtime.validators.extend(child.runtime.validators.clone());

        for req in &child.proof.required {
            if !parent.proof.required.contains(req) {
                parent.proof.required.push(req.clone());
            }
        }

        if let Some(child_review) = &child.delegation_review {
            let parent_review = parent.delegation_review.get_or_insert_with(|| child_review.clone());
            let mut seen: std::collections::HashSet<String> = parent_review
                .triggers
                .iter()
                .map(|t| t.trigger_id.clone())
                .collect();
            for trigger in &child_review.triggers {
                if seen.insert(trigger.trigger_id.clone()) {
                    parent_review.triggers.push(trigger.clone());
                }
            }
            if child_review.policy.timeout_ms < parent_review.policy.timeout_ms {
                parent_review.policy.timeout_ms = child_review.policy.timeout_ms;
            }
        }

        parent.composition.children.push(child.abp_id.clone());
    }

    if parent.has_contradictions() {
        return Err(CredMeshError::new(
            ErrorKind::PolicyViolation,
            "ABP_CONTRADICTION: composition introduced an overlapping allow/deny entry"));
    }

    parent.hash = hash_abp(&parent)?;
    Ok(parent)
}
