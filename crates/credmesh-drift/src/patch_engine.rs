//! Patch & Re-seal Engine (C12, spec §4.12): every correction is additive.
//! A patch is proposed against a `DriftSignal` and routed through an
//! approval gate keyed to severity. This module owns the gate itself;
//! clearing it is only half of "apply" — the re-seal step that turns a
//! cleared patch into a brand-new sealed episode (and records the
//! `PATCH`/`RESOLVED_BY` memory-graph nodes) needs a sealer and a memory
//! graph, neither of which this crate depends on, so that part lives in
//! `credmesh_node::state::NodeState::apply_patch_and_reseal`.

use chrono::{DateTime, Utc};

use credmesh_types::model::{Patch, RecommendedPatchType, StatusLight};

use crate::error::{CmResult, CredMeshError, ErrorKind};

/// Who must sign off before a patch may apply, keyed to drift severity
/// (spec §4.12: "auto <= green, owner <= yellow, reviewer + governance
/// lead for red").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalGate {
    Auto,
    Owner,
    ReviewerAndGovernanceLead,
}

pub fn approval_gate_for(severity: StatusLight) -> ApprovalGate {
    match severity {
        StatusLight::Green => ApprovalGate::Auto,
        StatusLight::Yellow => ApprovalGate::Owner,
        StatusLight::Red => ApprovalGate::ReviewerAndGovernanceLead,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalRole {
    Owner,
    Reviewer,
    GovernanceLead,
}

/// A recorded approval; `ReviewerAndGovernanceLead` gates require both
/// roles to have signed off before `is_satisfied` returns true.
#[derive(Debug, Clone, Default)]
pub struct ApprovalState {
    pub roles_approved: Vec<ApprovalRole>,
}

impl ApprovalState {
    pub fn approve(&mut self, role: ApprovalRole) {
        if !self.roles_approved.contains(&role) {
            self.roles_approved.push(role);
        }
    }

    pub fn is_satisfied(&self, gate: ApprovalGate) -> bool {
        match gate {
            ApprovalGate::Auto => true,
            ApprovalGate::Owner => self.roles_approved.contains(&ApprovalRole::Owner),
            ApprovalGate::ReviewerAndGovernanceLead => {
                self.roles_approved.contains(&ApprovalRole::Reviewer)
                    && self.roles_approved.contains(&ApprovalRole::GovernanceLead)
            }
        }
    }
}

/// Builds a `Patch` record in the proposed (unapplied) state.
pub fn propose_patch(
    patch_id: impl Into<String>,
    drift_id: impl Into<String>,
    patch_type: RecommendedPatchType,
    description: impl Into<String>,
    supersedes_episode_id: impl Into<String>,
    rollback_plan: impl Into<String>,
    expected_ci_impact: f64,
    at: DateTime<Utc>,
) -> Patch {
    Patch {
        patch_id: patch_id.into(),
        drift_id: drift_id.into(),
        patch_type,
        description: description.into(),
        proposed_at: at,
        supersedes_episode_id: supersedes_episode_id.into(),
        rollback_plan: rollback_plan.into(),
        expected_ci_impact,
        applied: false,
    }
}

/// Clears a patch's approval gate and marks it applied. Returns an error
/// rather than mutating a patch whose gate hasn't been cleared — callers
/// must not silently downgrade a red-severity requirement. This is the
/// gate check only; re-sealing the correction as a new episode and wiring
/// the memory graph happens one layer up (see the module doc).
pub fn apply_patch(
    mut patch: Patch,
    severity: StatusLight,
    approvals: &ApprovalState,
) -> CmResult<Patch> {
    let gate = approval_gate_for(severity);
    if !approvals.is_satisfied(gate) {
        return Err(CredMeshError::new(
            ErrorKind::PolicyViolation,
            format!("patch {} has not cleared its approval gate {:?}", patch.patch_id, gate),
        ));
    }
    patch.applied = true;
    Ok(patch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_patch(at: DateTime<Utc>) -> Patch {
        propose_patch(
            "PATCH-1",
            "DRIFT-1",
            RecommendedPatchType::TtlChange,
            "extend Tier-0 evidence TTL",
            "EPISODE-1",
            "revert TTL to prior value",
            5.0,
            at,
        )
    }

    #[test]
    fn green_severity_applies_without_approval() {
        let patch = sample_patch(Utc::now());
        let result = apply_patch(patch, StatusLight::Green, &ApprovalState::default());
        assert!(result.unwrap().applied);
    }

    #[test]
    fn red_severity_requires_both_reviewer_and_governance_lead() {
        let patch = sample_patch(Utc::now());
        let mut approvals = ApprovalState::default();
        approvals.approve(ApprovalRole::Reviewer);
        let result = apply_patch(patch.clone(), StatusLight::Red, &approvals);
        assert!(result.is_err());

        approvals.approve(ApprovalRole::GovernanceLead);
        let result = apply_patch(patch, StatusLight::Red, &approvals);
        assert!(result.unwrap().applied);
    }
}
