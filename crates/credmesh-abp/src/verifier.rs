//! Eight ABP verification checks (C5, spec §4.5).

use chrono::{DateTime, Utc};

use credmesh_ledger::ledger::AuthorityLedger;
use credmesh_types::model::{Abp, AbpCheck, AbpCheckResult, DelegationSeverity};

use crate::builder::hash_abp;
use crate::error::CmResult;

/// Runs all eight checks, each reported individually even when one fails —
/// callers decide whether any FAIL blocks distribution (spec §4.5 gate).
pub fn verify_abp(abp: &Abp, ledger: &AuthorityLedger, at: DateTime<Utc>) -> CmResult<Vec<AbpCheckResult>> {
    let mut results = Vec::with_capacity(8);

    results.push(check_schema_conformance(abp));
    results.push(check_hash_integrity(abp)?);
    results.push(check_id_determinism(abp)?);
    results.push(check_authority_ref_valid(abp, ledger, at)?);
    results.push(check_authority_not_expired(abp));
    results.push(check_composition_valid(abp));
    results.push(check_no_contradictions(abp));
    results.push(check_delegation_review_valid(abp));

    Ok(results)
}

pub fn all_pass(results: &[AbpCheckResult]) -> bool {
    results.iter().all(|r| r.pass)
}

fn ok(check: AbpCheck) -> AbpCheckResult {
    AbpCheckResult {
        check,
        pass: true,
        detail: None,
    }
}

fn fail(check: AbpCheck, detail: impl Into<String>) -> AbpCheckResult {
    AbpCheckResult {
        check,
        pass: false,
        detail: Some(detail.into()),
    }
}

fn check_schema_conformance(abp: &Abp) -> AbpCheckResult {
    if abp.abp_version.is_empty() || abp.scope.is_empty() || abp.authority_ref.is_empty() {
        return fail(AbpCheck::SchemaConformance, "missing required field");
    }
    ok(AbpCheck::SchemaConformance)
}

fn check_hash_integrity(abp: &Abp) -> CmResult<AbpCheckResult> {
    let recomputed = hash_abp(abp)?;
    Ok(if recomputed == abp.hash {
        ok(AbpCheck::HashIntegrity)
    } else {
        fail(AbpCheck::HashIntegrity, "recomputed hash does not match stored hash")
    })
}

fn check_id_determinism(abp: &Abp) -> CmResult<AbpCheckResult> {
    let id_basis = serde_json::json!({
        "scope": abp.scope,
        "authority_ref": abp.authority_ref,
        "created_at": abp.created_at,
    });
    let id_hash = credmesh_types::canonical::canonical_hash(&id_basis).map_err(|e| {
        credmesh_api::error::CredMeshError::new(
            credmesh_api::error::ErrorKind::InputInvalid,
            e.to_string(),
        )
    })?;
    let short = id_hash.trim_start_matches("sha256:").chars().take(8).collect::<String>();
    let expected = format!("ABP-{short}");
    Ok(if expected == abp.abp_id {
        ok(AbpCheck::IdDeterminism)
    } else {
        fail(AbpCheck::IdDeterminism, "recomputed abp_id does not match stored abp_id")
    })
}

/// Checked against the *current* verification clock, not `created_at` —
/// an ABP whose backing authority is revoked after issuance must start
/// failing re-verification from the moment the revocation takes effect.
fn check_authority_ref_valid(abp: &Abp, ledger: &AuthorityLedger, at: DateTime<Utc>) -> CmResult<AbpCheckResult> {
    match ledger.find_active_for_actor(&abp.authority_ref, at)? {
        Some(_) => Ok(ok(AbpCheck::AuthorityRefValid)),
        None => Ok(fail(
            AbpCheck::AuthorityRefValid,
            format!("authority {} has been revoked or does not exist", abp.authority_ref),
        )),
    }
}

fn check_authority_not_expired(abp: &Abp) -> AbpCheckResult {
    let effective_ok = abp.effective_at.map_or(true, |eff| eff <= abp.created_at);
    let expiry_ok = abp.expires_at.map_or(true, |exp| abp.created_at <= exp);
    if effective_ok && expiry_ok {
        ok(AbpCheck::AuthorityNotExpired)
    } else {
        fail(AbpCheck::AuthorityNotExpired, "created_at falls outside [effective_at, expires_at]")
    }
}

fn check_composition_valid(abp: &Abp) -> AbpCheckResult {
    let parent_consistent = abp.composition.parent_abp_id.is_some() == abp.composition.parent_abp_hash.is_some();
    let mut seen = std::collections::HashSet::new();
    let no_dupes = abp.composition.children.iter().all(|c| seen.insert(c));
    if parent_consistent && no_dupes {
        ok(AbpCheck::CompositionValid)
    } else if !parent_consistent {
        fail(AbpCheck::CompositionValid, "parent_abp_id and parent_abp_hash must both be present or both absent")
    } else {
        fail(AbpCheck::CompositionValid, "duplicate child ABP id")
    }
}

fn check_no_contradictions(abp: &Abp) -> AbpCheckResult {
    if abp.has_contradictions() {
        fail(AbpCheck::NoContradictions, "objective or tool name present in both allow and deny")
    } else {
        ok(AbpCheck::NoContradictions)
    }
}

fn check_delegation_review_valid(abp: &Abp) -> AbpCheckResult {
    let Some(review) = &abp.delegation_review else {
        return ok(AbpCheck::DelegationReviewValid);
    };
    let mut seen = std::collections::HashSet::new();
    let unique_ids = review.triggers.iter().all(|t| seen.insert(&t.trigger_id));
    if !unique_ids {
        return fail(AbpCheck::DelegationReviewValid, "duplicate delegation trigger id");
    }
    let severities_ok = review
        .triggers
        .iter()
        .all(|t| matches!(t.severity, DelegationSeverity::Warn | DelegationSeverity::Critical));
    if !severities_ok {
        return fail(AbpCheck::DelegationReviewValid, "trigger severity outside {warn, critical}");
    }
    if review.policy.approver_role.is_empty() || review.policy.output.is_empty() {
        return fail(AbpCheck::DelegationReviewValid, "policy must declare approver_role and output");
    }
    ok(AbpCheck::DelegationReviewValid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_abp, AbpConfig};
    use chrono::Duration;
    use credmesh_types::model::{
        AbpApprovals, AbpData, AbpEscalation, AbpObjectives, AbpProof, AbpRuntime, AbpTools,
        AuthorityLedgerEntry, GrantType,
    };

    fn base_config() -> AbpConfig {
        AbpConfig {
            abp_version: "1".into(),
            objectives: AbpObjectives::default(),
            tools: AbpTools::default(),
            data: AbpData::default(),
            approvals: AbpApprovals::default(),
            escalation: AbpEscalation::default(),
            runtime: AbpRuntime::default(),
            proof: AbpProof::default(),
            delegation_review: None,
            effective_at: None,
            expires_at: None,
        }
    }

    fn ledger_with_grant(dir: &tempfile::TempDir, authority_id: &str, at: DateTime<Utc>) -> AuthorityLedger {
        let ledger = AuthorityLedger::open(dir.path().join("authority.ndjson")).unwrap();
        ledger
            .append(AuthorityLedgerEntry {
                entry_version: 1,
                entry_id: format!("AUTH-{authority_id}"),
                entry_hash: String::new(),
                prev_entry_hash: None,
                authority_id: authority_id.into(),
                actor_id: authority_id.into(),
                actor_role: "analyst".into(),
                grant_type: GrantType::Direct,
                scope_bound: "finance".into(),
                policy_version: "1".into(),
                policy_hash: "sha256:abc".into(),
                effective_at: at - Duration::days(1),
                expires_at: None,
                revoked_at: None,
                signing_key_id: None,
                signature_ref: None,
                observed_at: at - Duration::days(1),
            })
            .unwrap();
        ledger
    }

    #[test]
    fn valid_abp_passes_all_eight_checks() {
        let clock = Utc::now();
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_with_grant(&dir, "auth-1", clock);
        let abp = build_abp("finance", "auth-1", base_config(), clock).unwrap();
        let results = verify_abp(&abp, &ledger, clock).unwrap();
        assert_eq!(results.len(), 8);
        assert!(all_pass(&results));
    }

    #[test]
    fn tampered_hash_fails_hash_integrity_only() {
        let clock = Utc::now();
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_with_grant(&dir, "auth-1", clock);
        let mut abp = build_abp("finance", "auth-1", base_config(), clock).unwrap();
        abp.hash = "sha256:deadbeef".into();
        let results = verify_abp(&abp, &ledger, clock).unwrap();
        let hash_check = results.iter().find(|r| r.check == AbpCheck::HashIntegrity).unwrap();
        assert!(!hash_check.pass);
        let id_check = results.iter().find(|r| r.check == AbpCheck::IdDeterminism).unwrap();
        assert!(id_check.pass);
    }

    #[test]
    fn revoked_authority_fails_authority_ref_check() {
        let clock = Utc::now();
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_with_grant(&dir, "auth-1", clock - Duration::days(30));
        let abp = build_abp("finance", "auth-1", base_config(), clock - Duration::days(30)).unwrap();

        ledger
            .append(AuthorityLedgerEntry {
                entry_version: 1,
                entry_id: "AUTH-auth-1-revoke".into(),
                entry_hash: String::new(),
                prev_entry_hash: None,
                authority_id: "auth-1".into(),
                actor_id: "auth-1".into(),
                actor_role: "analyst".into(),
                grant_type: GrantType::Revocation,
                scope_bound: "finance".into(),
                policy_version: "1".into(),
                policy_hash: "sha256:abc".into(),
                effective_at: clock - Duration::days(10),
                expires_at: None,
                revoked_at: None,
                signing_key_id: None,
                signature_ref: None,
                observed_at: clock - Duration::days(10),
            })
            .unwrap();

        let results = verify_abp(&abp, &ledger, clock).unwrap();
        let authority_check = results.iter().find(|r| r.check == AbpCheck::AuthorityRefValid).unwrap();
        assert!(!authority_check.pass);
    }
}
