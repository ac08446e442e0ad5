//! `credmesh drift-patch-cycle` (spec §4.11, §4.12, §6): runs a single
//! detect-propose-gate cycle from the command line, for scenario
//! walkthroughs without a running node. Only clears the approval gate —
//! the re-seal + memory-graph wiring needs a running node
//! (`NodeState::apply_patch_and_reseal`).

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, ValueEnum};

use credmesh_drift::detector::{derive_severity, fingerprint, recommended_patch_type, DriftObservation};
use credmesh_drift::patch_engine::{apply_patch, approval_gate_for, propose_patch, ApprovalRole, ApprovalState};
use credmesh_types::model::DriftType;

#[derive(Clone, Debug, ValueEnum)]
pub enum DriftTypeArg {
    Time,
    Freshness,
    Fallback,
    Bypass,
    Verify,
    Outcome,
    Fanout,
    Contention,
    Contradiction,
    StaleReference,
}

impl From<DriftTypeArg> for DriftType {
    fn from(value: DriftTypeArg) -> Self {
        match value {
            DriftTypeArg::Time => DriftType::Time,
            DriftTypeArg::Freshness => DriftType::Freshness,
            DriftTypeArg::Fallback => DriftType::Fallback,
            DriftTypeArg::Bypass => DriftType::Bypass,
            DriftTypeArg::Verify => DriftType::Verify,
            DriftTypeArg::Outcome => DriftType::Outcome,
            DriftTypeArg::Fanout => DriftType::Fanout,
            DriftTypeArg::Contention => DriftType::Contention,
            DriftTypeArg::Contradiction => DriftType::Contradiction,
            DriftTypeArg::StaleReference => DriftType::StaleReference,
        }
    }
}

#[derive(Parser, Debug)]
pub struct DriftPatchCycleArgs {
    #[clap(long, value_enum)]
    pub drift_type: DriftTypeArg,

    #[clap(long)]
    pub is_tier0: bool,

    #[clap(long)]
    pub episode_id: String,

    #[clap(long)]
    pub minimized_evidence_signature: String,

    /// Comma-separated roles already approved (owner, reviewer, governance_lead).
    #[clap(long, value_delimiter = ',')]
    pub approvals: Vec<String>,
}

pub fn run(args: DriftPatchCycleArgs) -> Result<()> {
    let drift_type: DriftType = args.drift_type.into();
    let observation = DriftObservation { is_tier0: args.is_tier0, ..DriftObservation::default() };
    let severity = derive_severity(drift_type, &observation);
    let fp = fingerprint(drift_type, &args.minimized_evidence_signature);
    let patch_type = recommended_patch_type(drift_type);

    println!("detected {drift_type:?} drift, severity={severity:?}, fingerprint={}", fp.key);

    let now = Utc::now();
    let patch = propose_patch(
        format!("PATCH-{}", fp.key),
        format!("DS-{}", fp.key),
        patch_type,
        format!("auto-proposed patch for {drift_type:?} drift"),
        args.episode_id,
        "revert to the prior episode version".to_string(),
        0.0,
        now,
    );

    let gate = approval_gate_for(severity);
    println!("approval gate: {gate:?}");

    let mut approvals = ApprovalState::default();
    for role in &args.approvals {
        let role = match role.as_str() {
            "owner" => ApprovalRole::Owner,
            "reviewer" => ApprovalRole::Reviewer,
            "governance_lead" => ApprovalRole::GovernanceLead,
            other => anyhow::bail!("unknown --approvals role: {other}"),
        };
        approvals.approve(role);
    }

    match apply_patch(patch, severity, &approvals) {
        Ok(applied) => println!(
            "patch {} cleared its approval gate (run through a node to reseal and update the memory graph)",
            applied.patch_id
        ),
        Err(e) => println!("patch not applied: {e}"),
    }
    Ok(())
}
