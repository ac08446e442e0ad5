//! The data model (spec §3): evidence, claims, authority, ABP, envelopes,
//! drift, sealed episodes, and the memory graph.

pub mod abp;
pub mod authority;
pub mod claim;
pub mod common;
pub mod drift;
pub mod envelope;
pub mod episode;
pub mod evidence;
pub mod memory;

pub use abp::{
    Abp, AbpApprovals, AbpCheck, AbpCheckResult, AbpComposition, AbpData, AbpEscalation,
    AbpObjectives, AbpProof, AbpRuntime, AbpTools, DelegationReview, DelegationReviewPolicy,
    DelegationSeverity, DelegationTrigger,
};
pub use authority::{AuthorityLedgerEntry, GrantType};
pub use claim::{
    Claim, ClaimGraph, ClaimGraphEdges, ClaimValidationError, Confidence, HalfLife, HalfLifeUnit,
    Scope,
};
pub use common::{
    now_ms, EvidenceMode, EvidenceStatus, SourceStatus, StatusLight, Tier, TrustLane, TruthType,
};
pub use drift::{DriftSignal, DriftType, Fingerprint, Patch, RecommendedPatchType};
pub use envelope::{
    Aggregate, Envelope, NodeRole, RegionGroupCount, RejectionReason, Seal, Validation, Verdict,
    SEAL_GENESIS,
};
pub use episode::{
    Dlr, DriftSummary, HashScope, HashScopeParameters, InputHash, MemoryGraphDiff,
    ReflectionSession, SealedDecisionEpisode,
};
pub use evidence::{EvidenceNode, EvidenceValidationError, Source};
pub use memory::{MemoryEdge, MemoryEdgeKind, MemoryNode, MemoryNodeKind};
