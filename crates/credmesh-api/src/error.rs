//! The stable error-kind taxonomy shared by every component (spec §7).
//!
//! Component crates define their own local error enums and convert into
//! [`CredMeshError`] at the crate boundary, the same way the teacher's
//! `ioi-crypto`/`ioi-storage` crates re-export or wrap into a shared
//! `ioi_api::error` surface.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable error kinds. Names are part of the wire contract (§7, §6 API
/// responses); never rename a variant once shipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InputInvalid,
    HashMismatch,
    LedgerTamper,
    ChainBreak,
    AuthorityDeny,
    Timeout,
    QuorumBroken,
    PolicyViolation,
    Filesystem,
    TransportUnreachable,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InputInvalid => "INPUT_INVALID",
            ErrorKind::HashMismatch => "HASH_MISMATCH",
            ErrorKind::LedgerTamper => "LEDGER_TAMPER",
            ErrorKind::ChainBreak => "CHAIN_BREAK",
            ErrorKind::AuthorityDeny => "AUTHORITY_DENY",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::QuorumBroken => "QUORUM_BROKEN",
            ErrorKind::PolicyViolation => "POLICY_VIOLATION",
            ErrorKind::Filesystem => "FILESYSTEM",
            ErrorKind::TransportUnreachable => "TRANSPORT_UNREACHABLE",
        };
        f.write_str(s)
    }
}

/// The shared, user-visible error type. CLI maps this to a nonzero exit
/// code; the HTTP query API maps it to `{error: kind, detail, correlation_id}`.
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
#[error("{kind}: {detail}")]
pub struct CredMeshError {
    pub kind: ErrorKind,
    pub detail: String,
    pub correlation_id: Uuid,
}

impl CredMeshError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            correlation_id: Uuid::new_v4(),
        }
    }

    pub fn input_invalid(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::InputInvalid, detail)
    }

    pub fn hash_mismatch(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::HashMismatch, detail)
    }

    pub fn ledger_tamper(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::LedgerTamper, detail)
    }

    pub fn chain_break(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::ChainBreak, detail)
    }

    pub fn authority_deny(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::AuthorityDeny, detail)
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, detail)
    }

    pub fn policy_violation(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::PolicyViolation, detail)
    }

    pub fn filesystem(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Filesystem, detail)
    }

    pub fn transport_unreachable(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransportUnreachable, detail)
    }
}

/// Result alias used throughout the workspace.
pub type CmResult<T> = Result<T, CredMeshError>;
