//! Authority Ledger Entry (spec §3, §4.4 — C4).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::ts_opt;

/// The kind of grant an authority ledger entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    Direct,
    Delegated,
    Emergency,
    Revocation,
}

/// A single hash-chained entry in the authority ledger. `prev_entry_hash`
/// links to the previous entry's `entry_hash`; the first entry in a ledger
/// sets it to `None` (spec §3, §4.4).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorityLedgerEntry {
    pub entry_version: u32,
    /// `"AUTH-" + sha256(..)[:8]`.
    pub entry_id: String,
    #[serde(default)]
    pub entry_hash: String,
    #[serde(default)]
    pub prev_entry_hash: Option<String>,
    pub authority_id: String,
    pub actor_id: String,
    pub actor_role: String,
    pub grant_type: GrantType,
    pub scope_bound: String,
    pub policy_version: String,
    pub policy_hash: String,
    #[serde(with = "super::common::ts")]
    pub effective_at: DateTime<Utc>,
    #[serde(default, with = "ts_opt")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, with = "ts_opt")]
    pub revoked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub signing_key_id: Option<String>,
    #[serde(default)]
    pub signature_ref: Option<String>,
    #[serde(with = "super::common::ts")]
    pub observed_at: DateTime<Utc>,
}

impl AuthorityLedgerEntry {
    /// Matches `find_active_for_actor` semantics (spec §4.4): not a
    /// revocation, within `[effective_at, expires_at]`, and not (yet)
    /// revoked as of `at`.
    pub fn is_active_for(&self, actor_id: &str, at: DateTime<Utc>) -> bool {
        self.actor_id == actor_id
            && self.grant_type != GrantType::Revocation
            && self.effective_at <= at
            && self.expires_at.map_or(true, |exp| at <= exp)
            && self.revoked_at.map_or(true, |rev| at < rev)
    }
}
