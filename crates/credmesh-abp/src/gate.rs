//! ABP verification gate (C5): wraps [`crate::verifier::verify_abp`] with a
//! bounded, TTL'd result cache, mirroring `admissibility-kernel`'s
//! `TokenVerifier` cache for repeated checks against the same token.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use credmesh_ledger::ledger::AuthorityLedger;
use credmesh_types::model::{Abp, AbpCheckResult};

use crate::error::CmResult;
use crate::verifier::{all_pass, verify_abp};

/// `{abp_id, hash}` — a gate call for the same pair within the TTL is
/// answered from cache instead of re-running all eight checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    abp_id: String,
    hash: String,
}

struct CacheEntry {
    results: Vec<AbpCheckResult>,
    inserted_at: Instant,
}

/// Bounded by `capacity`, evicted least-recently-used first; entries older
/// than `ttl` are treated as misses. Invalidated per-authority on ledger
/// append via [`VerificationCache::invalidate_authority`] so a revocation
/// takes effect on the next gate call rather than waiting out the TTL.
pub struct VerificationCache {
    ttl: Duration,
    capacity: usize,
    entries: Mutex<HashMap<CacheKey, (CacheEntry, String)>>,
    order: Mutex<VecDeque<CacheKey>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

impl VerificationCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity,
            entries: Mutex::new(HashMap::new()),
            order: Mutex::new(VecDeque::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Runs the eight checks for `abp`, serving a cached verdict when one
    /// exists for `(abp.abp_id, abp.hash)` and is still within the TTL.
    pub fn gate(&self, abp: &Abp, ledger: &AuthorityLedger, at: DateTime<Utc>) -> CmResult<Vec<AbpCheckResult>> {
        let key = CacheKey { abp_id: abp.abp_id.clone(), hash: abp.hash.clone() };

        if let Some(hit) = self.lookup(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(hit);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let results = verify_abp(abp, ledger, at)?;
        self.insert(key, abp.authority_ref.clone(), results.clone());
        Ok(results)
    }

    /// Convenience wrapper over [`Self::gate`] that collapses the eight
    /// checks to the pass/fail the caller actually gates on.
    pub fn gate_pass(&self, abp: &Abp, ledger: &AuthorityLedger, at: DateTime<Utc>) -> CmResult<bool> {
        Ok(all_pass(&self.gate(abp, ledger, at)?))
    }

    fn lookup(&self, key: &CacheKey) -> Option<Vec<AbpCheckResult>> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some((entry, _)) if entry.inserted_at.elapsed() <= self.ttl => Some(entry.results.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn insert(&self, key: CacheKey, authority_ref: String, results: Vec<AbpCheckResult>) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut order = self.order.lock().unwrap_or_else(|e| e.into_inner());

        if !entries.contains_key(&key) && entries.len() >= self.capacity {
            if let Some(evicted) = order.pop_front() {
                entries.remove(&evicted);
            }
        }

        entries.insert(key.clone(), (CacheEntry { results, inserted_at: Instant::now() }, authority_ref));
        order.push_back(key);
    }

    /// Drops every cached verdict that was issued against `authority_ref`,
    /// called after any [`AuthorityLedger::append`] touching that actor so
    /// a revocation or re-grant is reflected on the next gate call.
    pub fn invalidate_authority(&self, authority_ref: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, (_, ar)| ar != authority_ref);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for VerificationCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(60), 256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build_abp, AbpConfig};
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
                effective_at: at - chrono::Duration::days(1),
                expires_at: None,
                revoked_at: None,
                signing_key_id: None,
                signature_ref: None,
                observed_at: at - chrono::Duration::days(1),
            })
            .unwrap();
        ledger
    }

    #[test]
    fn repeated_gate_calls_for_same_abp_are_served_from_cache() {
        let clock = Utc::now();
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_with_grant(&dir, "auth-1", clock);
        let abp = build_abp("finance", "auth-1", base_config(), clock).unwrap();

        let cache = VerificationCache::new(Duration::from_secs(60), 8);
        assert!(cache.gate_pass(&abp, &ledger, clock).unwrap());
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().hits, 0);
        assert!(cache.gate_pass(&abp, &ledger, clock).unwrap());
        assert_eq!(cache.stats().misses, 1);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn invalidate_authority_forces_a_fresh_check() {
        let clock = Utc::now();
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_with_grant(&dir, "auth-1", clock);
        let abp = build_abp("finance", "auth-1", base_config(), clock).unwrap();

        let cache = VerificationCache::new(Duration::from_secs(60), 8);
        assert!(cache.gate_pass(&abp, &ledger, clock).unwrap());
        cache.invalidate_authority("auth-1");
        assert!(cache.gate_pass(&abp, &ledger, clock).unwrap());
        assert_eq!(cache.stats().misses, 2);
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn capacity_evicts_least_recently_inserted_entry() {
        let clock = Utc::now();
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_with_grant(&dir, "auth-1", clock);
        let ledger2 = ledger_with_grant(&dir, "auth-1", clock);
        let abp_a = build_abp("finance", "auth-1", base_config(), clock).unwrap();
        let mut config_b = base_config();
        config_b.abp_version = "2".into();
        let abp_b = build_abp("ops", "auth-1", config_b, clock).unwrap();

        let cache = VerificationCache::new(Duration::from_secs(60), 1);
        cache.gate_pass(&abp_a, &ledger, clock).unwrap();
        cache.gate_pass(&abp_b, &ledger2, clock).unwrap();
        assert_eq!(cache.stats().misses, 2);

        // `abp_b` is still the sole resident and hits.
        cache.gate_pass(&abp_b, &ledger2, clock).unwrap();
        assert_eq!(cache.stats().hits, 1);
        // `abp_a` was evicted to make room for `abp_b`, so it misses again.
        cache.gate_pass(&abp_a, &ledger, clock).unwrap();
        assert_eq!(cache.stats().misses, 3);
    }
}
