//! Validator role (spec §4.6): verifies peer envelopes, emits verdicts.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use credmesh_crypto::registry::KeyRegistry;
use credmesh_storage::log_store::LogStore;
use credmesh_types::model::{Envelope, RejectionReason, Validation, Verdict};

use crate::error::CmResult;

/// Maximum envelope age accepted before a `STALE_TIMESTAMP` rejection.
pub const MAX_ENVELOPE_AGE: Duration = Duration::minutes(5);

pub trait PolicyGate {
    /// Returns `Some(reason-detail)` to deny, `None` to allow.
    fn check(&self, envelope: &Envelope) -> Option<String>;
}

pub struct AllowAll;
impl PolicyGate for AllowAll {
    fn check(&self, _envelope: &Envelope) -> Option<String> {
        None
    }
}

pub struct Validator {
    validator_node_id: String,
    keys: Arc<KeyRegistry>,
    policy: Arc<dyn PolicyGate + Send + Sync>,
    log: LogStore,
    seen: std::sync::Mutex<HashSet<(String, String)>>,
}

impl Validator {
    pub fn new(
        validator_node_id: impl Into<String>,
        keys: Arc<KeyRegistry>,
        policy: Arc<dyn PolicyGate + Send + Sync>,
        log: LogStore,
    ) -> Self {
        Self {
            validator_node_id: validator_node_id.into(),
            keys,
            policy,
            log,
            seen: std::sync::Mutex::new(HashSet::new()),
        }
    }

    /// Verifies signature, checks payload integrity and policy, and emits
    /// a `Validation` — deduplicated by `(envelope_id, validator_node_id)`
    /// (spec §4.6). Returns `Ok(None)` for a duplicate without re-emitting.
    pub fn validate(&self, envelope: &Envelope, now: DateTime<Utc>) -> CmResult<Option<Validation>> {
        let dedupe_key = (envelope.envelope_id.clone(), self.validator_node_id.clone());
        {
            let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
            if !seen.insert(dedupe_key) {
                return Ok(None);
            }
        }

        let signature = match hex::decode(&envelope.signature) {
            Ok(bytes) => bytes,
            Err(_) => {
                return self.emit(envelope, Verdict::Reject, Some(RejectionReason::BadSignature), now);
            }
        };

        let sig_valid = self
            .keys
            .verify(&envelope.key_id, envelope.payload_hash.as_bytes(), &signature)
            .unwrap_or(false);
        if !sig_valid {
            return self.emit(envelope, Verdict::Reject, Some(RejectionReason::BadSignature), now);
        }

        if now.signed_duration_since(envelope.timestamp) > MAX_ENVELOPE_AGE {
            return self.emit(envelope, Verdict::Reject, Some(RejectionReason::StaleTimestamp), now);
        }

        if self.policy.check(envelope).is_some() {
            return self.emit(envelope, Verdict::Reject, Some(RejectionReason::PolicyDeny), now);
        }

        self.emit(envelope, Verdict::Accept, None, now)
    }

    fn emit(
        &self,
        envelope: &Envelope,
        verdict: Verdict,
        reason: Option<RejectionReason>,
        now: DateTime<Utc>,
    ) -> CmResult<Option<Validation>> {
        let validation = Validation {
            envelope_id: envelope.envelope_id.clone(),
            validator_node_id: self.validator_node_id.clone(),
            verdict,
            reason,
            validated_at: now,
        };
        self.log.append(&validation)?;
        Ok(Some(validation))
    }
}
