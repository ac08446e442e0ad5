//! Evidence Node and Source (spec §3).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::common::{ts, EvidenceMode, EvidenceStatus, SourceStatus, Tier, TrustLane};

/// A single piece of evidence backing a claim.
///
/// Invariants (spec §3): `event_time <= ingest_time`; `ttl > 0` (evidence has
/// no perpetual exemption — only `norm`/`constraint` *claims* may be
/// perpetual).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceNode {
    pub element_id: String,
    pub status: EvidenceStatus,
    pub tier: Tier,
    #[serde(with = "ts")]
    pub event_time: DateTime<Utc>,
    #[serde(with = "ts")]
    pub ingest_time: DateTime<Utc>,
    /// TTL in milliseconds; must be `> 0`.
    pub ttl_ms: i64,
    pub source_id: String,
    pub confidence: f64,
    pub signature: String,
    pub correlation_group: String,
    pub mode: EvidenceMode,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub lane: TrustLane,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EvidenceValidationError {
    #[error("event_time ({event_time}) must be <= ingest_time ({ingest_time})")]
    EventAfterIngest {
        event_time: String,
        ingest_time: String,
    },
    #[error("ttl_ms must be > 0, got {0}")]
    NonPositiveTtl(i64),
    #[error("confidence must be in [0,1], got {0}")]
    ConfidenceOutOfRange(f64),
}

impl EvidenceNode {
    pub fn validate(&self) -> Result<(), EvidenceValidationError> {
        if self.event_time > self.ingest_time {
            return Err(EvidenceValidationError::EventAfterIngest {
                event_time: self.event_time.to_rfc3339(),
                ingest_time: self.ingest_time.to_rfc3339(),
            });
        }
        if self.ttl_ms <= 0 {
            return Err(EvidenceValidationError::NonPositiveTtl(self.ttl_ms));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(EvidenceValidationError::ConfidenceOutOfRange(self.confidence));
        }
        Ok(())
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.ingest_time + Duration::milliseconds(self.ttl_ms)
    }

    pub fn is_expired_at(&self, at: DateTime<Utc>) -> bool {
        at > self.expires_at()
    }

    /// Per-tier default TTL in milliseconds (spec §4.9).
    pub fn default_ttl_ms_for_tier(tier: Tier) -> i64 {
        const MINUTE: i64 = 60_000;
        const HOUR: i64 = 60 * MINUTE;
        const DAY: i64 = 24 * HOUR;
        match tier {
            Tier::Tier0 => 30 * MINUTE,
            Tier::Tier1 => 12 * HOUR,
            Tier::Tier2 => 3 * DAY,
            Tier::Tier3 => 15 * DAY,
        }
    }
}

/// A data source contributing evidence (spec §3, Source).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub source_id: String,
    pub tier: Tier,
    pub correlation_group: String,
    pub domains: Vec<String>,
    pub evidence_count: u64,
    pub refresh_cadence_ms: i64,
    pub status: SourceStatus,
    /// Reliability tag used by the status-light rule (spec §4.4): a source
    /// is "high reliability" iff `tier` is 0 or 1 and `status == active`.
    pub reliability_high: bool,
}

impl Source {
    pub fn is_high_reliability(&self) -> bool {
        self.reliability_high
            && matches!(self.tier, Tier::Tier0 | Tier::Tier1)
            && self.status == SourceStatus::Active
    }
}
