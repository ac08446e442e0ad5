//! Small shared enums and helpers used across the data model (spec §3).

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Evidence/source reliability tier. Lower is more authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Tier0,
    Tier1,
    Tier2,
    Tier3,
}

impl Tier {
    pub fn as_u8(self) -> u8 {
        match self {
            Tier::Tier0 => 0,
            Tier::Tier1 => 1,
            Tier::Tier2 => 2,
            Tier::Tier3 => 3,
        }
    }
}

/// Evidence node status (spec §3, Evidence Node).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceStatus {
    Ok,
    Degraded,
    Unknown,
    Failed,
    Maintenance,
}

/// Whether evidence was pulled by a trusted validator or merely asserted.
/// Supplements the distilled confidence scalar (SPEC_FULL §4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrustLane {
    #[default]
    Verified,
    Asserted,
}

/// Evidence mode: collected directly, or derived from other evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceMode {
    Direct,
    Derived,
}

/// Source liveness status (spec §3, Source).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Active,
    Degraded,
    Quarantined,
    Offline,
}

/// Claim truth type (spec §3, Claim).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruthType {
    Observation,
    Inference,
    Assumption,
    Forecast,
    Norm,
    Constraint,
}

impl TruthType {
    /// Only `norm`/`constraint` claims may declare a perpetual (zero)
    /// half-life (spec §4.9, §8 boundary behaviors).
    pub fn allows_perpetual_half_life(self) -> bool {
        matches!(self, TruthType::Norm | TruthType::Constraint)
    }
}

/// Derived status light for a claim (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLight {
    Green,
    Yellow,
    Red,
}

impl StatusLight {
    /// Ordering used by the "status monotonic under contradiction"
    /// invariant (spec §8.6): Green > Yellow > Red.
    pub fn rank(self) -> u8 {
        match self {
            StatusLight::Green => 2,
            StatusLight::Yellow => 1,
            StatusLight::Red => 0,
        }
    }
}

/// Serializes a `DateTime<Utc>` as millisecond-precision ISO-8601 with a
/// literal `Z` suffix, per the canonical serializer's date rule (§4.1).
pub mod ts {
    use super::*;

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

pub mod ts_opt {
    use super::*;

    pub fn serialize<S>(dt: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match dt {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s: Option<String> = Option::deserialize(deserializer)?;
        match s {
            Some(s) => DateTime::parse_from_rfc3339(&s)
                .map(|dt| Some(dt.with_timezone(&Utc)))
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

/// Canonical UTC "now", millisecond-truncated so re-serialization is stable.
pub fn now_ms() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}
