//! Node configuration (spec §6 "Environment/config"). Read from the
//! environment with the same `ENV_VAR` naming the teacher's CLI configs
//! use, every option defaulted so a node boots with no configuration at
//! all for local scenario runs.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{CmResult, CredMeshError, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoBackend {
    Ed25519A,
    Ed25519B,
    HmacDemo,
}

impl CryptoBackend {
    fn parse(raw: &str) -> CmResult<Self> {
        match raw {
            "ed25519_a" => Ok(Self::Ed25519A),
            "ed25519_b" => Ok(Self::Ed25519B),
            "hmac_demo" => Ok(Self::HmacDemo),
            other => Err(CredMeshError::new(
                ErrorKind::InputInvalid,
                format!("unknown crypto_backend: {other}"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMode {
    System,
    Fixed,
}

/// `{tenant_id, node_id, node_role, storage_root, crypto_backend,
/// peer_urls[], max_retries, backoff_base, suspect_after_failures,
/// offline_after_failures, recovery_successes, scoring_policy_hash,
/// clock_mode, fixed_clock?}` (spec §6).
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub tenant_id: String,
    pub node_id: String,
    pub node_role: String,
    pub storage_root: PathBuf,
    pub crypto_backend: CryptoBackend,
    pub peer_urls: Vec<String>,
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub suspect_after_failures: u32,
    pub offline_after_failures: u32,
    pub recovery_successes: u32,
    pub scoring_policy_hash: Option<String>,
    pub clock_mode: ClockMode,
    pub fixed_clock: Option<DateTime<Utc>>,
}

impl NodeConfig {
    /// Reads every recognized option from the process environment,
    /// defaulting anything absent. `CREDMESH_` prefixed to avoid clashing
    /// with unrelated host environment variables.
    pub fn from_env() -> CmResult<Self> {
        let tenant_id = env_or("CREDMESH_TENANT_ID", "default");
        let node_id = env_or("CREDMESH_NODE_ID", "node-1");
        let node_role = env_or("CREDMESH_NODE_ROLE", "edge");
        let storage_root = PathBuf::from(env_or("CREDMESH_STORAGE_ROOT", "./credmesh-data"));
        let crypto_backend = CryptoBackend::parse(&env_or("CREDMESH_CRYPTO_BACKEND", "ed25519_a"))?;
        let peer_urls = std::env::var("CREDMESH_PEER_URLS")
            .ok()
            .map(|raw| raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect())
            .unwrap_or_default();
        let max_retries = env_parse_or("CREDMESH_MAX_RETRIES", 5)?;
        let backoff_base = Duration::from_millis(env_parse_or("CREDMESH_BACKOFF_BASE_MS", 250)?);
        let suspect_after_failures = env_parse_or("CREDMESH_SUSPECT_AFTER_FAILURES", 2)?;
        let offline_after_failures = env_parse_or("CREDMESH_OFFLINE_AFTER_FAILURES", 5)?;
        let recovery_successes = env_parse_or("CREDMESH_RECOVERY_SUCCESSES", 3)?;
        let scoring_policy_hash = std::env::var("CREDMESH_SCORING_POLICY_HASH").ok();

        let clock_mode_raw = env_or("CREDMESH_CLOCK_MODE", "system");
        let (clock_mode, fixed_clock) = match clock_mode_raw.as_str() {
            "system" => (ClockMode::System, None),
            "fixed" => {
                let raw = std::env::var("CREDMESH_FIXED_CLOCK").map_err(|_| {
                    CredMeshError::new(ErrorKind::InputInvalid, "clock_mode=fixed requires CREDMESH_FIXED_CLOCK")
                })?;
                let parsed = DateTime::parse_from_rfc3339(&raw)
                    .map_err(|e| CredMeshError::new(ErrorKind::InputInvalid, e.to_string()))?
                    .with_timezone(&Utc);
                (ClockMode::Fixed, Some(parsed))
            }
            other => {
                return Err(CredMeshError::new(
                    ErrorKind::InputInvalid,
                    format!("unknown clock_mode: {other}"),
                ))
            }
        };

        Ok(Self {
            tenant_id,
            node_id,
            node_role,
            storage_root,
            crypto_backend,
            peer_urls,
            max_retries,
            backoff_base,
            suspect_after_failures,
            offline_after_failures,
            recovery_successes,
            scoring_policy_hash,
            clock_mode,
            fixed_clock,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse_or(key: &str, default: u64) -> CmResult<u32> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u32>()
            .map_err(|e| CredMeshError::new(ErrorKind::InputInvalid, format!("{key}: {e}"))),
        Err(_) => Ok(default as u32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_with_no_environment_set() {
        for key in [
            "CREDMESH_TENANT_ID",
            "CREDMESH_NODE_ID",
            "CREDMESH_CLOCK_MODE",
            "CREDMESH_FIXED_CLOCK",
        ] {
            std::env::remove_var(key);
        }
        let config = NodeConfig::from_env().unwrap();
        assert_eq!(config.tenant_id, "default");
        assert_eq!(config.clock_mode, ClockMode::System);
    }
}
