//! Peer health state machine (spec §4.15): `ONLINE -> SUSPECT -> OFFLINE`
//! on consecutive failures, recovering after a run of consecutive
//! successes. Also derives the exponential retry backoff.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerState {
    Online,
    Suspect,
    Offline,
}

/// `{suspect_after_failures, offline_after_failures, recovery_successes,
/// max_retries, backoff_base}` (spec §6 environment/config, §4.15).
#[derive(Debug, Clone, Copy)]
pub struct PeerHealthConfig {
    pub suspect_after_failures: u32,
    pub offline_after_failures: u32,
    pub recovery_successes: u32,
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl Default for PeerHealthConfig {
    fn default() -> Self {
        Self {
            suspect_after_failures: 2,
            offline_after_failures: 5,
            recovery_successes: 3,
            max_retries: 5,
            backoff_base: Duration::from_millis(250),
        }
    }
}

/// Tracks one peer's health across calls. Not `Sync`; callers hold one
/// instance per peer behind their own synchronization (spec §5: "its own
/// worker pool with peer-health state").
#[derive(Debug, Clone)]
pub struct PeerHealth {
    peer_id: String,
    config: PeerHealthConfig,
    state: PeerState,
    consecutive_failures: u32,
    consecutive_successes: u32,
}

impl PeerHealth {
    pub fn new(peer_id: impl Into<String>, config: PeerHealthConfig) -> Self {
        Self {
            peer_id: peer_id.into(),
            config,
            state: PeerState::Online,
            consecutive_failures: 0,
            consecutive_successes: 0,
        }
    }

    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    pub fn state(&self) -> PeerState {
        self.state
    }

    /// Records a successful call. Recovery from `SUSPECT`/`OFFLINE` to
    /// `ONLINE` requires `recovery_successes` consecutive successes.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.consecutive_successes += 1;
        if self.state != PeerState::Online
            && self.consecutive_successes >= self.config.recovery_successes
        {
            self.state = PeerState::Online;
        }
    }

    /// Records a failed call and advances the state machine.
    pub fn record_failure(&mut self) {
        self.consecutive_successes = 0;
        self.consecutive_failures += 1;
        if self.consecutive_failures >= self.config.offline_after_failures {
            self.state = PeerState::Offline;
        } else if self.consecutive_failures >= self.config.suspect_after_failures {
            self.state = PeerState::Suspect;
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Exponential backoff for retry attempt `attempt` (0-indexed):
    /// `backoff_base * 2^attempt`.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        self.config.backoff_base.saturating_mul(1u32 << attempt.min(20))
    }

    pub fn max_retries(&self) -> u32 {
        self.config.max_retries
    }
}
