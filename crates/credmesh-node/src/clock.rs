//! Clock abstraction honoring `clock_mode` (spec §6, §8 determinism
//! invariants): a `fixed` clock lets scenario runs and golden tests
//! reproduce identical hashes across runs.

use chrono::{DateTime, Utc};

use crate::config::{ClockMode, NodeConfig};

#[derive(Debug, Clone, Copy)]
pub enum Clock {
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    pub fn from_config(config: &NodeConfig) -> Self {
        match config.clock_mode {
            ClockMode::System => Clock::System,
            ClockMode::Fixed => Clock::Fixed(config.fixed_clock.unwrap_or_else(Utc::now)),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(at) => *at,
        }
    }
}
