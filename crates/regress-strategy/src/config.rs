//! Tunables shared by all strategies.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_SEQUENCE_LIMIT: usize = 10_000;
pub const DEFAULT_POLL_ATTEMPTS: u32 = 10;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3_000;
pub const DEFAULT_PROBE_WIDTH: usize = 6;
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 30_000;

/// Strategy configuration, typically the `[strategy]` table of a run file.
///
/// Every field has a default, so an empty table is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Maximum number of considered states in the coverage pass (0 = unbounded).
    pub sequence_limit: usize,
    /// How often the pinpoint pass re-reads results while evaluations are pending.
    pub poll_attempts: u32,
    pub poll_interval_ms: u64,
    /// Number of availability probes in flight at once.
    pub probe_width: usize,
    pub probe_timeout_ms: u64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            sequence_limit: DEFAULT_SEQUENCE_LIMIT,
            poll_attempts: DEFAULT_POLL_ATTEMPTS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            probe_width: DEFAULT_PROBE_WIDTH,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
        }
    }
}

impl StrategyConfig {
    pub fn with_sequence_limit(mut self, limit: usize) -> Self {
        self.sequence_limit = limit;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// At least one attempt is always made.
    pub fn effective_poll_attempts(&self) -> u32 {
        self.poll_attempts.max(1)
    }

    pub fn effective_probe_width(&self) -> usize {
        self.probe_width.max(1)
    }
}
