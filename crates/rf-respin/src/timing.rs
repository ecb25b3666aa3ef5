//! Rollup timing and stage timestamps

use serde::{Deserialize, Serialize};

use crate::config::RollupConfig;

/// Rollup duration override
///
/// Configured as a number: `0` computes the duration from the amount,
/// `-1` (any negative value) skips the rollup animation entirely, and a
/// positive value is an explicit duration in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub enum RollupDuration {
    #[default]
    Auto,
    Skip,
    Seconds(f64),
}

impl From<f64> for RollupDuration {
    fn from(value: f64) -> Self {
        if value < 0.0 {
            Self::Skip
        } else if value == 0.0 || !value.is_finite() {
            Self::Auto
        } else {
            Self::Seconds(value)
        }
    }
}

impl From<RollupDuration> for f64 {
    fn from(duration: RollupDuration) -> Self {
        match duration {
            RollupDuration::Auto => 0.0,
            RollupDuration::Skip => -1.0,
            RollupDuration::Seconds(s) => s,
        }
    }
}

impl RollupConfig {
    /// Rollup duration for an amount in milliseconds, `None` when skipped
    pub fn duration_ms(&self, amount: u64) -> Option<f64> {
        match self.duration {
            RollupDuration::Skip => None,
            RollupDuration::Seconds(s) => Some(s * 1000.0),
            RollupDuration::Auto => {
                if self.speed <= 0.0 {
                    return Some(self.min_seconds * 1000.0);
                }
                let seconds = (amount as f64 / self.speed).clamp(self.min_seconds, self.max_seconds);
                Some(seconds * 1000.0)
            }
        }
    }
}

/// Timestamp generator for sequential stage events
#[derive(Debug, Clone)]
pub struct Timeline {
    current_ms: f64,
    min_event_interval_ms: f64,
}

impl Timeline {
    /// Create new timeline
    pub fn new(min_event_interval_ms: f64) -> Self {
        Self {
            current_ms: 0.0,
            min_event_interval_ms,
        }
    }

    /// Reset to zero
    pub fn reset(&mut self) {
        self.current_ms = 0.0;
    }

    /// Get current timestamp
    pub fn current(&self) -> f64 {
        self.current_ms
    }

    /// Advance by duration and return new timestamp
    pub fn advance(&mut self, duration_ms: f64) -> f64 {
        self.current_ms += duration_ms.max(self.min_event_interval_ms);
        self.current_ms
    }

    /// Advance by the minimum interval
    pub fn step(&mut self) -> f64 {
        self.advance(0.0)
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(50.0)
    }
}
