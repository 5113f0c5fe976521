//! Run configuration.

use std::time::Duration;

use crate::{LsError, LsResult, SimTime};

/// Top-level simulation configuration.
///
/// Typically built by the application crate (or deserialized with the
/// `serde` feature) and handed to the coordinator builder.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Simulated seconds per epoch: `till_time = min(worker clocks) +
    /// sync_interval`.  Larger values mean fewer barriers; `0.0` runs the
    /// workers in lock-step, one timestamp per epoch.
    pub sync_interval: f64,

    /// Worker pool size.  `None` uses one thread per cluster.
    pub num_threads: Option<usize>,

    /// Longest the coordinator waits for every worker to finish one barrier
    /// phase.  Expiry is fatal.  `None` waits indefinitely.
    pub barrier_timeout: Option<Duration>,

    /// Sub-rounds allowed per epoch before the run is declared divergent.
    pub max_sub_rounds: u32,

    /// Stop after the first epoch whose boundary reaches this time, even if
    /// vehicles are still en route.  `None` runs until every queue drains.
    pub end_time: Option<SimTime>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            sync_interval:   60.0,
            num_threads:     None,
            barrier_timeout: Some(Duration::from_secs(300)),
            max_sub_rounds:  10_000,
            end_time:        None,
        }
    }
}

impl SimConfig {
    /// Default configuration with the given epoch length.
    pub fn with_sync_interval(sync_interval: f64) -> Self {
        Self { sync_interval, ..Self::default() }
    }

    /// Reject values the coordinator cannot run with.
    pub fn validate(&self) -> LsResult<()> {
        if !self.sync_interval.is_finite() || self.sync_interval < 0.0 {
            return Err(LsError::Config(format!(
                "sync_interval must be finite and >= 0, got {}",
                self.sync_interval
            )));
        }
        if self.num_threads == Some(0) {
            return Err(LsError::Config("num_threads must be at least 1".into()));
        }
        if self.barrier_timeout == Some(Duration::ZERO) {
            return Err(LsError::Config("barrier_timeout must be non-zero".into()));
        }
        if self.max_sub_rounds == 0 {
            return Err(LsError::Config("max_sub_rounds must be at least 1".into()));
        }
        if let Some(end) = self.end_time {
            if !end.is_valid_input() {
                return Err(LsError::Config(format!("end_time must be finite and >= 0, got {end}")));
            }
        }
        Ok(())
    }
}
