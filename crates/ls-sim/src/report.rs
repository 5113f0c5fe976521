//! Per-epoch and per-run statistics.

use ls_core::SimTime;

/// What one epoch did.  Passed to [`EventSink::on_epoch_end`][crate::EventSink::on_epoch_end].
#[derive(Clone, Debug, PartialEq)]
pub struct EpochReport {
    /// Zero-based epoch number.
    pub epoch:          u64,
    /// Upper bound (inclusive) of the event times processed this epoch.
    pub till:           SimTime,
    pub sub_rounds:     u32,
    /// Sink events handed to the sink at the end of the epoch.
    pub events_flushed: usize,
    /// `Enter` events routed between workers.
    pub cross_events:   usize,
    /// Vehicles that completed their route this epoch.
    pub arrivals:       usize,
}

/// Totals over a whole run.  Passed to [`EventSink::on_sim_end`][crate::EventSink::on_sim_end].
#[derive(Clone, Debug, PartialEq, Default)]
pub struct RunReport {
    pub epochs:         u64,
    pub sub_rounds:     u64,
    pub events_flushed: u64,
    pub cross_events:   u64,
    /// Time of the last flushed event; zero if nothing happened.
    pub final_time:     SimTime,
    /// Vehicles that reached the end of their route.
    pub arrived:        usize,
    /// Vehicles still en route or not yet departed when the run stopped.
    /// Non-zero only when an `end_time` cut the run short.
    pub in_flight:      usize,
}

impl RunReport {
    /// `true` if every trip ran to completion.
    pub fn is_complete(&self) -> bool {
        self.in_flight == 0
    }
}
