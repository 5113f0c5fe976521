//! Destination for flushed simulation events.

use ls_core::{SimEvent, SimTime};

use crate::{EpochReport, RunReport};

/// Receives the simulation output from [`Coordinator`][crate::Coordinator].
///
/// `handle_events` is called once per epoch with that epoch's events, sorted
/// by time.  Across the whole run the concatenation of every batch is
/// non-decreasing in time.  The remaining hooks default to no-ops.
///
/// # Example: arrival counter
///
/// ```rust,ignore
/// struct Arrivals(usize);
///
/// impl EventSink for Arrivals {
///     fn handle_events(&mut self, events: &[SimEvent]) {
///         self.0 += events.iter().filter(|e| e.kind == EventKind::Arrive).count();
///     }
/// }
/// ```
pub trait EventSink {
    /// Called before the first sub-round of each epoch.
    fn on_epoch_start(&mut self, _epoch: u64, _till: SimTime) {}

    /// One epoch's worth of events in flush order.  May be empty.
    fn handle_events(&mut self, events: &[SimEvent]);

    /// Called after `handle_events` for the same epoch.
    fn on_epoch_end(&mut self, _report: &EpochReport) {}

    /// Called once when the run finishes.
    fn on_sim_end(&mut self, _report: &RunReport) {}
}

/// Discards everything.
pub struct NoopSink;

impl EventSink for NoopSink {
    fn handle_events(&mut self, _events: &[SimEvent]) {}
}

/// Keeps every flushed event and epoch report in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub events: Vec<SimEvent>,
    pub epochs: Vec<EpochReport>,
    pub run:    Option<RunReport>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for CollectingSink {
    fn handle_events(&mut self, events: &[SimEvent]) {
        self.events.extend_from_slice(events);
    }

    fn on_epoch_end(&mut self, report: &EpochReport) {
        self.epochs.push(report.clone());
    }

    fn on_sim_end(&mut self, report: &RunReport) {
        self.run = Some(report.clone());
    }
}
