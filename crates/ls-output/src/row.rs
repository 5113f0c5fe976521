//! Plain data row types written by output backends.

use ls_core::SimEvent;
use ls_sim::EpochReport;

/// One flushed simulation event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventRow {
    /// Seconds since simulation start.
    pub time:       f64,
    pub vehicle_id: u32,
    pub link_id:    u32,
    /// Position of `link_id` in the vehicle's route.
    pub leg:        u32,
    /// `depart`, `enter`, `leave` or `arrive`.
    pub kind:       &'static str,
}

impl From<&SimEvent> for EventRow {
    fn from(e: &SimEvent) -> Self {
        Self {
            time:       e.time.secs(),
            vehicle_id: e.vehicle.0,
            link_id:    e.link.0,
            leg:        e.leg,
            kind:       e.kind.as_str(),
        }
    }
}

/// Statistics for one epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochSummaryRow {
    pub epoch:          u64,
    pub till_time:      f64,
    pub sub_rounds:     u32,
    pub events_flushed: u64,
    pub cross_events:   u64,
    pub arrivals:       u64,
}

impl From<&EpochReport> for EpochSummaryRow {
    fn from(r: &EpochReport) -> Self {
        Self {
            epoch:          r.epoch,
            till_time:      r.till.secs(),
            sub_rounds:     r.sub_rounds,
            events_flushed: r.events_flushed as u64,
            cross_events:   r.cross_events as u64,
            arrivals:       r.arrivals as u64,
        }
    }
}
