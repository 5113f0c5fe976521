//! The simulation event: the unit exchanged between workers and the unit
//! flushed to the external sink.

use std::fmt;

use crate::{LinkId, SimTime, VehicleId};

/// What happened to a vehicle on a link.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    /// The vehicle starts its trip on the first link of its route.  Seeded by
    /// the owning worker at `init`; processed like an entry.
    Depart,
    /// The vehicle enters a link from the previous link of its route.
    Enter,
    /// The vehicle reaches the end of a link.
    Leave,
    /// The vehicle finished the last link of its route.  Only ever emitted
    /// to the sink, never queued.
    Arrive,
}

impl EventKind {
    /// Label used in output files.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Depart => "depart",
            EventKind::Enter  => "enter",
            EventKind::Leave  => "leave",
            EventKind::Arrive => "arrive",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A timestamped vehicle transition on a link.
///
/// `leg` is the position of `link` within the vehicle's route, so whichever
/// worker processes the event can find the next link without searching the
/// route (routes may revisit a link).
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimEvent {
    pub time:    SimTime,
    pub link:    LinkId,
    pub vehicle: VehicleId,
    pub leg:     u32,
    pub kind:    EventKind,
}

impl SimEvent {
    #[inline]
    pub fn new(time: SimTime, link: LinkId, vehicle: VehicleId, leg: u32, kind: EventKind) -> Self {
        Self { time, link, vehicle, leg, kind }
    }

    /// The same vehicle and leg, re-stamped as a different kind at `time`.
    #[inline]
    pub fn with(self, time: SimTime, kind: EventKind) -> Self {
        Self { time, kind, ..self }
    }
}

impl fmt::Display for SimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} on {}", self.time, self.vehicle, self.kind, self.link)
    }
}
