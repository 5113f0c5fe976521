//! The cluster worker and its event-processing loop.

use std::collections::BTreeMap;

use tracing::trace;

use ls_core::{EventKind, LinkId, SimEvent, SimTime, WorkerId};
use ls_network::Scenario;

use crate::{EventQueue, LinkState, WorkerError, WorkerResult};

/// Lifecycle of a worker.
///
/// ```text
/// Uninitialized ──init──▶ Active ──queue drained──▶ Draining
///                 └─────▶ Idle (nothing seeded)
/// Idle / Draining ──accept_events(non-empty)──▶ Active
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum WorkerPhase {
    /// Constructed; `init` not yet called.  Clock reads infinity.
    Uninitialized,
    /// Initialized with nothing to do so far.
    Idle,
    /// At least one pending event; clock is finite.
    Active,
    /// Ran out of pending events.  Revived by newly accepted events.
    Draining,
}

/// What one `process_queued_events` call hands back to the coordinator.
#[derive(Debug, Default)]
pub struct SubRoundOutput {
    /// Observable events, in processing order.
    pub sink: Vec<SimEvent>,
    /// `Enter` events for links owned by other workers, keyed by owner.
    /// Per-destination order is processing order.
    pub outbound: BTreeMap<WorkerId, Vec<SimEvent>>,
    /// Events popped from the queue.
    pub processed: usize,
}

impl SubRoundOutput {
    pub fn outbound_len(&self) -> usize {
        self.outbound.values().map(Vec::len).sum()
    }
}

/// Running counters over the life of a worker.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    pub processed:    u64,
    pub emitted:      u64,
    pub sent:         u64,
    pub received:     u64,
    /// Times an accepted batch moved the clock backwards.
    pub clock_resets: u64,
}

/// Owns one cluster of links and advances it event by event.
///
/// The worker only ever reads the shared [`Scenario`] (passed to each call)
/// and mutates its own fields, so different workers can run on different
/// threads without synchronisation.
#[derive(Debug)]
pub struct Worker {
    id:       WorkerId,
    /// Cluster links; position = local slot in the owner index.
    links:    Vec<LinkId>,
    /// Indexed by local slot.
    states:   Vec<LinkState>,
    /// `Depart` events for trips starting on this cluster, drained by `init`.
    seeds:    Vec<SimEvent>,
    queue:    EventQueue,
    min_time: SimTime,
    phase:    WorkerPhase,
    stats:    WorkerStats,
}

impl Worker {
    /// Build the worker for `id`'s cluster: one [`LinkState`] per owned link
    /// and a `Depart` seed for every trip whose first link it owns, in demand
    /// order.
    pub fn new(id: WorkerId, scenario: &Scenario) -> Self {
        let links = scenario.partition().cluster(id).to_vec();
        let states = links.iter().map(|&l| LinkState::new(l)).collect();
        let seeds = scenario
            .demand()
            .iter()
            .filter_map(|trip| {
                let first = trip.first_link()?;
                (scenario.owner(first) == Some(id))
                    .then(|| SimEvent::new(trip.departure, first, trip.vehicle, 0, EventKind::Depart))
            })
            .collect();

        Self {
            id,
            links,
            states,
            seeds,
            queue:    EventQueue::new(),
            min_time: SimTime::INFINITY,
            phase:    WorkerPhase::Uninitialized,
            stats:    WorkerStats::default(),
        }
    }

    // ── Protocol ──────────────────────────────────────────────────────────

    /// Seed the queue with every trip start on this cluster and set the
    /// clock to the earliest one.  Calling it again is a no-op.
    pub fn init(&mut self) {
        if self.phase != WorkerPhase::Uninitialized {
            return;
        }
        for event in self.seeds.drain(..) {
            self.queue.push(event);
        }
        self.min_time = self.queue.next_time();
        self.phase = if self.queue.is_empty() { WorkerPhase::Idle } else { WorkerPhase::Active };
    }

    /// Drain and process every queued event with `time <= till`, in queue
    /// order.  Events after `till` stay queued.
    ///
    /// - `Depart` / `Enter`: the vehicle joins the link; its leave time is
    ///   `time + travel_time(volume found on the link)`.
    /// - `Leave`: the vehicle exits; an `Enter` for the next route link is
    ///   queued here if this worker owns it, returned in `outbound`
    ///   otherwise, and an `Arrive` is emitted if the route is done.
    pub fn process_queued_events(
        &mut self,
        scenario: &Scenario,
        till:     SimTime,
    ) -> WorkerResult<SubRoundOutput> {
        if self.phase == WorkerPhase::Uninitialized {
            return Err(WorkerError::NotInitialized(self.id));
        }

        let mut out = SubRoundOutput::default();
        while let Some(event) = self.queue.pop_due(till) {
            self.process(scenario, event, &mut out)?;
            out.processed += 1;
        }

        self.min_time = self.queue.next_time();
        if self.queue.is_empty() && (out.processed > 0 || self.phase == WorkerPhase::Active) {
            self.phase = WorkerPhase::Draining;
        }

        self.stats.processed += out.processed as u64;
        self.stats.emitted += out.sink.len() as u64;
        self.stats.sent += out.outbound_len() as u64;

        trace!(
            worker = self.id.0,
            processed = out.processed,
            sent = out.outbound_len(),
            till = %till,
            min_time = %self.min_time,
            "processed queued events"
        );
        Ok(out)
    }

    /// Queue events routed here by other workers, in the given order, and
    /// recompute the clock.  A non-empty batch revives an `Idle` or
    /// `Draining` worker.
    pub fn accept_events(&mut self, scenario: &Scenario, events: Vec<SimEvent>) -> WorkerResult<()> {
        if self.phase == WorkerPhase::Uninitialized {
            return Err(WorkerError::NotInitialized(self.id));
        }
        if events.is_empty() {
            return Ok(());
        }

        for event in &events {
            if event.kind == EventKind::Arrive {
                return Err(WorkerError::UnexpectedKind { vehicle: event.vehicle, kind: event.kind });
            }
            self.local_slot(scenario, event.link)?;
        }

        let previous = self.min_time;
        self.stats.received += events.len() as u64;
        for event in events {
            self.queue.push(event);
        }
        self.min_time = self.queue.next_time();
        if previous.is_finite() && self.min_time < previous {
            self.stats.clock_resets += 1;
        }
        self.phase = WorkerPhase::Active;
        Ok(())
    }

    // ── Event handling ────────────────────────────────────────────────────

    fn process(
        &mut self,
        scenario: &Scenario,
        event:    SimEvent,
        out:      &mut SubRoundOutput,
    ) -> WorkerResult<()> {
        let local = self.local_slot(scenario, event.link)?;
        let trip = scenario
            .demand()
            .trip(event.vehicle)
            .ok_or(WorkerError::UnknownVehicle(event.vehicle))?;
        if trip.link_at(event.leg) != Some(event.link) {
            return Err(WorkerError::LegMismatch {
                vehicle: event.vehicle,
                leg:     event.leg,
                link:    event.link,
            });
        }

        match event.kind {
            EventKind::Depart | EventKind::Enter => {
                let observed = self.states[local].enter();
                let travel = scenario.network().travel_time(event.link, observed);
                out.sink.push(event);
                self.queue.push(event.with(event.time + travel, EventKind::Leave));
            }

            EventKind::Leave => {
                self.states[local].leave().ok_or(WorkerError::VolumeUnderflow {
                    vehicle: event.vehicle,
                    link:    event.link,
                })?;
                out.sink.push(event);

                let next_leg = event.leg + 1;
                match trip.link_at(next_leg) {
                    None => out.sink.push(event.with(event.time, EventKind::Arrive)),
                    Some(next) => {
                        let enter = SimEvent::new(event.time, next, event.vehicle, next_leg, EventKind::Enter);
                        // Scenario validation guarantees every route link has an owner.
                        let owner = scenario.owner(next).ok_or(WorkerError::NotOwned {
                            worker: self.id,
                            link:   next,
                        })?;
                        if owner == self.id {
                            self.queue.push(enter);
                        } else {
                            out.outbound.entry(owner).or_default().push(enter);
                        }
                    }
                }
            }

            EventKind::Arrive => {
                return Err(WorkerError::UnexpectedKind { vehicle: event.vehicle, kind: event.kind });
            }
        }
        Ok(())
    }

    /// Position of `link` in this worker's state array, or `NotOwned`.
    #[inline]
    fn local_slot(&self, scenario: &Scenario, link: LinkId) -> WorkerResult<usize> {
        match scenario.slot(link) {
            Some(slot) if slot.worker == self.id => Ok(slot.local as usize),
            _ => Err(WorkerError::NotOwned { worker: self.id, link }),
        }
    }

    // ── Inspection ────────────────────────────────────────────────────────

    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Earliest pending event time; [`SimTime::INFINITY`] when idle.
    pub fn min_time(&self) -> SimTime {
        self.min_time
    }

    pub fn phase(&self) -> WorkerPhase {
        self.phase
    }

    pub fn links(&self) -> &[LinkId] {
        &self.links
    }

    pub fn link_states(&self) -> &[LinkState] {
        &self.states
    }

    /// State of `link` if this worker owns it.
    pub fn link_state(&self, scenario: &Scenario, link: LinkId) -> Option<&LinkState> {
        let slot = self.local_slot(scenario, link).ok()?;
        self.states.get(slot)
    }

    /// Vehicles currently on this worker's links.
    pub fn vehicles_on_links(&self) -> u64 {
        self.states.iter().map(|s| u64::from(s.volume)).sum()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    pub fn stats(&self) -> WorkerStats {
        self.stats
    }
}
