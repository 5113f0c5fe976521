//! The `Coordinator` and its epoch loop.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use ls_core::{EventKind, SimConfig, SimEvent, SimTime, WorkerId};
use ls_network::Scenario;
use ls_worker::Worker;

use crate::barrier::{Barrier, Command, PhaseLabel, Reply};
use crate::{EpochReport, EventSink, RunReport, SimError, SimResult};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum State {
    /// Workers built, `init` not yet dispatched.
    Fresh,
    Running,
    /// Every clock is infinite, or the `end_time` horizon was reached.
    Finished,
    /// A barrier phase failed; the workers may be gone.
    Aborted,
}

#[derive(Default)]
struct Totals {
    sub_rounds:     u64,
    events_flushed: u64,
    cross_events:   u64,
    arrived:        usize,
}

/// Drives a set of [`Worker`]s through synchronized epochs.
///
/// Each epoch:
///
/// 1. `till = min(worker clocks) + sync_interval`.
/// 2. Sub-rounds until every clock is past `till`:
///    - every worker processes its events `<= till` (in parallel);
///    - cross-worker `Enter` events are grouped into one inbox per
///      destination, in source-worker order then emission order;
///    - every worker with a non-empty inbox accepts it (in parallel);
///    - the sub-round's sink events are appended in worker order.
/// 3. The epoch buffer is stable-sorted by time and flushed to the sink.
///
/// Ties in the flushed stream are therefore ordered by
/// `(time, sub-round, source worker, emission order)`.
///
/// # Agreement with a single-cluster run
///
/// A worker drains its own events up to `till` before `Enter`s routed to it
/// later in the epoch are seen, so with a volume-dependent delay a travel
/// time it has already computed may not count a vehicle that entered the
/// link earlier in simulated time.  The flushed stream matches a single-cluster run exactly when
/// `sync_interval` is `0.0` or the network uses
/// [`VolumeDelay::FREE_FLOW`][ls_network::VolumeDelay::FREE_FLOW].  Other
/// settings remain deterministic and time-ordered.
///
/// Create via [`CoordinatorBuilder`][crate::CoordinatorBuilder].
pub struct Coordinator {
    config:    SimConfig,
    scenario:  Arc<Scenario>,
    barrier:   Barrier,
    workers:   Vec<Worker>,
    state:     State,
    epoch:     u64,
    last_till: Option<SimTime>,
    last_time: SimTime,
    totals:    Totals,
}

impl Coordinator {
    pub(crate) fn new(
        config:   SimConfig,
        scenario: Arc<Scenario>,
        barrier:  Barrier,
        workers:  Vec<Worker>,
    ) -> Self {
        Self {
            config,
            scenario,
            barrier,
            workers,
            state:     State::Fresh,
            epoch:     0,
            last_till: None,
            last_time: SimTime::ZERO,
            totals:    Totals::default(),
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Run epochs until every worker's queue is empty (or the configured
    /// `end_time` is reached), then call [`EventSink::on_sim_end`].
    ///
    /// Any worker failure aborts the run and is returned; events of the
    /// failing epoch are never flushed.
    pub fn run<S: EventSink>(&mut self, sink: &mut S) -> SimResult<RunReport> {
        info!(
            workers = self.workers.len(),
            threads = self.barrier.thread_count(),
            trips = self.scenario.demand().len(),
            links = self.scenario.network().link_count(),
            sync_interval = self.config.sync_interval,
            "simulation starting"
        );

        while self.run_epoch(sink)?.is_some() {}

        let report = self.report();
        if !report.is_complete() {
            warn!(
                in_flight = report.in_flight,
                end_time = ?self.config.end_time,
                "run stopped at end_time with vehicles still en route"
            );
        }
        sink.on_sim_end(&report);
        info!(
            epochs = report.epochs,
            sub_rounds = report.sub_rounds,
            events = report.events_flushed,
            cross_events = report.cross_events,
            arrived = report.arrived,
            final_time = %report.final_time,
            "simulation finished"
        );
        Ok(report)
    }

    /// Run exactly one epoch and flush its events.
    ///
    /// Returns `Ok(None)` once there is nothing left to do.  Useful for
    /// tests and incremental stepping.
    pub fn run_epoch<S: EventSink>(&mut self, sink: &mut S) -> SimResult<Option<EpochReport>> {
        match self.state {
            State::Aborted => return Err(SimError::Aborted),
            State::Finished => return Ok(None),
            State::Fresh | State::Running => {}
        }
        let result = self.step(sink);
        if result.is_err() {
            self.state = State::Aborted;
        }
        result
    }

    /// Each worker's clock, indexed by `WorkerId`.
    pub fn min_times(&self) -> Vec<SimTime> {
        self.workers.iter().map(Worker::min_time).collect()
    }

    /// Smallest worker clock; [`SimTime::INFINITY`] when all queues are empty.
    pub fn global_min_time(&self) -> SimTime {
        self.workers.iter().map(Worker::min_time).min().unwrap_or(SimTime::INFINITY)
    }

    pub fn worker(&self, id: WorkerId) -> Option<&Worker> {
        self.workers.get(id.index())
    }

    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Epochs completed so far.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn thread_count(&self) -> usize {
        self.barrier.thread_count()
    }

    /// Totals so far.
    pub fn report(&self) -> RunReport {
        RunReport {
            epochs:         self.epoch,
            sub_rounds:     self.totals.sub_rounds,
            events_flushed: self.totals.events_flushed,
            cross_events:   self.totals.cross_events,
            final_time:     self.last_time,
            arrived:        self.totals.arrived,
            in_flight:      self.scenario.demand().len().saturating_sub(self.totals.arrived),
        }
    }

    // ── Epoch loop ────────────────────────────────────────────────────────

    fn step<S: EventSink>(&mut self, sink: &mut S) -> SimResult<Option<EpochReport>> {
        if self.state == State::Fresh {
            let commands = self.workers.iter().map(|_| Command::Init).collect();
            self.dispatch(commands, PhaseLabel { epoch: 0, sub_round: 0 })?;
            self.state = State::Running;
        }

        let global_min = self.global_min_time();
        let horizon_hit = matches!(
            (self.last_till, self.config.end_time),
            (Some(till), Some(end)) if till >= end
        );
        if !global_min.is_finite() || horizon_hit {
            self.state = State::Finished;
            return Ok(None);
        }

        let epoch = self.epoch;
        let till = global_min + self.config.sync_interval;
        if !till.is_finite() {
            return Err(SimError::BoundaryOverflow {
                epoch,
                from: global_min,
                sync_interval: self.config.sync_interval,
            });
        }
        sink.on_epoch_start(epoch, till);

        let mut buffer: Vec<SimEvent> = Vec::new();
        let mut cross_events = 0usize;
        let mut sub_round = 0u32;

        while self.workers.iter().any(|w| w.min_time() <= till) {
            if sub_round >= self.config.max_sub_rounds {
                return Err(SimError::Diverged { epoch, sub_rounds: sub_round });
            }
            let label = PhaseLabel { epoch, sub_round };

            // ── Process ───────────────────────────────────────────────────
            let commands = self.workers.iter().map(|_| Command::Process { till }).collect();
            let replies = self.dispatch(commands, label)?;

            let mut inboxes: BTreeMap<WorkerId, Vec<SimEvent>> = BTreeMap::new();
            let mut processed = 0usize;
            let mut routed = 0usize;
            for reply in replies {
                let Reply::Processed(out) = reply else { continue };
                processed += out.processed;
                buffer.extend(out.sink);
                // Replies arrive in worker order, so each inbox is filled
                // in source-worker order, then emission order.
                for (dest, events) in out.outbound {
                    routed += events.len();
                    inboxes.entry(dest).or_default().extend(events);
                }
            }

            if processed == 0 {
                return Err(SimError::Stalled { epoch, sub_round });
            }

            // ── Accept ────────────────────────────────────────────────────
            if !inboxes.is_empty() {
                let commands = self
                    .workers
                    .iter()
                    .map(|w| Command::Accept(inboxes.remove(&w.id()).unwrap_or_default()))
                    .collect();
                self.dispatch(commands, label)?;
            }

            trace!(epoch, sub_round, processed, routed, till = %till, "sub-round done");
            cross_events += routed;
            sub_round += 1;
        }

        // ── Flush ─────────────────────────────────────────────────────────
        buffer.sort_by_key(|e| e.time);
        debug_assert!(buffer.first().is_none_or(|e| e.time >= self.last_time));
        sink.handle_events(&buffer);

        let arrivals = buffer.iter().filter(|e| e.kind == EventKind::Arrive).count();
        if let Some(last) = buffer.last() {
            self.last_time = last.time;
        }
        let report = EpochReport {
            epoch,
            till,
            sub_rounds:     sub_round,
            events_flushed: buffer.len(),
            cross_events,
            arrivals,
        };

        self.totals.sub_rounds += u64::from(sub_round);
        self.totals.events_flushed += buffer.len() as u64;
        self.totals.cross_events += cross_events as u64;
        self.totals.arrived += arrivals;
        self.last_till = Some(till);
        self.epoch += 1;

        debug!(
            epoch,
            till = %till,
            sub_rounds = sub_round,
            flushed = buffer.len(),
            cross_events,
            "epoch done"
        );
        sink.on_epoch_end(&report);
        Ok(Some(report))
    }

    /// Hand every worker to the pool with its command and take them back.
    fn dispatch(&mut self, commands: Vec<Command>, label: PhaseLabel) -> SimResult<Vec<Reply>> {
        let workers = std::mem::take(&mut self.workers);
        let (workers, replies) = self.barrier.dispatch(workers, commands, &self.scenario, label)?;
        self.workers = workers;
        Ok(replies)
    }
}
