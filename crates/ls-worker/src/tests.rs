//! Unit tests for ls-worker.

use ls_core::{EventKind, LinkId, NodeId, SimEvent, SimTime, VehicleId, WorkerId};
use ls_network::{Demand, NetworkBuilder, Partition, Scenario, Trip, VolumeDelay};

use crate::{EventQueue, LinkState, Worker, WorkerError, WorkerPhase};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Chain 0 → 1 → … → n with free flow 10 s and the given capacity.
fn chain_scenario(n: usize, capacity: f64, partition: Partition, trips: Vec<Trip>) -> Scenario {
    let mut b = NetworkBuilder::new().volume_delay(VolumeDelay::BPR);
    b.reserve_nodes(n + 1);
    for i in 0..n {
        b.add_link(NodeId(i as u32), NodeId(i as u32 + 1), 100.0, 10.0, capacity);
    }
    Scenario::new(b.build().unwrap(), partition, Demand::new(trips).unwrap()).unwrap()
}

fn trip(vehicle: u32, departure: f64, route: &[u32]) -> Trip {
    Trip::new(VehicleId(vehicle), SimTime(departure), route.iter().map(|&l| LinkId(l)).collect())
}

fn ev(time: f64, link: u32, vehicle: u32, leg: u32, kind: EventKind) -> SimEvent {
    SimEvent::new(SimTime(time), LinkId(link), VehicleId(vehicle), leg, kind)
}

fn kinds(events: &[SimEvent]) -> Vec<(f64, u32, EventKind)> {
    events.iter().map(|e| (e.time.0, e.link.0, e.kind)).collect()
}

// ── EventQueue ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod queue {
    use super::*;

    #[test]
    fn pops_in_time_order() {
        let mut q = EventQueue::new();
        q.push(ev(5.0, 0, 1, 0, EventKind::Enter));
        q.push(ev(1.0, 0, 2, 0, EventKind::Enter));
        q.push(ev(3.0, 0, 3, 0, EventKind::Enter));
        let order: Vec<_> = std::iter::from_fn(|| q.pop_due(SimTime::INFINITY)).map(|e| e.vehicle.0).collect();
        assert_eq!(order, [2, 3, 1]);
        assert!(q.is_empty());
    }

    #[test]
    fn ties_are_fifo() {
        let mut q = EventQueue::new();
        for v in [7, 3, 9] {
            q.push(ev(2.0, 0, v, 0, EventKind::Enter));
        }
        assert_eq!(q.time_count(), 1);
        let order: Vec<_> = std::iter::from_fn(|| q.pop_due(SimTime(2.0))).map(|e| e.vehicle.0).collect();
        assert_eq!(order, [7, 3, 9]);
    }

    #[test]
    fn pop_due_respects_till() {
        let mut q = EventQueue::new();
        q.push(ev(10.0, 0, 1, 0, EventKind::Enter));
        assert!(q.pop_due(SimTime(9.999)).is_none());
        assert_eq!(q.len(), 1);
        assert!(q.pop_due(SimTime(10.0)).is_some());
    }

    #[test]
    fn empty_queue_time_is_infinity() {
        let q = EventQueue::new();
        assert_eq!(q.next_time(), SimTime::INFINITY);
    }
}

// ── LinkState ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod link_state {
    use super::*;

    #[test]
    fn enter_reports_volume_before_entry() {
        let mut s = LinkState::new(LinkId(0));
        assert_eq!(s.enter(), 0);
        assert_eq!(s.enter(), 1);
        assert_eq!(s.volume, 2);
        assert_eq!(s.peak_volume, 2);
        assert_eq!(s.leave(), Some(1));
        assert_eq!(s.entries, 2);
        assert_eq!(s.peak_volume, 2);
    }

    #[test]
    fn leave_on_empty_link_is_none() {
        let mut s = LinkState::new(LinkId(0));
        assert_eq!(s.leave(), None);
        assert_eq!(s.volume, 0);
    }
}

// ── Worker lifecycle ──────────────────────────────────────────────────────────

#[cfg(test)]
mod lifecycle {
    use super::*;

    #[test]
    fn new_worker_is_uninitialized() {
        let s = chain_scenario(1, 20.0, Partition::single(1), vec![trip(0, 3.0, &[0])]);
        let w = Worker::new(WorkerId(0), &s);
        assert_eq!(w.phase(), WorkerPhase::Uninitialized);
        assert_eq!(w.min_time(), SimTime::INFINITY);
        assert_eq!(w.pending(), 0);
    }

    #[test]
    fn init_seeds_departures() {
        let s = chain_scenario(2, 20.0, Partition::single(2), vec![trip(0, 3.0, &[0, 1]), trip(1, 1.5, &[1])]);
        let mut w = Worker::new(WorkerId(0), &s);
        w.init();
        assert_eq!(w.phase(), WorkerPhase::Active);
        assert_eq!(w.min_time(), SimTime(1.5));
        assert_eq!(w.pending(), 2);

        // Idempotent.
        w.init();
        assert_eq!(w.pending(), 2);
    }

    #[test]
    fn worker_without_trips_is_idle() {
        let s = chain_scenario(2, 20.0, Partition::contiguous(2, 2), vec![trip(0, 0.0, &[0, 1])]);
        let mut w1 = Worker::new(WorkerId(1), &s);
        w1.init();
        assert_eq!(w1.phase(), WorkerPhase::Idle);
        assert_eq!(w1.min_time(), SimTime::INFINITY);
    }

    #[test]
    fn process_before_init_fails() {
        let s = chain_scenario(1, 20.0, Partition::single(1), vec![]);
        let mut w = Worker::new(WorkerId(0), &s);
        assert!(matches!(
            w.process_queued_events(&s, SimTime(10.0)),
            Err(WorkerError::NotInitialized(WorkerId(0)))
        ));
        assert!(matches!(w.accept_events(&s, vec![]), Err(WorkerError::NotInitialized(_))));
    }
}

// ── Processing ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod processing {
    use super::*;

    #[test]
    fn single_cluster_trip_runs_to_arrival() {
        let s = chain_scenario(2, 20.0, Partition::single(2), vec![trip(0, 0.0, &[0, 1])]);
        let mut w = Worker::new(WorkerId(0), &s);
        w.init();
        let out = w.process_queued_events(&s, SimTime(100.0)).unwrap();

        assert_eq!(
            kinds(&out.sink),
            [
                (0.0, 0, EventKind::Depart),
                (10.0, 0, EventKind::Leave),
                (10.0, 1, EventKind::Enter),
                (20.0, 1, EventKind::Leave),
                (20.0, 1, EventKind::Arrive),
            ]
        );
        assert!(out.outbound.is_empty());
        assert_eq!(out.processed, 4);
        assert_eq!(w.phase(), WorkerPhase::Draining);
        assert_eq!(w.min_time(), SimTime::INFINITY);
        assert_eq!(w.vehicles_on_links(), 0);
    }

    #[test]
    fn events_after_till_stay_queued() {
        let s = chain_scenario(1, 20.0, Partition::single(1), vec![trip(0, 0.0, &[0])]);
        let mut w = Worker::new(WorkerId(0), &s);
        w.init();
        let out = w.process_queued_events(&s, SimTime(5.0)).unwrap();
        assert_eq!(kinds(&out.sink), [(0.0, 0, EventKind::Depart)]);
        assert_eq!(w.min_time(), SimTime(10.0));
        assert_eq!(w.phase(), WorkerPhase::Active);
        assert_eq!(w.link_state(&s, LinkId(0)).unwrap().volume, 1);
    }

    #[test]
    fn congestion_slows_later_vehicle() {
        // Capacity 1: the second vehicle finds one vehicle on the link.
        let s = chain_scenario(1, 1.0, Partition::single(1), vec![trip(0, 0.0, &[0]), trip(1, 1.0, &[0])]);
        let mut w = Worker::new(WorkerId(0), &s);
        w.init();
        let out = w.process_queued_events(&s, SimTime(100.0)).unwrap();

        let leave_1 = out
            .sink
            .iter()
            .find(|e| e.vehicle == VehicleId(1) && e.kind == EventKind::Leave)
            .unwrap();
        // 1.0 + 10 · (1 + 0.15 · 1^4) = 12.5
        assert!((leave_1.time.0 - 12.5).abs() < 1e-9, "got {}", leave_1.time);
        assert_eq!(w.link_state(&s, LinkId(0)).unwrap().peak_volume, 2);
    }

    #[test]
    fn equal_departures_keep_demand_order() {
        let s = chain_scenario(1, 50.0, Partition::single(1), vec![trip(5, 0.0, &[0]), trip(2, 0.0, &[0])]);
        let mut w = Worker::new(WorkerId(0), &s);
        w.init();
        let out = w.process_queued_events(&s, SimTime(0.0)).unwrap();
        let order: Vec<_> = out.sink.iter().map(|e| e.vehicle.0).collect();
        assert_eq!(order, [5, 2]);
    }

    #[test]
    fn cross_cluster_enter_is_routed_to_owner() {
        let s = chain_scenario(2, 20.0, Partition::contiguous(2, 2), vec![trip(0, 0.0, &[0, 1])]);
        let mut w0 = Worker::new(WorkerId(0), &s);
        let mut w1 = Worker::new(WorkerId(1), &s);
        w0.init();
        w1.init();

        let out0 = w0.process_queued_events(&s, SimTime(100.0)).unwrap();
        assert_eq!(kinds(&out0.sink), [(0.0, 0, EventKind::Depart), (10.0, 0, EventKind::Leave)]);
        assert_eq!(out0.outbound.len(), 1);
        let routed = out0.outbound[&WorkerId(1)].clone();
        assert_eq!(kinds(&routed), [(10.0, 1, EventKind::Enter)]);
        assert_eq!(routed[0].leg, 1);
        assert_eq!(w0.phase(), WorkerPhase::Draining);

        w1.accept_events(&s, routed).unwrap();
        assert_eq!(w1.phase(), WorkerPhase::Active);
        assert_eq!(w1.min_time(), SimTime(10.0));
        assert_eq!(w1.stats().clock_resets, 0, "reviving from infinity is not a reset");

        let out1 = w1.process_queued_events(&s, SimTime(100.0)).unwrap();
        assert_eq!(
            kinds(&out1.sink),
            [(10.0, 1, EventKind::Enter), (20.0, 1, EventKind::Leave), (20.0, 1, EventKind::Arrive)]
        );
        assert_eq!(w0.stats().sent, 1);
        assert_eq!(w1.stats().received, 1);
    }

    #[test]
    fn accepted_earlier_event_resets_clock() {
        let s = chain_scenario(
            2,
            20.0,
            Partition::contiguous(2, 2),
            vec![trip(0, 50.0, &[1]), trip(1, 0.0, &[0, 1])],
        );
        let mut w1 = Worker::new(WorkerId(1), &s);
        w1.init();
        assert_eq!(w1.min_time(), SimTime(50.0));
        w1.accept_events(&s, vec![ev(10.0, 1, 1, 1, EventKind::Enter)]).unwrap();
        assert_eq!(w1.min_time(), SimTime(10.0));
        assert_eq!(w1.stats().clock_resets, 1);
    }

    #[test]
    fn draining_worker_revived_by_accept() {
        let s = chain_scenario(2, 20.0, Partition::contiguous(2, 2), vec![trip(0, 0.0, &[1]), trip(1, 0.0, &[0, 1])]);
        let mut w1 = Worker::new(WorkerId(1), &s);
        w1.init();
        w1.process_queued_events(&s, SimTime(100.0)).unwrap();
        assert_eq!(w1.phase(), WorkerPhase::Draining);

        w1.accept_events(&s, vec![ev(30.0, 1, 1, 1, EventKind::Enter)]).unwrap();
        assert_eq!(w1.phase(), WorkerPhase::Active);
        assert_eq!(w1.min_time(), SimTime(30.0));
    }
}

// ── Failures ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod failures {
    use super::*;

    fn two_cluster() -> Scenario {
        chain_scenario(2, 20.0, Partition::contiguous(2, 2), vec![trip(0, 0.0, &[0, 1])])
    }

    #[test]
    fn accept_for_foreign_link_rejected() {
        let s = two_cluster();
        let mut w0 = Worker::new(WorkerId(0), &s);
        w0.init();
        let r = w0.accept_events(&s, vec![ev(10.0, 1, 0, 1, EventKind::Enter)]);
        assert!(matches!(r, Err(WorkerError::NotOwned { worker: WorkerId(0), link: LinkId(1) })));
        assert_eq!(w0.pending(), 1, "rejected batch must not be partially queued");
    }

    #[test]
    fn link_state_only_for_owned_links() {
        let s = two_cluster();
        let w0 = Worker::new(WorkerId(0), &s);
        let w1 = Worker::new(WorkerId(1), &s);
        assert_eq!(w0.link_state(&s, LinkId(0)).map(|st| st.link), Some(LinkId(0)));
        assert!(w0.link_state(&s, LinkId(1)).is_none());
        assert_eq!(w1.link_state(&s, LinkId(1)).map(|st| st.link), Some(LinkId(1)));
        assert!(w1.link_state(&s, LinkId(9)).is_none());
    }

    #[test]
    fn accept_arrive_rejected() {
        let s = two_cluster();
        let mut w1 = Worker::new(WorkerId(1), &s);
        w1.init();
        let r = w1.accept_events(&s, vec![ev(10.0, 1, 0, 1, EventKind::Arrive)]);
        assert!(matches!(r, Err(WorkerError::UnexpectedKind { .. })));
    }

    #[test]
    fn leave_on_empty_link_is_underflow() {
        let s = two_cluster();
        let mut w1 = Worker::new(WorkerId(1), &s);
        w1.init();
        w1.accept_events(&s, vec![ev(10.0, 1, 0, 1, EventKind::Leave)]).unwrap();
        let r = w1.process_queued_events(&s, SimTime(20.0));
        assert!(matches!(r, Err(WorkerError::VolumeUnderflow { .. })));
    }

    #[test]
    fn wrong_leg_rejected() {
        let s = two_cluster();
        let mut w1 = Worker::new(WorkerId(1), &s);
        w1.init();
        w1.accept_events(&s, vec![ev(10.0, 1, 0, 0, EventKind::Enter)]).unwrap();
        let r = w1.process_queued_events(&s, SimTime(20.0));
        assert!(matches!(r, Err(WorkerError::LegMismatch { leg: 0, .. })));
    }

    #[test]
    fn unknown_vehicle_rejected() {
        let s = two_cluster();
        let mut w1 = Worker::new(WorkerId(1), &s);
        w1.init();
        w1.accept_events(&s, vec![ev(10.0, 1, 42, 1, EventKind::Enter)]).unwrap();
        let r = w1.process_queued_events(&s, SimTime(20.0));
        assert!(matches!(r, Err(WorkerError::UnknownVehicle(VehicleId(42)))));
    }
}
