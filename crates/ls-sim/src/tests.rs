//! Integration tests for ls-sim.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use ls_core::{EventKind, LinkId, NodeId, SimConfig, SimEvent, SimTime, VehicleId, WorkerId};
use ls_network::{Demand, Network, NetworkBuilder, Partition, Scenario, Trip, VolumeDelay};

use crate::{CollectingSink, CoordinatorBuilder, NoopSink, RunReport, SimError};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Chain 0 → 1 → … with one link per entry in `free_flow`.
fn chain(free_flow: &[f64], capacity: f64) -> Network {
    let mut b = NetworkBuilder::new().volume_delay(VolumeDelay::BPR);
    b.reserve_nodes(free_flow.len() + 1);
    for (i, &ff) in free_flow.iter().enumerate() {
        b.add_link(NodeId(i as u32), NodeId(i as u32 + 1), 100.0, ff, capacity);
    }
    b.build().unwrap()
}

fn links(ids: &[u32]) -> Vec<LinkId> {
    ids.iter().map(|&l| LinkId(l)).collect()
}

fn trip(vehicle: u32, departure: f64, route: &[u32]) -> Trip {
    Trip::new(VehicleId(vehicle), SimTime(departure), links(route))
}

fn run(scenario: Scenario, config: SimConfig) -> (CollectingSink, RunReport) {
    let mut coordinator = CoordinatorBuilder::new(config, scenario).build().unwrap();
    let mut sink = CollectingSink::new();
    let report = coordinator.run(&mut sink).unwrap();
    (sink, report)
}

fn summary(events: &[SimEvent]) -> Vec<(f64, u32, u32, EventKind)> {
    events.iter().map(|e| (e.time.0, e.vehicle.0, e.link.0, e.kind)).collect()
}

/// Sort key that ignores flush order, for multiset comparison.
fn multiset(events: &[SimEvent]) -> Vec<(u32, u32, &'static str, u64, u32)> {
    let mut v: Vec<_> = events
        .iter()
        .map(|e| (e.vehicle.0, e.leg, e.kind.as_str(), e.time.0.to_bits(), e.link.0))
        .collect();
    v.sort_unstable();
    v
}

fn assert_non_decreasing(events: &[SimEvent]) {
    for pair in events.windows(2) {
        assert!(pair[0].time <= pair[1].time, "flush order went backwards: {} then {}", pair[0], pair[1]);
    }
}

/// Ring of `nodes` nodes with links `i → i+1` and `i → i+3`, random
/// free-flow times and small capacities, plus `trips` random-walk trips.
fn random_scenario(seed: u64, nodes: u32, trips: u32, delay: VolumeDelay) -> (Network, Demand) {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut b = NetworkBuilder::new().volume_delay(delay);
    b.reserve_nodes(nodes as usize);
    for i in 0..nodes {
        for step in [1, 3] {
            let ff = 5.0 + rng.gen_range(0.0..20.0);
            let cap = f64::from(rng.gen_range(1..5u32));
            b.add_link(NodeId(i), NodeId((i + step) % nodes), 100.0, ff, cap);
        }
    }
    let network = b.build().unwrap();

    let trips = (0..trips)
        .map(|v| {
            let mut route = vec![LinkId(rng.gen_range(0..network.link_count() as u32))];
            for _ in 0..rng.gen_range(0..6) {
                let Some(&last) = route.last() else { break };
                let outs: Vec<LinkId> = network.out_links(network.link_to[last.index()]).collect();
                route.push(outs[rng.gen_range(0..outs.len())]);
            }
            Trip::new(VehicleId(v), SimTime(rng.gen_range(0.0..300.0)), route)
        })
        .collect();
    (network, Demand::new(trips).unwrap())
}

// ── Builder ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;

    fn scenario() -> Scenario {
        Scenario::new(chain(&[10.0, 10.0, 10.0], 10.0), Partition::contiguous(3, 3), Demand::empty()).unwrap()
    }

    #[test]
    fn threads_default_to_cluster_count() {
        let c = CoordinatorBuilder::new(SimConfig::default(), scenario()).build().unwrap();
        assert_eq!(c.thread_count(), 3);
        assert_eq!(c.workers().len(), 3);
    }

    #[test]
    fn num_threads_override() {
        let c = CoordinatorBuilder::new(SimConfig::default(), scenario()).num_threads(1).build().unwrap();
        assert_eq!(c.thread_count(), 1);
        assert_eq!(c.workers().len(), 3);
    }

    #[test]
    fn invalid_config_rejected() {
        let config = SimConfig { sync_interval: -1.0, ..SimConfig::default() };
        let result = CoordinatorBuilder::new(config, scenario()).build();
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn accepts_shared_scenario() {
        let shared = Arc::new(scenario());
        let c = CoordinatorBuilder::new(SimConfig::default(), Arc::clone(&shared)).build().unwrap();
        assert_eq!(c.scenario().worker_count(), shared.worker_count());
    }
}

// ── Epoch protocol ────────────────────────────────────────────────────────────

#[cfg(test)]
mod epoch_tests {
    use super::*;

    /// Links A (10 s) and B (15 s) in separate clusters, one vehicle A → B.
    fn two_cluster() -> Scenario {
        Scenario::new(
            chain(&[10.0, 15.0], 20.0),
            Partition::new(vec![links(&[0]), links(&[1])]),
            Demand::new(vec![trip(0, 0.0, &[0, 1])]).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn cross_cluster_enter_flushed_in_first_epoch() {
        let mut c = CoordinatorBuilder::new(SimConfig::with_sync_interval(20.0), two_cluster()).build().unwrap();
        let mut sink = CollectingSink::new();

        let first = c.run_epoch(&mut sink).unwrap().unwrap();
        assert_eq!(first.till, SimTime(20.0));
        assert_eq!(first.sub_rounds, 2);
        assert_eq!(first.cross_events, 1);
        assert_eq!(
            summary(&sink.events),
            [
                (0.0, 0, 0, EventKind::Depart),
                (10.0, 0, 0, EventKind::Leave),
                (10.0, 0, 1, EventKind::Enter),
            ]
        );
        assert_eq!(c.min_times(), [SimTime::INFINITY, SimTime(25.0)]);

        let second = c.run_epoch(&mut sink).unwrap().unwrap();
        assert_eq!(second.till, SimTime(45.0));
        assert_eq!(
            summary(&sink.events[3..]),
            [(25.0, 0, 1, EventKind::Leave), (25.0, 0, 1, EventKind::Arrive)]
        );
        assert_eq!(second.arrivals, 1);

        assert!(c.run_epoch(&mut sink).unwrap().is_none());
        assert!(c.run_epoch(&mut sink).unwrap().is_none());
    }

    #[test]
    fn run_report_totals() {
        let (sink, report) = run(two_cluster(), SimConfig::with_sync_interval(20.0));
        assert_eq!(report.epochs, 2);
        assert_eq!(report.events_flushed, 5);
        assert_eq!(report.cross_events, 1);
        assert_eq!(report.arrived, 1);
        assert_eq!(report.final_time, SimTime(25.0));
        assert!(report.is_complete());
        assert_eq!(sink.run, Some(report));
        assert_eq!(sink.epochs.len(), 2);
    }

    #[test]
    fn epoch_boundaries_strictly_increase() {
        let (network, demand) = random_scenario(3, 12, 40, VolumeDelay::BPR);
        let scenario = Scenario::new(network, Partition::contiguous(24, 3), demand).unwrap();
        let (sink, _) = run(scenario, SimConfig::with_sync_interval(15.0));
        for pair in sink.epochs.windows(2) {
            assert!(pair[0].till < pair[1].till);
        }
    }

    #[test]
    fn empty_demand_finishes_immediately() {
        let scenario = Scenario::new(chain(&[10.0], 5.0), Partition::single(1), Demand::empty()).unwrap();
        let (sink, report) = run(scenario, SimConfig::default());
        assert_eq!(report.epochs, 0);
        assert_eq!(report.final_time, SimTime::ZERO);
        assert!(sink.events.is_empty());
    }

    #[test]
    fn end_time_stops_with_vehicles_in_flight() {
        let config = SimConfig { end_time: Some(SimTime(5.0)), ..SimConfig::with_sync_interval(5.0) };
        let (sink, report) = run(two_cluster(), config);
        assert_eq!(report.epochs, 1);
        assert_eq!(summary(&sink.events), [(0.0, 0, 0, EventKind::Depart)]);
        assert_eq!(report.in_flight, 1);
        assert!(!report.is_complete());
    }
}

// ── Tie order ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tie_order {
    use super::*;

    /// A (0→2) and B (1→2) both feed C (2→3); each link is its own cluster,
    /// listed in `order`.  Both vehicles reach C at t = 10.
    fn merge(order: [u32; 3]) -> Scenario {
        let mut b = NetworkBuilder::new().volume_delay(VolumeDelay::BPR);
        b.reserve_nodes(4);
        b.add_link(NodeId(0), NodeId(2), 100.0, 10.0, 5.0);
        b.add_link(NodeId(1), NodeId(2), 100.0, 10.0, 5.0);
        b.add_link(NodeId(2), NodeId(3), 100.0, 10.0, 1.0);
        let partition = Partition::new(order.iter().map(|&l| links(&[l])).collect());
        let demand = Demand::new(vec![trip(0, 0.0, &[0, 2]), trip(1, 0.0, &[1, 2])]).unwrap();
        Scenario::new(b.build().unwrap(), partition, demand).unwrap()
    }

    fn enter_order(events: &[SimEvent]) -> Vec<u32> {
        events
            .iter()
            .filter(|e| e.kind == EventKind::Enter && e.link == LinkId(2))
            .map(|e| e.vehicle.0)
            .collect()
    }

    #[test]
    fn equal_time_enters_follow_source_worker_order() {
        let (sink, _) = run(merge([0, 1, 2]), SimConfig::with_sync_interval(20.0));
        assert_eq!(
            summary(&sink.events),
            [
                (0.0, 0, 0, EventKind::Depart),
                (0.0, 1, 1, EventKind::Depart),
                (10.0, 0, 0, EventKind::Leave),
                (10.0, 1, 1, EventKind::Leave),
                (10.0, 0, 2, EventKind::Enter),
                (10.0, 1, 2, EventKind::Enter),
                (20.0, 0, 2, EventKind::Leave),
                (20.0, 0, 2, EventKind::Arrive),
                (21.5, 1, 2, EventKind::Leave),
                (21.5, 1, 2, EventKind::Arrive),
            ]
        );
    }

    #[test]
    fn swapping_source_workers_swaps_tie_order() {
        let (sink, _) = run(merge([1, 0, 2]), SimConfig::with_sync_interval(20.0));
        assert_eq!(enter_order(&sink.events), [1, 0]);
        let leave_c: Vec<_> = sink
            .events
            .iter()
            .filter(|e| e.kind == EventKind::Leave && e.link == LinkId(2))
            .map(|e| (e.vehicle.0, e.time.0))
            .collect();
        assert_eq!(leave_c, [(1, 20.0), (0, 21.5)]);
    }

    #[test]
    fn tie_order_stable_across_runs() {
        let (first, _) = run(merge([0, 1, 2]), SimConfig::with_sync_interval(20.0));
        for _ in 0..10 {
            let (again, _) = run(merge([0, 1, 2]), SimConfig::with_sync_interval(20.0));
            assert_eq!(again.events, first.events);
        }
    }
}

// ── Equivalence with a single cluster ─────────────────────────────────────────

#[cfg(test)]
mod equivalence {
    use super::*;

    fn compare(seed: u64, delay: VolumeDelay, sync_interval: f64, clusters: usize) {
        let (network, demand) = random_scenario(seed, 16, 60, delay);
        let link_count = network.link_count();
        let reference = Scenario::new(network, Partition::single(link_count), demand).unwrap();
        let parallel = reference.repartition(Partition::contiguous(link_count, clusters)).unwrap();

        let (seq, seq_report) = run(reference, SimConfig::with_sync_interval(sync_interval));
        let (par, par_report) = run(parallel, SimConfig::with_sync_interval(sync_interval));

        assert_eq!(seq_report.arrived, 60);
        assert_eq!(par_report.arrived, 60);
        assert_non_decreasing(&par.events);
        assert_eq!(multiset(&par.events), multiset(&seq.events));
        assert!(par_report.cross_events > 0, "scenario never crossed a cluster boundary");
    }

    #[test]
    fn lock_step_matches_single_cluster() {
        for seed in 0..4 {
            compare(seed, VolumeDelay::BPR, 0.0, 4);
        }
    }

    #[test]
    fn free_flow_matches_single_cluster_at_any_interval() {
        for (seed, interval) in [(10, 20.0), (11, 60.0), (12, 500.0)] {
            compare(seed, VolumeDelay::FREE_FLOW, interval, 5);
        }
    }

    #[test]
    fn congested_run_is_deterministic_and_monotone() {
        let (network, demand) = random_scenario(21, 16, 80, VolumeDelay::BPR);
        let scenario = Scenario::new(network, Partition::contiguous(32, 4), demand).unwrap();
        let (first, report) = run(scenario.clone(), SimConfig::with_sync_interval(30.0));
        let (second, _) = run(scenario, SimConfig::with_sync_interval(30.0));

        assert_eq!(first.events, second.events);
        assert_non_decreasing(&first.events);
        assert_eq!(report.arrived, 80);
        for v in 0..80 {
            let arrivals = first
                .events
                .iter()
                .filter(|e| e.vehicle == VehicleId(v) && e.kind == EventKind::Arrive)
                .count();
            assert_eq!(arrivals, 1, "vehicle {v}");
        }
    }
}

// ── Failure paths ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod failures {
    use super::*;
    use crate::barrier::{Barrier, Command, PhaseLabel, panic_message};
    use ls_worker::{Worker, WorkerError};

    fn two_cluster() -> Arc<Scenario> {
        Arc::new(
            Scenario::new(
                chain(&[10.0, 15.0], 20.0),
                Partition::new(vec![links(&[0]), links(&[1])]),
                Demand::new(vec![trip(0, 0.0, &[0, 1])]).unwrap(),
            )
            .unwrap(),
        )
    }

    fn pool(threads: usize) -> rayon::ThreadPool {
        rayon::ThreadPoolBuilder::new().num_threads(threads).build().unwrap()
    }

    const LABEL: PhaseLabel = PhaseLabel { epoch: 3, sub_round: 1 };

    #[test]
    fn sub_round_budget_exceeded() {
        let config = SimConfig { max_sub_rounds: 1, ..SimConfig::with_sync_interval(20.0) };
        let mut c = CoordinatorBuilder::new(config, (*two_cluster()).clone()).build().unwrap();
        let mut sink = CollectingSink::new();

        let err = c.run_epoch(&mut sink).unwrap_err();
        assert!(matches!(err, SimError::Diverged { epoch: 0, sub_rounds: 1 }), "{err}");
        assert!(sink.events.is_empty(), "failed epoch must not be flushed");
        assert!(matches!(c.run_epoch(&mut sink), Err(SimError::Aborted)));
        assert!(matches!(c.run(&mut NoopSink), Err(SimError::Aborted)));
    }

    #[test]
    fn overflowing_boundary_rejected() {
        let scenario = Scenario::new(
            chain(&[10.0], 20.0),
            Partition::single(1),
            Demand::new(vec![trip(0, 1.0e300, &[0])]).unwrap(),
        )
        .unwrap();
        let mut c = CoordinatorBuilder::new(SimConfig::with_sync_interval(f64::MAX), scenario).build().unwrap();
        let mut sink = CollectingSink::new();

        let err = c.run(&mut sink).unwrap_err();
        assert!(matches!(err, SimError::BoundaryOverflow { epoch: 0, .. }), "{err}");
        assert!(sink.events.is_empty());
        assert!(matches!(c.run_epoch(&mut sink), Err(SimError::Aborted)));
    }

    #[test]
    fn first_failing_worker_reported() {
        let scenario = two_cluster();
        let barrier = Barrier::new(pool(2), Some(Duration::from_secs(10)));
        let workers: Vec<Worker> = scenario.partition().workers().map(|id| Worker::new(id, &scenario)).collect();
        let (workers, _) = barrier
            .dispatch(workers, vec![Command::Init, Command::Init], &scenario, LABEL)
            .unwrap();

        // Each worker is handed an event for the other's link.
        let wrong = |link: u32| SimEvent::new(SimTime(1.0), LinkId(link), VehicleId(0), 0, EventKind::Enter);
        let commands = vec![Command::Accept(vec![wrong(1)]), Command::Accept(vec![wrong(0)])];
        let err = barrier.dispatch(workers, commands, &scenario, LABEL).unwrap_err();
        match err {
            SimError::Worker { worker, source } => {
                assert_eq!(worker, WorkerId(0));
                assert!(matches!(source, WorkerError::NotOwned { link: LinkId(1), .. }));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn uninitialized_worker_fails_process() {
        let scenario = two_cluster();
        let barrier = Barrier::new(pool(1), None);
        let workers = vec![Worker::new(WorkerId(0), &scenario)];
        let err = barrier
            .dispatch(workers, vec![Command::Process { till: SimTime(5.0) }], &scenario, LABEL)
            .unwrap_err();
        assert!(matches!(err, SimError::Worker { source: WorkerError::NotInitialized(_), .. }));
    }

    #[test]
    fn slow_phase_times_out() {
        let scenario = two_cluster();
        let pool = pool(1);
        // Occupy the only pool thread so the dispatched task cannot start.
        pool.spawn(|| std::thread::sleep(Duration::from_millis(500)));
        let barrier = Barrier::new(pool, Some(Duration::from_millis(50)));

        let workers = vec![Worker::new(WorkerId(0), &scenario)];
        let err = barrier.dispatch(workers, vec![Command::Init], &scenario, LABEL).unwrap_err();
        match err {
            SimError::BarrierTimeout { epoch, sub_round, waited } => {
                assert_eq!((epoch, sub_round), (3, 1));
                assert!(waited >= Duration::from_millis(50));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn panic_payload_text() {
        let payload = std::panic::catch_unwind(|| -> u8 { panic!("link table corrupt") }).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "link table corrupt");

        let payload = std::panic::catch_unwind(|| -> u8 { panic!("{} vehicles", 3) }).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "3 vehicles");

        let payload = std::panic::catch_unwind(|| -> u8 { std::panic::panic_any(7u8) }).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
