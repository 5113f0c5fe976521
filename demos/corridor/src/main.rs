//! corridor — linksim demo on a synthetic arterial.
//!
//! Simulates a morning peak on a two-way arterial with a side street at
//! every junction.  The corridor is cut into consecutive sections, one
//! worker per section, and vehicles crossing a section boundary are handed
//! between workers at every sub-round.
//!
//! Set `RUST_LOG=ls_sim=debug` to see one line per epoch.

mod network;

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ls_core::{SimConfig, SimTime, VehicleId};
use ls_network::{Demand, Scenario, Trip};
use ls_output::{CsvWriter, EventOutputSink};
use ls_sim::CoordinatorBuilder;

use network::build_corridor;

// ── Constants ─────────────────────────────────────────────────────────────────

const JUNCTIONS:      u32   = 24;
const SECTIONS:       usize = 4;
const VEHICLES:       u32   = 3_000;
const SEED:           u64   = 42;
const PEAK_SECS:      f64   = 3_600.0;
const SYNC_INTERVAL:  f64   = 30.0;
const OUTPUT_DIR:     &str  = "output/corridor";

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    println!("=== corridor — linksim traffic engine ===");
    println!("Junctions: {JUNCTIONS}  |  Sections: {SECTIONS}  |  Vehicles: {VEHICLES}  |  Seed: {SEED}");
    println!();

    // 1. Network and partition.
    let corridor = build_corridor(JUNCTIONS)?;
    let partition = corridor.sections(SECTIONS);
    println!(
        "Network: {} nodes, {} links in {} sections",
        corridor.network.node_count(),
        corridor.network.link_count(),
        partition.worker_count()
    );

    // 2. Demand: uniform departures over the peak, random origin and
    //    destination junctions.
    let mut rng = SmallRng::seed_from_u64(SEED);
    let n = corridor.junctions();
    let trips: Vec<Trip> = (0..VEHICLES)
        .map(|v| {
            let from = rng.gen_range(0..n);
            let mut to = rng.gen_range(0..n - 1);
            if to >= from {
                to += 1;
            }
            let departure = SimTime::new(rng.gen_range(0.0..PEAK_SECS));
            Trip::new(VehicleId(v), departure, corridor.route(from, to))
        })
        .collect();
    let demand = Demand::new(trips)?;

    let scenario = Scenario::new(corridor.network, partition, demand)?;

    // 3. Coordinator.
    let config = SimConfig {
        sync_interval:   SYNC_INTERVAL,
        barrier_timeout: Some(Duration::from_secs(60)),
        ..SimConfig::default()
    };
    let mut coordinator = CoordinatorBuilder::new(config, scenario).build()?;

    // 4. Output.
    std::fs::create_dir_all(OUTPUT_DIR)?;
    let mut sink = EventOutputSink::new(CsvWriter::new(Path::new(OUTPUT_DIR))?);

    // 5. Run.
    let t0 = Instant::now();
    let report = coordinator.run(&mut sink)?;
    let elapsed = t0.elapsed();

    if let Some(e) = sink.take_error() {
        eprintln!("output error: {e}");
    }
    info!(elapsed_s = elapsed.as_secs_f64(), "done");

    // 6. Summary.
    println!("Simulation complete in {:.3} s", elapsed.as_secs_f64());
    println!("  epochs          : {}", report.epochs);
    println!("  sub-rounds      : {}", report.sub_rounds);
    println!("  events          : {}", report.events_flushed);
    println!("  cross-section   : {}", report.cross_events);
    println!("  arrived         : {}", report.arrived);
    println!("  last event at   : {}", report.final_time);
    println!();

    // 7. Per-section table.
    println!("{:<8} {:<8} {:<12} {:<12} {:<10}", "Section", "Links", "Processed", "Received", "Peak vol");
    println!("{}", "-".repeat(52));
    for worker in coordinator.workers() {
        let stats = worker.stats();
        let peak = worker.link_states().iter().map(|s| s.peak_volume).max().unwrap_or(0);
        println!(
            "{:<8} {:<8} {:<12} {:<12} {:<10}",
            worker.id().0,
            worker.links().len(),
            stats.processed,
            stats.received,
            peak,
        );
    }

    Ok(())
}
