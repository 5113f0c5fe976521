//! `ls-sim` — epoch coordinator for the linksim traffic engine.
//!
//! # Epoch loop
//!
//! ```text
//! init every worker (parallel)
//! while some worker clock is finite:
//!   till = min(worker clocks) + sync_interval
//!   repeat until every clock > till:           ← sub-round
//!     ① Process — each worker drains its events <= till   (parallel)
//!     ② Route   — outbound Enter events grouped per owner  (coordinator)
//!     ③ Accept  — each worker queues its inbox             (parallel)
//!     ④ Collect — sink events appended in worker order     (coordinator)
//!   stable-sort the epoch's events by time and flush them to the sink
//! ```
//!
//! Workers run on a dedicated rayon pool.  Each parallel phase moves every
//! worker into a pool task and waits for all of them to come back (bounded
//! by `SimConfig::barrier_timeout`); a worker error or panic aborts the run.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use ls_core::SimConfig;
//! use ls_network::Scenario;
//! use ls_sim::{CoordinatorBuilder, NoopSink};
//!
//! let scenario = Scenario::new(network, partition, demand)?;
//! let mut coordinator = CoordinatorBuilder::new(SimConfig::with_sync_interval(30.0), scenario)
//!     .build()?;
//! let report = coordinator.run(&mut NoopSink)?;
//! ```

mod barrier;
pub mod builder;
pub mod coordinator;
pub mod error;
pub mod report;
pub mod sink;

#[cfg(test)]
mod tests;

pub use builder::CoordinatorBuilder;
pub use coordinator::Coordinator;
pub use error::{SimError, SimResult};
pub use report::{EpochReport, RunReport};
pub use sink::{CollectingSink, EventSink, NoopSink};
