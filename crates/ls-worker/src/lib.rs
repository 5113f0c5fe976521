//! `ls-worker` — one cluster's share of the simulation.
//!
//! A [`Worker`] owns a fixed set of links (its cluster), the mutable state
//! of those links, and a queue of pending events.  It never talks to another
//! worker: events for links it does not own are returned to the coordinator
//! as values and delivered by it.
//!
//! # Crate layout
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`queue`]       | `EventQueue` (`BTreeMap<SimTime, VecDeque<SimEvent>>`)|
//! | [`link_state`]  | `LinkState`                                           |
//! | [`worker`]      | `Worker`, `WorkerPhase`, `SubRoundOutput`             |
//! | [`error`]       | `WorkerError`, `WorkerResult<T>`                      |

pub mod error;
pub mod link_state;
pub mod queue;
pub mod worker;

#[cfg(test)]
mod tests;

pub use error::{WorkerError, WorkerResult};
pub use link_state::LinkState;
pub use queue::EventQueue;
pub use worker::{SubRoundOutput, Worker, WorkerPhase, WorkerStats};
