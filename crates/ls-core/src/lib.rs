//! `ls-core` — foundational types for the `linksim` traffic engine.
//!
//! This crate is a dependency of every other `ls-*` crate.  It has no `ls-*`
//! dependencies and only `thiserror` (plus optional `serde`) externally.
//!
//! # What lives here
//!
//! | Module      | Contents                                                |
//! |-------------|---------------------------------------------------------|
//! | [`ids`]     | `LinkId`, `NodeId`, `VehicleId`, `WorkerId`             |
//! | [`time`]    | `SimTime` (seconds, totally ordered `f64`)              |
//! | [`event`]   | `SimEvent`, `EventKind`                                 |
//! | [`config`]  | `SimConfig`                                             |
//! | [`error`]   | `LsError`, `LsResult`                                   |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod event;
pub mod ids;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::SimConfig;
pub use error::{LsError, LsResult};
pub use event::{EventKind, SimEvent};
pub use ids::{LinkId, NodeId, VehicleId, WorkerId};
pub use time::SimTime;
