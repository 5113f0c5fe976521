//! `ls-network` — the immutable input of a run.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`network`]   | `Network` (CSR link graph), `NetworkBuilder`              |
//! | [`flow`]      | `VolumeDelay`, the link travel-time function              |
//! | [`partition`] | `Partition` (clusters), `OwnerIndex` (link → worker)      |
//! | [`demand`]    | `Trip`, `Demand`                                          |
//! | [`scenario`]  | `Scenario`, validated bundle shared by all workers        |
//! | [`loader`]    | CSV readers for links, clusters, and trips                |
//! | [`error`]     | `NetworkError`, `NetworkResult<T>`                        |
//!
//! Everything here is built once before the run and read-only afterwards, so
//! workers share it through an `Arc` without locking.

pub mod demand;
pub mod error;
pub mod flow;
pub mod loader;
pub mod network;
pub mod partition;
pub mod scenario;


pub use demand::{Demand, Trip};
pub use error::{NetworkError, NetworkResult};
pub use flow::VolumeDelay;
pub use loader::{
    load_demand_csv, load_demand_reader, load_network_csv, load_network_reader,
    load_partition_csv, load_partition_reader,
};
pub use network::{Network, NetworkBuilder};
pub use partition::{OwnerIndex, Partition, Slot};
pub use scenario::Scenario;
