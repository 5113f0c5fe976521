//! Network-subsystem error type.
//!
//! Every variant is a construction-time failure: a scenario that builds
//! successfully is internally consistent for the whole run.

use thiserror::Error;

use ls_core::{LinkId, NodeId, SimTime, VehicleId, WorkerId};

/// Errors produced by `ls-network`.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("link {0} not found in network")]
    UnknownLink(LinkId),

    #[error("node {0} not found in network")]
    UnknownNode(NodeId),

    #[error("invalid attributes on {link}: {reason}")]
    InvalidLink { link: LinkId, reason: String },

    #[error("invalid volume-delay parameters: {0}")]
    InvalidVolumeDelay(String),

    #[error("partition has no clusters")]
    NoClusters,

    #[error("cluster of {0} is empty")]
    EmptyCluster(WorkerId),

    #[error("{0} is not assigned to any cluster")]
    UnassignedLink(LinkId),

    #[error("{link} assigned to both {first} and {second}")]
    DuplicateAssignment { link: LinkId, first: WorkerId, second: WorkerId },

    #[error("{0} has an empty route")]
    EmptyRoute(VehicleId),

    #[error("route of {vehicle} jumps from {from} to {to}, which do not share a node")]
    DisconnectedRoute { vehicle: VehicleId, from: LinkId, to: LinkId },

    #[error("{vehicle} has invalid departure time {departure}")]
    InvalidDeparture { vehicle: VehicleId, departure: SimTime },

    #[error("{0} appears in more than one trip")]
    DuplicateVehicle(VehicleId),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type NetworkResult<T> = Result<T, NetworkError>;
