use ls_core::{EventKind, LinkId, VehicleId, WorkerId};
use thiserror::Error;

/// A worker hit an event it cannot process.  Always fatal to the run: the
/// simulation is deterministic, so this is a data or logic defect.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("{0} used before init")]
    NotInitialized(WorkerId),

    #[error("{worker} received an event for {link}, which it does not own")]
    NotOwned { worker: WorkerId, link: LinkId },

    #[error("no trip for {0}")]
    UnknownVehicle(VehicleId),

    #[error("{vehicle} leg {leg} does not match {link} on its route")]
    LegMismatch { vehicle: VehicleId, leg: u32, link: LinkId },

    #[error("{vehicle} left {link} while the link was empty")]
    VolumeUnderflow { vehicle: VehicleId, link: LinkId },

    #[error("{kind} event for {vehicle} cannot be queued")]
    UnexpectedKind { vehicle: VehicleId, kind: EventKind },
}

pub type WorkerResult<T> = Result<T, WorkerError>;
