use std::time::Duration;

use ls_core::{LsError, SimTime, WorkerId};
use ls_network::NetworkError;
use ls_worker::WorkerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(#[from] LsError),

    #[error("scenario error: {0}")]
    Network(#[from] NetworkError),

    #[error("{worker} failed: {source}")]
    Worker {
        worker: WorkerId,
        #[source]
        source: WorkerError,
    },

    #[error("{worker} panicked: {message}")]
    WorkerPanicked { worker: WorkerId, message: String },

    #[error("epoch {epoch} sub-round {sub_round}: workers did not reach the barrier within {waited:?}")]
    BarrierTimeout {
        epoch:     u64,
        sub_round: u32,
        waited:    Duration,
    },

    #[error("epoch {epoch} did not converge within {sub_rounds} sub-rounds")]
    Diverged { epoch: u64, sub_rounds: u32 },

    #[error("epoch {epoch}: boundary {from} + {sync_interval} s is not a finite time")]
    BoundaryOverflow {
        epoch:         u64,
        from:          SimTime,
        sync_interval: f64,
    },

    #[error("epoch {epoch} sub-round {sub_round} made no progress with events still due")]
    Stalled { epoch: u64, sub_round: u32 },

    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),

    #[error("worker pool dropped a reply")]
    Disconnected,

    #[error("coordinator was aborted by an earlier failure")]
    Aborted,
}

pub type SimResult<T> = Result<T, SimError>;
