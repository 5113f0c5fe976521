//! Framework error type.
//!
//! Sub-crates define their own error enums (`NetworkError`, `WorkerError`,
//! `SimError`, …) and wrap `LsError` where a core failure can surface.

use thiserror::Error;

/// The top-level error type for `ls-core`.
#[derive(Debug, Error)]
pub enum LsError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `ls-core`.
pub type LsResult<T> = Result<T, LsError>;
