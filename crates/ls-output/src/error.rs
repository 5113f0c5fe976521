//! Failures of the output backends.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    /// The output directory is missing or is a regular file.
    #[error("output directory {} does not exist or is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// A row arrived after `finish()` closed the backend's files.
    #[error("{backend} writer already finished; {what} row dropped")]
    Finished { backend: &'static str, what: &'static str },

    #[error("output I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV output failed: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "sqlite")]
    #[error("SQLite output failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[cfg(feature = "parquet")]
    #[error("Arrow batch rejected: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[cfg(feature = "parquet")]
    #[error("Parquet output failed: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}

pub type OutputResult<T> = Result<T, OutputError>;
