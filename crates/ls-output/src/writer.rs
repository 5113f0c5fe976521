//! The `OutputWriter` trait implemented by all backend writers.

use std::path::Path;

use crate::{EpochSummaryRow, EventRow, OutputError, OutputResult};

/// Trait implemented by CSV, SQLite, and Parquet writers.
///
/// All methods are infallible from the sink's perspective: errors are
/// stored internally and retrieved with [`EventOutputSink::take_error`][crate::EventOutputSink::take_error].
pub trait OutputWriter {
    /// Write one epoch's events, already in flush order.
    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()>;

    /// Write one epoch summary row.
    fn write_epoch_summary(&mut self, row: &EpochSummaryRow) -> OutputResult<()>;

    /// Flush and close all underlying file handles.  Rows written after
    /// this fail with [`OutputError::Finished`].
    ///
    /// Idempotent: safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}

/// Reject an output location that is not an existing directory before any
/// backend creates files in it.
pub(crate) fn check_dir(dir: &Path) -> OutputResult<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(OutputError::NotADirectory(dir.to_path_buf()))
    }
}
