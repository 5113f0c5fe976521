//! `EventOutputSink<W>`: bridges `EventSink` to an `OutputWriter`.

use ls_core::SimEvent;
use ls_sim::{EpochReport, EventSink, RunReport};

use crate::row::{EpochSummaryRow, EventRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// An [`EventSink`] that writes flushed events and epoch summaries to any
/// [`OutputWriter`] backend (CSV, SQLite, Parquet, …).
///
/// Errors from the writer are stored internally because `EventSink` methods
/// have no return value.  After `coordinator.run()` returns, check for errors
/// with [`take_error`][Self::take_error].  Once a write has failed, later
/// batches are skipped so the output never has holes in the middle.
pub struct EventOutputSink<W: OutputWriter> {
    writer:     W,
    rows:       Vec<EventRow>,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> EventOutputSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, rows: Vec::new(), last_error: None }
    }

    /// Take the stored write error (if any) after the run returns.
    ///
    /// Returns `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the run).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> EventSink for EventOutputSink<W> {
    fn handle_events(&mut self, events: &[SimEvent]) {
        if events.is_empty() || self.last_error.is_some() {
            return;
        }
        self.rows.clear();
        self.rows.extend(events.iter().map(EventRow::from));
        let result = self.writer.write_events(&self.rows);
        self.store_err(result);
    }

    fn on_epoch_end(&mut self, report: &EpochReport) {
        if self.last_error.is_some() {
            return;
        }
        let result = self.writer.write_epoch_summary(&EpochSummaryRow::from(report));
        self.store_err(result);
    }

    fn on_sim_end(&mut self, _report: &RunReport) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
