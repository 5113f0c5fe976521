//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `events.csv`
//! - `epoch_summaries.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::{OutputWriter, check_dir};
use crate::{EpochSummaryRow, EventRow, OutputError, OutputResult};

/// Writes simulation output to two CSV files.
pub struct CsvWriter {
    events:    Writer<File>,
    summaries: Writer<File>,
    finished:  bool,
}

impl CsvWriter {
    /// Open (or create) the two CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        check_dir(dir)?;
        let mut events = Writer::from_path(dir.join("events.csv"))?;
        events.write_record(["time", "vehicle_id", "link_id", "leg", "kind"])?;

        let mut summaries = Writer::from_path(dir.join("epoch_summaries.csv"))?;
        summaries.write_record(["epoch", "till_time", "sub_rounds", "events_flushed", "cross_events", "arrivals"])?;

        Ok(Self {
            events,
            summaries,
            finished: false,
        })
    }
}

impl OutputWriter for CsvWriter {
    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()> {
        if self.finished {
            return Err(OutputError::Finished { backend: "CSV", what: "event" });
        }
        for row in rows {
            self.events.write_record(&[
                row.time.to_string(),
                row.vehicle_id.to_string(),
                row.link_id.to_string(),
                row.leg.to_string(),
                row.kind.to_owned(),
            ])?;
        }
        Ok(())
    }

    fn write_epoch_summary(&mut self, row: &EpochSummaryRow) -> OutputResult<()> {
        if self.finished {
            return Err(OutputError::Finished { backend: "CSV", what: "epoch summary" });
        }
        self.summaries.write_record(&[
            row.epoch.to_string(),
            row.till_time.to_string(),
            row.sub_rounds.to_string(),
            row.events_flushed.to_string(),
            row.cross_events.to_string(),
            row.arrivals.to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.events.flush()?;
        self.summaries.flush()?;
        Ok(())
    }
}
