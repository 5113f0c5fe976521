//! Parquet output backend (feature `parquet`).
//!
//! Creates two files in the configured output directory:
//! - `events.parquet`
//! - `epoch_summaries.parquet`

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Float64Builder, StringBuilder, UInt32Builder, UInt64Builder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::writer::{OutputWriter, check_dir};
use crate::{EpochSummaryRow, EventRow, OutputError, OutputResult};

fn event_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("time",       DataType::Float64, false),
        Field::new("vehicle_id", DataType::UInt32,  false),
        Field::new("link_id",    DataType::UInt32,  false),
        Field::new("leg",        DataType::UInt32,  false),
        Field::new("kind",       DataType::Utf8,    false),
    ]))
}

fn summary_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("epoch",          DataType::UInt64,  false),
        Field::new("till_time",      DataType::Float64, false),
        Field::new("sub_rounds",     DataType::UInt32,  false),
        Field::new("events_flushed", DataType::UInt64,  false),
        Field::new("cross_events",   DataType::UInt64,  false),
        Field::new("arrivals",       DataType::UInt64,  false),
    ]))
}

fn snappy_props() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build()
}

/// Writes simulation output to two Parquet files.
///
/// `finish()` **must** be called to write the Parquet file footer; files
/// written without calling `finish()` cannot be opened by Parquet readers.
pub struct ParquetWriter {
    events:         Option<ArrowWriter<File>>,
    summaries:      Option<ArrowWriter<File>>,
    event_schema:   Arc<Schema>,
    summary_schema: Arc<Schema>,
}

impl ParquetWriter {
    /// Create both Parquet files in `dir`.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        check_dir(dir)?;
        let event_schema = event_schema();
        let summary_schema = summary_schema();

        let event_file = File::create(dir.join("events.parquet"))?;
        let events = ArrowWriter::try_new(event_file, Arc::clone(&event_schema), Some(snappy_props()))?;

        let summary_file = File::create(dir.join("epoch_summaries.parquet"))?;
        let summaries = ArrowWriter::try_new(summary_file, Arc::clone(&summary_schema), Some(snappy_props()))?;

        Ok(Self {
            events: Some(events),
            summaries: Some(summaries),
            event_schema,
            summary_schema,
        })
    }
}

impl OutputWriter for ParquetWriter {
    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()> {
        let Some(writer) = self.events.as_mut() else {
            return Err(OutputError::Finished { backend: "Parquet", what: "event" });
        };
        if rows.is_empty() {
            return Ok(());
        }

        let mut times    = Float64Builder::new();
        let mut vehicles = UInt32Builder::new();
        let mut links    = UInt32Builder::new();
        let mut legs     = UInt32Builder::new();
        let mut kinds    = StringBuilder::new();

        for row in rows {
            times.append_value(row.time);
            vehicles.append_value(row.vehicle_id);
            links.append_value(row.link_id);
            legs.append_value(row.leg);
            kinds.append_value(row.kind);
        }

        let batch = RecordBatch::try_new(
            Arc::clone(&self.event_schema),
            vec![
                Arc::new(times.finish()),
                Arc::new(vehicles.finish()),
                Arc::new(links.finish()),
                Arc::new(legs.finish()),
                Arc::new(kinds.finish()),
            ],
        )?;
        writer.write(&batch)?;
        Ok(())
    }

    fn write_epoch_summary(&mut self, row: &EpochSummaryRow) -> OutputResult<()> {
        let Some(writer) = self.summaries.as_mut() else {
            return Err(OutputError::Finished { backend: "Parquet", what: "epoch summary" });
        };

        let mut epochs     = UInt64Builder::new();
        let mut tills      = Float64Builder::new();
        let mut sub_rounds = UInt32Builder::new();
        let mut flushed    = UInt64Builder::new();
        let mut cross      = UInt64Builder::new();
        let mut arrivals   = UInt64Builder::new();

        epochs.append_value(row.epoch);
        tills.append_value(row.till_time);
        sub_rounds.append_value(row.sub_rounds);
        flushed.append_value(row.events_flushed);
        cross.append_value(row.cross_events);
        arrivals.append_value(row.arrivals);

        let batch = RecordBatch::try_new(
            Arc::clone(&self.summary_schema),
            vec![
                Arc::new(epochs.finish()),
                Arc::new(tills.finish()),
                Arc::new(sub_rounds.finish()),
                Arc::new(flushed.finish()),
                Arc::new(cross.finish()),
                Arc::new(arrivals.finish()),
            ],
        )?;
        writer.write(&batch)?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if let Some(w) = self.events.take() {
            w.close()?;
        }
        if let Some(w) = self.summaries.take() {
            w.close()?;
        }
        Ok(())
    }
}
