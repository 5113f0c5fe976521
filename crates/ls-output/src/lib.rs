//! `ls-output` — simulation output writers for the linksim traffic engine.
//!
//! Three backends are provided behind Cargo features:
//!
//! | Feature   | Backend     | Files created                                   |
//! |-----------|-------------|-------------------------------------------------|
//! | *(none)*  | CSV         | `events.csv`, `epoch_summaries.csv`             |
//! | `sqlite`  | SQLite      | `output.db`                                     |
//! | `parquet` | Parquet     | `events.parquet`, `epoch_summaries.parquet`     |
//!
//! All backends implement [`OutputWriter`] and are driven by
//! [`EventOutputSink`], which implements `ls_sim::EventSink`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ls_output::{CsvWriter, EventOutputSink};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut sink = EventOutputSink::new(writer);
//! coordinator.run(&mut sink)?;
//! if let Some(e) = sink.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod row;
pub mod sink;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "parquet")]
pub mod parquet;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use row::{EpochSummaryRow, EventRow};
pub use sink::EventOutputSink;
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;

#[cfg(feature = "parquet")]
pub use parquet::ParquetWriter;
