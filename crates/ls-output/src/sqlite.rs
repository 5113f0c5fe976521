//! SQLite output backend (feature `sqlite`).
//!
//! Creates a single `output.db` file in the configured output directory with
//! two tables: `events` and `epoch_summaries`.

use std::path::Path;

use rusqlite::Connection;

use crate::writer::{OutputWriter, check_dir};
use crate::{EpochSummaryRow, EventRow, OutputError, OutputResult};

/// Writes simulation output to an SQLite database.
pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `output.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        check_dir(dir)?;
        let conn = Connection::open(dir.join("output.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS events (
                 seq        INTEGER PRIMARY KEY,
                 time       REAL    NOT NULL,
                 vehicle_id INTEGER NOT NULL,
                 link_id    INTEGER NOT NULL,
                 leg        INTEGER NOT NULL,
                 kind       TEXT    NOT NULL
             );
             CREATE TABLE IF NOT EXISTS epoch_summaries (
                 epoch          INTEGER PRIMARY KEY,
                 till_time      REAL    NOT NULL,
                 sub_rounds     INTEGER NOT NULL,
                 events_flushed INTEGER NOT NULL,
                 cross_events   INTEGER NOT NULL,
                 arrivals       INTEGER NOT NULL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl OutputWriter for SqliteWriter {
    /// Rows get an increasing `seq`, so `ORDER BY seq` replays flush order.
    fn write_events(&mut self, rows: &[EventRow]) -> OutputResult<()> {
        if self.finished {
            return Err(OutputError::Finished { backend: "SQLite", what: "event" });
        }
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO events (time, vehicle_id, link_id, leg, kind) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for row in rows {
                stmt.execute(rusqlite::params![row.time, row.vehicle_id, row.link_id, row.leg, row.kind])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_epoch_summary(&mut self, row: &EpochSummaryRow) -> OutputResult<()> {
        if self.finished {
            return Err(OutputError::Finished { backend: "SQLite", what: "epoch summary" });
        }
        self.conn.execute(
            "INSERT INTO epoch_summaries \
             (epoch, till_time, sub_rounds, events_flushed, cross_events, arrivals) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                row.epoch as i64,
                row.till_time,
                row.sub_rounds,
                row.events_flushed as i64,
                row.cross_events as i64,
                row.arrivals as i64,
            ],
        )?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
