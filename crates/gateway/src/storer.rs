//! Store consumer: durably records every reading.
//!
//! Owns the only database connection in the process. Rows go in one at a
//! time through a cached prepared statement; a failed insert is logged and
//! counted, and the record stays observed - the lane must keep moving so
//! the reclaimer can drain behind it.

use fanbuf::{PipelineBuffer, RecordSnapshot};
use log::{debug, error};
use rusqlite::{params, Connection};
use std::sync::Arc;

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS sensor_readings (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    sensor_id INTEGER NOT NULL,
    value     REAL    NOT NULL,
    timestamp INTEGER NOT NULL
);";

const INSERT_READING: &str =
    "INSERT INTO sensor_readings (sensor_id, value, timestamp) VALUES (?1, ?2, ?3)";

/// Counters reported by the storer when its lane drains.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StorerStats {
    /// Rows written.
    pub stored: u64,
    /// Inserts that failed; the readings were dropped from persistence.
    pub failed: u64,
}

/// Long-running worker owning the store lane and the database connection.
pub struct Storer {
    buffer: Arc<PipelineBuffer>,
    conn: Connection,
    stats: StorerStats,
}

impl Storer {
    /// Opens `db_uri` and bootstraps the schema. Failures here are fatal
    /// setup errors; after this point database trouble is per-record.
    pub fn open(buffer: Arc<PipelineBuffer>, db_uri: &str) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(db_uri)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            buffer,
            conn,
            stats: StorerStats::default(),
        })
    }

    /// Consumes the store lane until end of stream, returning the final
    /// counters.
    pub fn run(mut self) -> StorerStats {
        while let Some(snapshot) = self.buffer.take_next_to_store() {
            self.store(&snapshot);
        }
        debug!("store lane drained after {} rows", self.stats.stored);
        self.stats
    }

    fn store(&mut self, snapshot: &RecordSnapshot) {
        let result = self.conn.prepare_cached(INSERT_READING).and_then(|mut stmt| {
            stmt.execute(params![
                snapshot.sensor_id,
                snapshot.value,
                snapshot.timestamp
            ])
        });

        match result {
            Ok(_) => {
                self.stats.stored += 1;
                debug!(
                    "stored sensor {} value {} (seq {})",
                    snapshot.sensor_id, snapshot.value, snapshot.seq
                );
            }
            Err(e) => {
                self.stats.failed += 1;
                error!(
                    "failed to store reading from sensor {} (seq {}): {e}",
                    snapshot.sensor_id, snapshot.seq
                );
            }
        }
    }
}
