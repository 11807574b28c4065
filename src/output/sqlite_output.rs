//! SQLite-based record sink
//!
//! This module provides a sink that upserts every record into the
//! `restaurants` table and tracks the run in the `runs` table.

use crate::crawler::{CrawlReport, RestaurantRecord};
use crate::output::traits::{RecordSink, SinkError, SinkResult};
use crate::storage::{RunStatus, SqliteStorage, Storage};
use parking_lot::Mutex;
use std::path::Path;

/// SQLite-based record sink
///
/// A run row is created when the sink is opened and closed by
/// [`RecordSink::finish`].
pub struct SqliteRecordSink {
    storage: Mutex<SqliteStorage>,
    run_id: i64,
}

impl SqliteRecordSink {
    /// Opens (or creates) the database and starts a run
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `config_hash` - Hash of the configuration, stored with the run
    pub fn open(path: &Path, config_hash: &str) -> SinkResult<Self> {
        let storage = SqliteStorage::new(path)?;
        Self::with_storage(storage, config_hash)
    }

    /// Starts a run on an already opened storage
    pub fn with_storage(mut storage: SqliteStorage, config_hash: &str) -> SinkResult<Self> {
        let run_id = storage.create_run(config_hash)?;
        tracing::debug!("Created run {}", run_id);
        Ok(Self {
            storage: Mutex::new(storage),
            run_id,
        })
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }
}

impl RecordSink for SqliteRecordSink {
    fn accept(&self, record: &RestaurantRecord) -> SinkResult<()> {
        self.storage
            .lock()
            .upsert_restaurant(record, self.run_id)
            .map_err(|e| SinkError::Write {
                url: record.source_url.clone(),
                message: e.to_string(),
            })
    }

    fn finish(&self, report: &CrawlReport) -> SinkResult<()> {
        self.storage
            .lock()
            .finish_run(self.run_id, RunStatus::from(report.outcome), &report.stats)?;
        tracing::debug!("Closed run {} as {}", self.run_id, report.outcome);
        Ok(())
    }
}
