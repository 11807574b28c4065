//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::crawler::RestaurantRecord;
use crate::output::StatsSnapshot;
use crate::storage::{RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Invalid run status in database: {0}")]
    InvalidStatus(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines the database operations needed to persist a crawl.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration the run was started with
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recently started run, if any
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Records the final status and counters of a run
    ///
    /// # Arguments
    ///
    /// * `run_id` - The run to close
    /// * `status` - Why the run stopped
    /// * `stats` - Final counters
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        stats: &StatsSnapshot,
    ) -> StorageResult<()>;

    // ===== Restaurant Management =====

    /// Inserts a restaurant or refreshes the existing row for its source URL
    ///
    /// # Arguments
    ///
    /// * `record` - The extracted record
    /// * `run_id` - The run that produced it
    fn upsert_restaurant(&mut self, record: &RestaurantRecord, run_id: i64) -> StorageResult<()>;

    /// Gets a restaurant by the URL of its detail page
    fn get_restaurant(&self, source_url: &str) -> StorageResult<Option<RestaurantRecord>>;

    /// Counts stored restaurants
    fn count_restaurants(&self) -> StorageResult<u64>;
}
