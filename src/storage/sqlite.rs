//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::crawler::RestaurantRecord;
use crate::output::StatsSnapshot;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, status, \
     pages_fetched, records_emitted, fetch_errors, parse_errors";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<(RunRecord, String)> {
    let status: String = row.get(4)?;
    let run = RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::Running,
        pages_fetched: row.get::<_, i64>(5)? as u64,
        records_emitted: row.get::<_, i64>(6)? as u64,
        fetch_errors: row.get::<_, i64>(7)? as u64,
        parse_errors: row.get::<_, i64>(8)? as u64,
    };
    Ok((run, status))
}

fn with_status((mut run, status): (RunRecord, String)) -> StorageResult<RunRecord> {
    run.status = RunStatus::from_db_string(&status).ok_or(StorageError::InvalidStatus(status))?;
    Ok(run)
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS))?;

        let row = stmt
            .query_row(params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))?;

        with_status(row)
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM runs ORDER BY id DESC LIMIT 1",
            RUN_COLUMNS
        ))?;

        stmt.query_row([], run_from_row)
            .optional()?
            .map(with_status)
            .transpose()
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        stats: &StatsSnapshot,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, pages_fetched = ?3,
                 records_emitted = ?4, fetch_errors = ?5, parse_errors = ?6
             WHERE id = ?7",
            params![
                status.to_db_string(),
                now,
                stats.pages_fetched as i64,
                stats.records_emitted as i64,
                stats.fetch_errors as i64,
                stats.parse_errors as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Restaurant Management =====

    fn upsert_restaurant(&mut self, record: &RestaurantRecord, run_id: i64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO restaurants
                 (source_url, name, score, genre, phone, address, hours, holiday,
                  first_seen_run, last_seen_run, scraped_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9, ?10)
             ON CONFLICT(source_url) DO UPDATE SET
                 name = excluded.name,
                 score = excluded.score,
                 genre = excluded.genre,
                 phone = excluded.phone,
                 address = excluded.address,
                 hours = excluded.hours,
                 holiday = excluded.holiday,
                 last_seen_run = excluded.last_seen_run,
                 scraped_at = excluded.scraped_at",
            params![
                record.source_url,
                record.name,
                record.score,
                record.genre,
                record.phone,
                record.address,
                record.hours,
                record.holiday,
                run_id,
                now
            ],
        )?;
        Ok(())
    }

    fn get_restaurant(&self, source_url: &str) -> StorageResult<Option<RestaurantRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, score, genre, phone, address, hours, holiday, source_url
             FROM restaurants WHERE source_url = ?1",
        )?;

        let record = stmt
            .query_row(params![source_url], |row| {
                Ok(RestaurantRecord {
                    name: row.get(0)?,
                    score: row.get(1)?,
                    genre: row.get(2)?,
                    phone: row.get(3)?,
                    address: row.get(4)?,
                    hours: row.get(5)?,
                    holiday: row.get(6)?,
                    source_url: row.get(7)?,
                })
            })
            .optional()?;

        Ok(record)
    }

    fn count_restaurants(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM restaurants", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
