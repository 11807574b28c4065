//! Output module for crawl records and reports
//!
//! This module handles:
//! - The `RecordSink` seam the coordinator hands records to
//! - Persisting records to SQLite, or writing them to the log
//! - Recording crawl statistics and printing the final summary

mod log_sink;
mod sqlite_output;
pub mod stats;
mod traits;

pub use log_sink::LogSink;
pub use sqlite_output::SqliteRecordSink;
pub use stats::{print_statistics, CrawlStats, StatsSnapshot};
pub use traits::{RecordSink, SinkError, SinkResult};
