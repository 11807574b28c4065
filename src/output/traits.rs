//! Record sink trait and error types
//!
//! A sink receives every restaurant record the crawl produces. Sink failures
//! are reported per record and never stop the crawl.

use crate::crawler::{CrawlReport, RestaurantRecord};
use crate::storage::StorageError;
use thiserror::Error;

/// Errors that can occur while handing off records
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write record {url}: {message}")]
    Write { url: String, message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Consumer of extracted restaurant records
///
/// Workers call [`RecordSink::accept`] concurrently, so implementations must
/// be thread-safe.
pub trait RecordSink: Send + Sync {
    /// Takes one record
    ///
    /// # Arguments
    ///
    /// * `record` - The record extracted from a detail page
    fn accept(&self, record: &RestaurantRecord) -> SinkResult<()>;

    /// Called once after the run has stopped
    ///
    /// # Arguments
    ///
    /// * `report` - The final outcome and counters of the run
    fn finish(&self, _report: &CrawlReport) -> SinkResult<()> {
        Ok(())
    }
}
