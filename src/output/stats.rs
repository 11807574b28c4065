//! Crawl statistics
//!
//! Counters are shared by every worker and updated lock-free. A
//! [`StatsSnapshot`] is taken at the end of the run for reporting and
//! persistence.

use crate::crawler::CrawlReport;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters for one run
#[derive(Debug, Default)]
pub struct CrawlStats {
    pages_fetched: AtomicU64,
    fetch_errors: AtomicU64,
    parse_errors: AtomicU64,
    rejected: AtomicU64,
    duplicates: AtomicU64,
    links_enqueued: AtomicU64,
    records_emitted: AtomicU64,
    sink_errors: AtomicU64,
    degraded_fields: AtomicU64,
}

fn bump(counter: &AtomicU64, by: u64) -> u64 {
    counter.fetch_add(by, Ordering::Relaxed) + by
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a successful fetch, returning the running total
    pub fn record_fetch(&self) -> u64 {
        bump(&self.pages_fetched, 1)
    }

    pub fn record_fetch_error(&self) {
        bump(&self.fetch_errors, 1);
    }

    pub fn record_parse_error(&self) {
        bump(&self.parse_errors, 1);
    }

    pub fn record_rejected(&self) {
        bump(&self.rejected, 1);
    }

    pub fn record_duplicate(&self) {
        bump(&self.duplicates, 1);
    }

    pub fn record_links_enqueued(&self, count: u64) {
        bump(&self.links_enqueued, count);
    }

    pub fn record_emitted(&self) {
        bump(&self.records_emitted, 1);
    }

    pub fn record_sink_error(&self) {
        bump(&self.sink_errors, 1);
    }

    pub fn record_degraded(&self, count: u64) {
        bump(&self.degraded_fields, count);
    }

    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            fetch_errors: self.fetch_errors.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            links_enqueued: self.links_enqueued.load(Ordering::Relaxed),
            records_emitted: self.records_emitted.load(Ordering::Relaxed),
            sink_errors: self.sink_errors.load(Ordering::Relaxed),
            degraded_fields: self.degraded_fields.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`CrawlStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Pages fetched successfully
    pub pages_fetched: u64,

    /// Requests abandoned on a transport or status error
    pub fetch_errors: u64,

    /// Bodies that could not be used as HTML
    pub parse_errors: u64,

    /// Fetched pages whose URL classified as rejected
    pub rejected: u64,

    /// Dequeued requests dropped because the URL was already visited
    pub duplicates: u64,

    /// Discovered links pushed to the frontier
    pub links_enqueued: u64,

    /// Records accepted by the sink
    pub records_emitted: u64,

    /// Records the sink refused
    pub sink_errors: u64,

    /// Record fields that fell back to an empty or zero value
    pub degraded_fields: u64,
}

impl StatsSnapshot {
    /// Requests that reached the fetch step
    pub fn fetch_attempts(&self) -> u64 {
        self.pages_fetched + self.fetch_errors + self.parse_errors
    }

    /// Share of fetch attempts that produced a usable page, as a percentage
    pub fn success_rate(&self) -> f64 {
        let attempts = self.fetch_attempts();
        if attempts == 0 {
            0.0
        } else {
            (self.pages_fetched as f64 / attempts as f64) * 100.0
        }
    }
}

/// Prints the final report to stdout in a formatted manner
///
/// # Arguments
///
/// * `report` - The report returned by the coordinator
pub fn print_statistics(report: &CrawlReport) {
    let stats = &report.stats;

    println!("=== Crawl Statistics ===\n");

    println!("Outcome: {}", report.outcome);
    println!("Elapsed: {:.1}s", report.elapsed.as_secs_f64());
    println!();

    println!("Overview:");
    println!("  URLs visited: {}", report.visited);
    println!("  Pages fetched: {}", stats.pages_fetched);
    println!("  Links enqueued: {}", stats.links_enqueued);
    println!("  Restaurants recorded: {}", stats.records_emitted);
    println!();

    println!("Skipped:");
    println!("  Rejected pages: {}", stats.rejected);
    println!("  Duplicate requests: {}", stats.duplicates);
    println!();

    let errors = stats.fetch_errors + stats.parse_errors + stats.sink_errors;
    if errors > 0 || stats.degraded_fields > 0 {
        println!("Error Summary:");
        println!("  Fetch errors: {}", stats.fetch_errors);
        println!("  Parse errors: {}", stats.parse_errors);
        println!("  Sink errors: {}", stats.sink_errors);
        println!("  Degraded fields: {}", stats.degraded_fields);
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} fetches)",
        stats.success_rate(),
        stats.pages_fetched,
        stats.fetch_attempts()
    );
}
