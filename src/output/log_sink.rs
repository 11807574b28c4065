use crate::crawler::{CrawlReport, RestaurantRecord};
use crate::output::traits::{RecordSink, SinkResult};

/// Sink that writes each record as a structured log event
///
/// Used with `--log-only`, when nothing should be persisted.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

impl RecordSink for LogSink {
    fn accept(&self, record: &RestaurantRecord) -> SinkResult<()> {
        tracing::info!(
            name = %record.name,
            score = record.score,
            genre = %record.genre,
            phone = %record.phone,
            address = %record.address,
            hours = %record.hours,
            holiday = %record.holiday,
            url = %record.source_url,
            "restaurant"
        );
        Ok(())
    }

    fn finish(&self, report: &CrawlReport) -> SinkResult<()> {
        tracing::info!(
            "Run finished ({}): {} records from {} pages",
            report.outcome,
            report.stats.records_emitted,
            report.stats.pages_fetched
        );
        Ok(())
    }
}
