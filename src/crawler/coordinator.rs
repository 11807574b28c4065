//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the worker loop that coordinates all aspects of the
//! crawling process, including:
//! - Seeding the frontier and driving the run state machine
//! - Deduplication, the visit budget and per-worker pacing
//! - Fetching, classifying and expanding pages
//! - Handing restaurant records to the sink
//! - Handling interrupts

use crate::config::{validate, Config};
use crate::crawler::extractor::{extract, Extraction};
use crate::crawler::fetcher::{HttpFetcher, PageFetcher};
use crate::crawler::parser::{ParseError, ParsedPage};
use crate::crawler::scheduler::{CrawlRequest, Frontier, Pacer, VisitBudget};
use crate::output::{CrawlStats, RecordSink, StatsSnapshot};
use crate::state::{RunState, VisitedSet};
use crate::url::{normalize_url, PageRole, UrlClassifier};
use crate::{CrawlerError, Result};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Progress is logged every this many fetched pages
const PROGRESS_INTERVAL: u64 = 10;

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// No work left while budget remained
    FrontierEmpty,
    /// The visit budget ran out
    BudgetExhausted,
    /// Stopped by the cancellation token
    Cancelled,
}

impl CrawlOutcome {
    fn from_state(state: RunState) -> Option<Self> {
        match state {
            RunState::Draining => Some(Self::FrontierEmpty),
            RunState::Exhausted => Some(Self::BudgetExhausted),
            RunState::Cancelled => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FrontierEmpty => "frontier empty",
            Self::BudgetExhausted => "budget exhausted",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for CrawlOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of a finished run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub outcome: CrawlOutcome,

    /// Number of distinct URLs marked visited
    pub visited: usize,

    pub stats: StatsSnapshot,

    pub elapsed: Duration,
}

/// What a fetched page yielded, computed without holding the document
/// across an await point
#[derive(Debug, Default)]
struct Digest {
    links: Vec<CrawlRequest>,
    extraction: Option<Extraction>,
}

/// State shared by every worker of one run
struct Shared {
    config: Config,
    classifier: UrlClassifier,
    fetcher: Arc<dyn PageFetcher>,
    sink: Arc<dyn RecordSink>,
    visited: VisitedSet,
    frontier: Frontier,
    budget: VisitBudget,
    stats: CrawlStats,
    cancel: CancellationToken,
    state: Mutex<RunState>,
    started: OnceCell<Instant>,
}

/// Main crawler coordinator structure
///
/// One coordinator drives exactly one run.
pub struct Coordinator {
    shared: Arc<Shared>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `fetcher` - Retrieves page bodies
    /// * `sink` - Receives every extracted restaurant record
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(CrawlerError)` - The configuration is unusable
    pub fn new(
        config: Config,
        fetcher: Arc<dyn PageFetcher>,
        sink: Arc<dyn RecordSink>,
    ) -> Result<Self> {
        validate(&config)?;
        let classifier = UrlClassifier::new(&config.site.base_url)?;
        let budget = VisitBudget::new(config.crawler.max_visits);

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                classifier,
                fetcher,
                sink,
                visited: VisitedSet::new(),
                frontier: Frontier::new(),
                budget,
                stats: CrawlStats::new(),
                cancel: CancellationToken::new(),
                state: Mutex::new(RunState::Idle),
                started: OnceCell::new(),
            }),
        })
    }

    /// Token that stops the run when cancelled
    ///
    /// Workers stop dequeuing, pacing waits are interrupted, and fetches
    /// already in flight are allowed to finish.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shared.cancel.clone()
    }

    /// Current run state
    pub fn state(&self) -> RunState {
        *self.shared.state.lock()
    }

    /// Runs the crawl from `seed` until the frontier drains, the budget runs
    /// out, or the run is cancelled
    ///
    /// Per-request failures are logged and counted, never returned. Errors
    /// are only returned for an invalid seed or a second call on the same
    /// coordinator.
    pub async fn run(&self, seed: &str) -> Result<CrawlReport> {
        let seed_url = normalize_url(seed)?;
        self.shared.transition(RunState::Running)?;
        let started = *self.shared.started.get_or_init(Instant::now);

        let workers = self.shared.config.crawler.workers.max(1);
        tracing::info!(
            "Starting crawl from {} ({} workers, budget {}, delay {:?})",
            seed_url,
            workers,
            self.shared.config.crawler.max_visits,
            self.shared.config.crawler.delay()
        );

        if self.shared.cancel.is_cancelled() {
            self.shared.end(RunState::Cancelled);
        } else {
            self.shared.frontier.push(CrawlRequest::new(seed_url, 0));

            let mut set = JoinSet::new();
            for id in 0..workers {
                set.spawn(worker(Arc::clone(&self.shared), id));
            }
            while let Some(joined) = set.join_next().await {
                if let Err(e) = joined {
                    tracing::error!("Worker task failed: {}", e);
                }
            }

            if self.shared.cancel.is_cancelled() {
                self.shared.end(RunState::Cancelled);
            }
            self.shared.end(RunState::Draining);
        }

        let terminal = self.state();
        let outcome = CrawlOutcome::from_state(terminal).ok_or(CrawlerError::InvalidTransition {
            from: terminal,
            to: RunState::Stopped,
        })?;
        self.shared.transition(RunState::Stopped)?;

        let report = CrawlReport {
            outcome,
            visited: self.shared.visited.len(),
            stats: self.shared.stats.snapshot(),
            elapsed: started.elapsed(),
        };

        tracing::info!(
            "Crawl stopped ({}): {} pages fetched, {} records in {:?}",
            report.outcome,
            report.stats.pages_fetched,
            report.stats.records_emitted,
            report.elapsed
        );

        if let Err(e) = self.shared.sink.finish(&report) {
            tracing::error!("Failed to finalize record sink: {}", e);
        }

        Ok(report)
    }
}

/// One worker: takes requests until the frontier closes or drains
async fn worker(shared: Arc<Shared>, id: u32) {
    let mut pacer = Pacer::new(shared.config.crawler.delay());

    while let Some(request) = shared.frontier.next(&shared.cancel).await {
        shared.process(&request, &mut pacer).await;
        shared.frontier.complete();
    }

    tracing::debug!("Worker {} finished", id);
}

impl Shared {
    fn transition(&self, to: RunState) -> Result<()> {
        let mut state = self.state.lock();
        *state = state.transition(to)?;
        Ok(())
    }

    /// Enters a terminal state if the run is still running
    ///
    /// Returns true for the caller that ended the run.
    fn end(&self, terminal: RunState) -> bool {
        let mut state = self.state.lock();
        if state.can_transition_to(terminal) && state.is_active() {
            *state = terminal;
            true
        } else {
            false
        }
    }

    fn is_active(&self) -> bool {
        self.state.lock().is_active()
    }

    /// Processes a single request
    ///
    /// This method:
    /// 1. Drops already visited URLs
    /// 2. Takes one unit of budget
    /// 3. Waits for this worker's pacing delay
    /// 4. Fetches and classifies the page
    /// 5. Enqueues links from index and listing pages
    /// 6. Extracts a record from detail pages
    async fn process(&self, request: &CrawlRequest, pacer: &mut Pacer) {
        let url = &request.url;

        if !self.visited.try_mark(url) {
            tracing::trace!("Already visited {}", url);
            self.stats.record_duplicate();
            return;
        }

        if !self.take_budget() {
            return;
        }

        if !pacer.wait(&self.cancel).await {
            self.end(RunState::Cancelled);
            return;
        }

        tracing::debug!("Fetching {} (depth {})", url, request.depth);
        let page = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(e) if e.is_parse_failure() => {
                tracing::warn!("Unusable page: {}", e);
                self.stats.record_parse_error();
                return;
            }
            Err(e) => {
                tracing::warn!("Fetch failed: {}", e);
                self.stats.record_fetch_error();
                return;
            }
        };

        let fetched = self.stats.record_fetch();
        if fetched % PROGRESS_INTERVAL == 0 {
            self.log_progress(fetched);
        }

        let role = self.classifier.classify(url);
        if role == PageRole::Rejected {
            tracing::debug!("Rejected {}", url);
            self.stats.record_rejected();
            return;
        }

        let digest = match self.digest(request, role, &page.body, &page.final_url) {
            Ok(digest) => digest,
            Err(e) => {
                tracing::warn!("Failed to parse HTML: {}", e);
                self.stats.record_parse_error();
                return;
            }
        };

        self.enqueue(digest.links);

        if let Some(extraction) = digest.extraction {
            self.emit(extraction);
        }
    }

    /// Takes one unit of budget for the request about to be fetched
    ///
    /// The unit that empties the budget ends the run as exhausted before its
    /// fetch, so the frontier is closed while that fetch is still in flight.
    /// Returns false when no unit was left.
    fn take_budget(&self) -> bool {
        let remaining = self.budget.try_take();
        if remaining.map_or(true, |left| left == 0) {
            let discarded = self.frontier.close();
            if self.end(RunState::Exhausted) {
                tracing::info!(
                    "Visit budget of {} exhausted, discarding {} queued requests",
                    self.config.crawler.max_visits,
                    discarded
                );
            }
        }
        remaining.is_some()
    }

    /// Parses the body and works out links and record for a page
    fn digest(
        &self,
        request: &CrawlRequest,
        role: PageRole,
        body: &str,
        base_url: &Url,
    ) -> std::result::Result<Digest, ParseError> {
        let parsed = ParsedPage::parse(body, base_url)?;
        let mut digest = Digest::default();

        if role.expands_links() {
            let within_depth = self
                .config
                .crawler
                .max_depth
                .map_or(true, |max| request.depth < max);

            if within_depth {
                digest.links = parsed
                    .links
                    .into_iter()
                    .filter(|link| self.classifier.classify(link).is_accepted())
                    .filter(|link| !self.visited.contains(link))
                    .map(|link| request.child(link))
                    .collect();
            }
        }

        if role.is_detail() {
            digest.extraction = Some(extract(&parsed.document, &request.url));
        }

        Ok(digest)
    }

    fn enqueue(&self, links: Vec<CrawlRequest>) {
        if links.is_empty() {
            return;
        }

        if !self.is_active() {
            tracing::debug!("Run has ended, discarding {} links", links.len());
            return;
        }

        let mut pushed = 0;
        for link in links {
            if self.frontier.push(link) {
                pushed += 1;
            }
        }
        self.stats.record_links_enqueued(pushed);
    }

    fn emit(&self, extraction: Extraction) {
        let record = extraction.record;

        if !extraction.degraded.is_empty() {
            let fields: Vec<String> = extraction.degraded.iter().map(|d| d.to_string()).collect();
            tracing::debug!("Degraded record {}: {}", record.source_url, fields.join(", "));
            self.stats.record_degraded(extraction.degraded.len() as u64);
        }

        match self.sink.accept(&record) {
            Ok(()) => {
                self.stats.record_emitted();
            }
            Err(e) => {
                tracing::warn!("Record sink rejected {}: {}", record.source_url, e);
                self.stats.record_sink_error();
            }
        }
    }

    fn log_progress(&self, fetched: u64) {
        let rate = self
            .started
            .get()
            .map(|started| fetched as f64 / started.elapsed().as_secs_f64().max(f64::EPSILON))
            .unwrap_or(0.0);
        tracing::info!(
            "Progress: {} pages fetched, {} in frontier, {} records, {:.2} pages/sec",
            fetched,
            self.frontier.len(),
            self.stats.snapshot().records_emitted,
            rate
        );
    }
}

/// Runs a complete crawl with the HTTP fetcher
///
/// This function builds the fetcher from the configuration, starts the crawl
/// from `config.crawler.seed`, and cancels it on Ctrl-C.
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `sink` - Receives every extracted restaurant record
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tabelog_crawler::config::Config;
/// use tabelog_crawler::crawler::run_crawl;
/// use tabelog_crawler::output::LogSink;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let report = run_crawl(Config::default(), Arc::new(LogSink::new())).await?;
/// println!("{}", report.outcome);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, sink: Arc<dyn RecordSink>) -> Result<CrawlReport> {
    let fetcher = HttpFetcher::from_config(&config.user_agent, &config.fetch)?;
    let seed = config.crawler.seed.clone();
    let coordinator = Coordinator::new(config, Arc::new(fetcher), sink)?;

    let token = coordinator.cancellation_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping crawl");
            token.cancel();
        }
    });

    let result = coordinator.run(&seed).await;
    interrupt.abort();
    result
}
