//! Scheduler primitives for the crawl frontier and rate limiting
//!
//! This module handles:
//! - The shared FIFO frontier of pending requests, with drain detection
//! - The global visit budget
//! - Per-worker pacing between fetch dispatches

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A URL queued for fetching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    /// Normalized URL to fetch
    pub url: Url,

    /// Link distance from the seed (seed = 0)
    pub depth: u32,
}

impl CrawlRequest {
    pub fn new(url: Url, depth: u32) -> Self {
        Self { url, depth }
    }

    /// Request for a link discovered on this page
    pub fn child(&self, url: Url) -> Self {
        Self {
            url,
            depth: self.depth + 1,
        }
    }
}

#[derive(Debug, Default)]
struct FrontierInner {
    queue: VecDeque<CrawlRequest>,
    in_flight: usize,
    closed: bool,
}

/// Shared FIFO queue of pending crawl requests
///
/// Workers take requests with [`Frontier::next`] and must report each one
/// with [`Frontier::complete`] after pushing its discovered links. The
/// frontier is drained once the queue is empty and no request is in flight;
/// at that point every waiting worker is released with `None`.
#[derive(Debug, Default)]
pub struct Frontier {
    inner: Mutex<FrontierInner>,
    notify: Notify,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a request
    ///
    /// Returns false if the frontier was closed and the request was dropped.
    pub fn push(&self, request: CrawlRequest) -> bool {
        {
            let mut inner = self.inner.lock();
            if inner.closed {
                return false;
            }
            inner.queue.push_back(request);
        }
        self.notify.notify_waiters();
        true
    }

    /// Takes the next request, waiting while other workers may still add more
    ///
    /// # Returns
    ///
    /// * `Some(CrawlRequest)` - A request; the caller now owns one in-flight slot
    /// * `None` - The frontier is closed, drained, or `cancel` fired
    pub async fn next(&self, cancel: &CancellationToken) -> Option<CrawlRequest> {
        loop {
            if cancel.is_cancelled() {
                return None;
            }

            // Register interest before inspecting the queue so a push or
            // completion between the check and the await is not lost.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut inner = self.inner.lock();
                if inner.closed {
                    return None;
                }
                if let Some(request) = inner.queue.pop_front() {
                    inner.in_flight += 1;
                    return Some(request);
                }
                if inner.in_flight == 0 {
                    inner.closed = true;
                    drop(inner);
                    tracing::debug!("Frontier drained");
                    self.notify.notify_waiters();
                    return None;
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => return None,
                _ = &mut notified => {}
            }
        }
    }

    /// Releases the in-flight slot taken by [`Frontier::next`]
    pub fn complete(&self) {
        {
            let mut inner = self.inner.lock();
            inner.in_flight = inner.in_flight.saturating_sub(1);
        }
        self.notify.notify_waiters();
    }

    /// Closes the frontier and discards pending requests
    ///
    /// Returns the number of discarded requests.
    pub fn close(&self) -> usize {
        let discarded = {
            let mut inner = self.inner.lock();
            inner.closed = true;
            let discarded = inner.queue.len();
            inner.queue.clear();
            discarded
        };
        self.notify.notify_waiters();
        discarded
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Returns the number of queued requests
    pub fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().queue.is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.inner.lock().in_flight
    }
}

/// Global cap on dispatched fetches
#[derive(Debug)]
pub struct VisitBudget {
    remaining: AtomicU64,
}

impl VisitBudget {
    pub fn new(max_visits: u64) -> Self {
        Self {
            remaining: AtomicU64::new(max_visits),
        }
    }

    /// Takes one unit and returns what is left after it
    ///
    /// `None` once the budget is spent. `Some(0)` goes to exactly one caller,
    /// the one that took the last unit.
    pub fn try_take(&self) -> Option<u64> {
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .ok()
            .map(|previous| previous - 1)
    }

    pub fn remaining(&self) -> u64 {
        self.remaining.load(Ordering::SeqCst)
    }
}

/// Minimum spacing between one worker's successive fetch dispatches
#[derive(Debug)]
pub struct Pacer {
    delay: Duration,
    last: Option<Instant>,
}

impl Pacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, last: None }
    }

    /// Waits until the next dispatch is allowed and records it
    ///
    /// The first dispatch is immediate. Returns false, without recording a
    /// dispatch, if `cancel` fires first.
    pub async fn wait(&mut self, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }

        if let Some(last) = self.last {
            let deadline = last + self.delay;
            if deadline > Instant::now() {
                tokio::select! {
                    _ = cancel.cancelled() => return false,
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
        }

        self.last = Some(Instant::now());
        true
    }
}
