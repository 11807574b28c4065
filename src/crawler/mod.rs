//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the `PageFetcher` trait
//! - HTML parsing, link extraction and record extraction
//! - The frontier, visit budget and per-worker pacing
//! - Overall crawl coordination

mod coordinator;
mod extractor;
mod fetcher;
mod parser;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator, CrawlOutcome, CrawlReport};
pub use extractor::{extract, parse_score, Degradation, Extraction, Field, RestaurantRecord};
pub use fetcher::{build_http_client, FetchError, FetchedPage, HttpFetcher, PageFetcher};
pub use parser::{ParseError, ParsedPage};
pub use scheduler::{CrawlRequest, Frontier, Pacer, VisitBudget};
