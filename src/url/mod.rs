//! URL handling module
//!
//! This module provides URL normalization (the deduplication key) and the
//! page-role classifier that decides which discovered URLs are worth crawling.

mod classify;
mod normalize;

pub use classify::{PageRole, UrlClassifier};
pub use normalize::{normalize_parsed, normalize_url};
