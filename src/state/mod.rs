//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `RunState`: lifecycle of one crawl run (idle, running, terminal, stopped)
//! - `VisitedSet`: concurrent deduplication of normalized URLs

mod run_state;
mod visited;

// Re-export main types
pub use run_state::RunState;
pub use visited::VisitedSet;
