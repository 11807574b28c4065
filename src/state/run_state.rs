//! Run state definitions for a single crawl run
//!
//! A run moves `Idle → Running`, then into exactly one terminal condition
//! (`Draining`, `Exhausted` or `Cancelled`), and finally to `Stopped` once all
//! in-flight work has completed.

use crate::CrawlerError;
use std::fmt;

/// Represents the current state of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Created, seed not yet enqueued
    Idle,

    /// Frontier non-empty and budget remaining
    Running,

    // ===== Terminal Conditions =====
    /// Frontier emptied while budget remained; no more work exists
    Draining,

    /// Visit budget hit zero; remaining frontier entries are discarded
    Exhausted,

    /// External stop signal received
    Cancelled,

    /// All workers have finished
    Stopped,
}

impl RunState {
    /// Returns true if the run still accepts new fetches
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns true once a terminal condition has been reached
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Draining | Self::Exhausted | Self::Cancelled)
    }

    /// Returns true if moving from `self` to `to` is a legal transition
    pub fn can_transition_to(&self, to: RunState) -> bool {
        matches!(
            (self, to),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Draining)
                | (Self::Running, Self::Exhausted)
                | (Self::Running, Self::Cancelled)
                | (Self::Draining, Self::Stopped)
                | (Self::Exhausted, Self::Stopped)
                | (Self::Cancelled, Self::Stopped)
        )
    }

    /// Performs a transition, rejecting illegal ones
    pub fn transition(self, to: RunState) -> Result<RunState, CrawlerError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(CrawlerError::InvalidTransition { from: self, to })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Exhausted => "exhausted",
            Self::Cancelled => "cancelled",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
