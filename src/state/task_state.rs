/// Task state definitions for tracking crawl progress
///
/// This module defines all possible states a crawl task can be in.
use std::fmt;

/// Represents the current state of one crawl task
///
/// A task handles a single (URL, depth budget) pair. Reaching a terminal state
/// ends the task itself; its spawned children are tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    // ===== Active States =====
    /// Task has been registered and spawned but has not started
    Pending,

    /// Task is waiting on the fetch capability
    Fetching,

    // ===== Terminal Success States =====
    /// URL was fetched (and emitted unless already delivered); one child per link was spawned
    SpawnedChildren,

    // ===== Terminal Skip States =====
    /// Depth budget was exhausted; nothing was fetched
    Pruned,

    /// URL was already visited by another task (visit-once traversal only)
    Skipped,

    /// Crawl was cancelled before this task finished
    Cancelled,

    // ===== Terminal Error States =====
    /// The fetch failed; the subtree below this URL is abandoned
    FetchFailed,
}

impl TaskState {
    /// Returns true if this is a terminal state
    ///
    /// Active states (Pending, Fetching) are not terminal.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Fetching)
    }

    /// Short lowercase name used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::SpawnedChildren => "spawned_children",
            Self::Pruned => "pruned",
            Self::Skipped => "skipped",
            Self::Cancelled => "cancelled",
            Self::FetchFailed => "fetch_failed",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
