//! Completion coordinator - tracks the live crawl task tree
//!
//! This module decides when the crawl is over, including:
//! - Counting outstanding tasks (root counted before it is spawned)
//! - Handing each task an RAII `TaskGuard` that decrements on drop
//! - Closing the output stream exactly once, on the final decrement
//! - Recording per-outcome counters for the run summary

use crate::state::TaskState;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, Notify};

/// Per-outcome task counters
#[derive(Debug, Default)]
struct CrawlStats {
    spawned: AtomicU64,
    emitted: AtomicU64,
    visited: AtomicU64,
    pruned: AtomicU64,
    skipped: AtomicU64,
    cancelled: AtomicU64,
    failed: AtomicU64,
}

impl CrawlStats {
    fn record(&self, state: TaskState) {
        let counter = match state {
            TaskState::SpawnedChildren => &self.visited,
            TaskState::Pruned => &self.pruned,
            TaskState::Skipped => &self.skipped,
            TaskState::Cancelled => &self.cancelled,
            TaskState::FetchFailed => &self.failed,
            TaskState::Pending | TaskState::Fetching => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Snapshot of a crawl's progress
///
/// Once the output stream has closed the snapshot is final and
/// `visited + pruned + skipped + cancelled + failed` covers every task except
/// any that were aborted before reaching a terminal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Tasks registered, including the root
    pub spawned: u64,
    /// URLs delivered to the output stream
    pub emitted: u64,
    /// Tasks that fetched their URL and spawned its children
    pub visited: u64,
    /// Tasks whose depth budget was exhausted
    pub pruned: u64,
    /// Tasks skipped because their URL was already visited
    pub skipped: u64,
    /// Tasks that observed cancellation
    pub cancelled: u64,
    /// Tasks whose fetch failed
    pub failed: u64,
    /// Tasks not yet terminal
    pub outstanding: usize,
    /// Whether the output stream has been closed
    pub complete: bool,
}

/// Tracks every outstanding crawl task and closes the output stream when the
/// last one finishes
#[derive(Debug)]
pub struct CompletionCoordinator {
    outstanding: AtomicUsize,
    output: Mutex<Option<mpsc::Sender<String>>>,
    closed: AtomicBool,
    finished: Notify,
    stats: CrawlStats,
}

impl CompletionCoordinator {
    /// Creates a coordinator owning `output`, with the root task already counted
    ///
    /// The returned guard belongs to the root task; the stream closes once it and
    /// every descendant guard have been dropped.
    pub fn start(output: mpsc::Sender<String>) -> (Arc<Self>, TaskGuard) {
        let coordinator = Arc::new(Self {
            outstanding: AtomicUsize::new(1),
            output: Mutex::new(Some(output)),
            closed: AtomicBool::new(false),
            finished: Notify::new(),
            stats: CrawlStats::default(),
        });
        coordinator.stats.spawned.fetch_add(1, Ordering::Relaxed);

        let root = TaskGuard {
            coordinator: Arc::clone(&coordinator),
            state: TaskState::Pending,
        };
        (coordinator, root)
    }

    /// Number of tasks that have not reached a terminal state
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    /// Returns true once the output stream has been closed
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Waits until the output stream has been closed
    pub async fn closed(&self) {
        let notified = self.finished.notified();
        if self.is_closed() {
            return;
        }
        notified.await;
    }

    /// Current progress counters
    pub fn summary(&self) -> CrawlSummary {
        let stats = &self.stats;
        CrawlSummary {
            spawned: stats.spawned.load(Ordering::Relaxed),
            emitted: stats.emitted.load(Ordering::Relaxed),
            visited: stats.visited.load(Ordering::Relaxed),
            pruned: stats.pruned.load(Ordering::Relaxed),
            skipped: stats.skipped.load(Ordering::Relaxed),
            cancelled: stats.cancelled.load(Ordering::Relaxed),
            failed: stats.failed.load(Ordering::Relaxed),
            outstanding: self.outstanding(),
            complete: self.is_closed(),
        }
    }

    /// Counts a new task; must be called by a task that is itself still counted
    fn register(self: &Arc<Self>) -> TaskGuard {
        self.outstanding.fetch_add(1, Ordering::Relaxed);
        self.stats.spawned.fetch_add(1, Ordering::Relaxed);
        TaskGuard {
            coordinator: Arc::clone(self),
            state: TaskState::Pending,
        }
    }

    /// Uncounts a task; the decrement that reaches zero closes the stream
    fn release(&self) {
        if self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.close();
        }
    }

    fn close(&self) {
        let sender = self
            .output
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        debug_assert!(sender.is_some(), "output stream closed twice");

        // Must be visible before the receiver can observe the end of the stream
        self.closed.store(true, Ordering::Release);
        drop(sender);
        self.finished.notify_waiters();

        tracing::info!("All crawl tasks finished, output stream closed");
    }

    async fn emit(&self, url: String) -> bool {
        let sender = self
            .output
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let Some(sender) = sender else {
            return false;
        };

        if sender.send(url).await.is_err() {
            return false;
        }
        self.stats.emitted.fetch_add(1, Ordering::Relaxed);
        true
    }
}

/// Proof that a task is counted as outstanding
///
/// Dropping the guard uncounts the task, whether it finished normally, panicked
/// or was aborted, so no path can keep the stream open forever.
#[derive(Debug)]
pub struct TaskGuard {
    coordinator: Arc<CompletionCoordinator>,
    state: TaskState,
}

impl TaskGuard {
    /// Registers a child task before it is spawned
    pub fn register_child(&self) -> TaskGuard {
        self.coordinator.register()
    }

    /// Sends `url` to the output stream, waiting for capacity
    ///
    /// Returns false if the consumer has dropped its receiver. The stream cannot
    /// close while this guard is alive, so the send never races the close.
    pub async fn emit(&self, url: String) -> bool {
        self.coordinator.emit(url).await
    }

    /// Current lifecycle state of the task
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Moves the task to a non-terminal state
    pub fn set_state(&mut self, state: TaskState) {
        self.state = state;
    }

    /// Records the task's terminal state and uncounts it
    pub fn finish(mut self, state: TaskState) {
        debug_assert!(state.is_terminal(), "{} is not a terminal state", state);
        self.state = state;
        self.coordinator.stats.record(state);
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        if !self.state.is_terminal() {
            tracing::debug!("Crawl task dropped while {}", self.state);
        }
        self.coordinator.release();
    }
}
