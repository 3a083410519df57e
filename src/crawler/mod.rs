//! Crawler module for recursive, depth-bounded link traversal
//!
//! This module contains the core crawling logic, including:
//! - One concurrent task per discovered link, bounded by a depth budget
//! - Completion tracking that closes the output stream exactly once
//! - Optional cancellation, visit-once traversal and fetch concurrency limits

mod coordinator;
mod task;

pub use coordinator::{CompletionCoordinator, CrawlSummary, TaskGuard};

use crate::fetch::Fetcher;
use serde::Deserialize;
use std::sync::Arc;
use task::{spawn_task, CrawlContext};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// How a URL reached along several paths is treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Traversal {
    /// Every path traverses the URL again (its fetch still comes from the cache),
    /// so the URL may be emitted once per path
    #[default]
    PerPath,
    /// Each URL is emitted once; a later arrival is skipped unless it carries a
    /// larger depth budget, in which case its links are traversed again
    VisitOnce,
}

/// Configurable crawl launcher
///
/// # Example
///
/// ```no_run
/// use ripple_crawl::{CachingFetcher, Crawler, StaticFetcher, Traversal};
/// use std::sync::Arc;
/// use tokio::sync::mpsc;
///
/// # async fn example() {
/// let dataset = StaticFetcher::new().with_page("a", "Page A", &["b"]);
/// let fetcher = Arc::new(CachingFetcher::new(dataset));
///
/// let (tx, mut rx) = mpsc::channel(16);
/// let handle = Crawler::new(fetcher)
///     .with_traversal(Traversal::VisitOnce)
///     .start("a", 3, tx);
///
/// while let Some(url) = rx.recv().await {
///     println!("Visited URL: {}", url);
/// }
/// assert!(handle.is_complete());
/// # }
/// ```
pub struct Crawler<F: ?Sized> {
    fetcher: Arc<F>,
    traversal: Traversal,
    cancel: CancellationToken,
    max_concurrent_fetches: Option<usize>,
}

impl<F> Crawler<F>
where
    F: Fetcher + ?Sized + 'static,
{
    /// Creates a crawler over `fetcher` with per-path traversal, no cancellation
    /// and unbounded fetch concurrency
    pub fn new(fetcher: Arc<F>) -> Self {
        Self {
            fetcher,
            traversal: Traversal::default(),
            cancel: CancellationToken::new(),
            max_concurrent_fetches: None,
        }
    }

    /// Selects the traversal policy
    pub fn with_traversal(mut self, traversal: Traversal) -> Self {
        self.traversal = traversal;
        self
    }

    /// Ties the crawl to an external cancellation token
    ///
    /// The crawl watches a child of `token`, so cancelling the crawl from the inside
    /// (for example when the consumer drops its receiver) leaves `token` untouched.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Caps the number of fetches in flight at once; `None` means unbounded
    pub fn with_max_concurrent_fetches(mut self, limit: Option<usize>) -> Self {
        self.max_concurrent_fetches = limit.map(|n| n.max(1));
        self
    }

    /// Starts crawling from `root` with a depth budget of `max_depth`
    ///
    /// Returns immediately; every visited URL is sent on `output`, and the channel
    /// closes once every task has finished. Must be called within a Tokio runtime.
    pub fn start(
        &self,
        root: impl Into<String>,
        max_depth: u32,
        output: mpsc::Sender<String>,
    ) -> CrawlHandle {
        let root = root.into();
        let cancel = self.cancel.child_token();

        let (coordinator, root_guard) = CompletionCoordinator::start(output);
        let ctx = Arc::new(CrawlContext::new(
            Arc::clone(&self.fetcher),
            self.traversal,
            cancel.clone(),
            self.max_concurrent_fetches,
        ));

        tracing::info!(
            "Starting crawl of {} (max depth {}, {:?})",
            root,
            max_depth,
            self.traversal
        );
        spawn_task(ctx, root, max_depth, root_guard);

        CrawlHandle {
            coordinator,
            cancel,
        }
    }
}

/// Starts a crawl with default options
///
/// Each URL fetched successfully within `max_depth` hops of `root` is sent on
/// `output`; the caller drains the receiver until it yields `None`.
///
/// # Example
///
/// ```no_run
/// use ripple_crawl::{crawl, CachingFetcher, StaticFetcher};
/// use std::sync::Arc;
/// use tokio::sync::mpsc;
///
/// # async fn example() {
/// let dataset = StaticFetcher::new()
///     .with_page("a", "Page A", &["b", "c"])
///     .with_page("b", "Page B", &["a"])
///     .with_page("c", "Page C", &[]);
///
/// let (tx, mut rx) = mpsc::channel(16);
/// crawl("a", 2, Arc::new(CachingFetcher::new(dataset)), tx);
///
/// while let Some(url) = rx.recv().await {
///     println!("Visited URL: {}", url);
/// }
/// # }
/// ```
pub fn crawl<F>(
    root: impl Into<String>,
    max_depth: u32,
    fetcher: Arc<F>,
    output: mpsc::Sender<String>,
) -> CrawlHandle
where
    F: Fetcher + ?Sized + 'static,
{
    Crawler::new(fetcher).start(root, max_depth, output)
}

/// Handle on a running crawl
#[derive(Debug, Clone)]
pub struct CrawlHandle {
    coordinator: Arc<CompletionCoordinator>,
    cancel: CancellationToken,
}

impl CrawlHandle {
    /// Cancels the crawl; pending tasks finish as cancelled and the stream closes
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns true if the crawl has been cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns true once the output stream has been closed
    pub fn is_complete(&self) -> bool {
        self.coordinator.is_closed()
    }

    /// Waits until the output stream has been closed
    pub async fn wait(&self) {
        self.coordinator.closed().await;
    }

    /// Progress counters; final once the crawl is complete
    pub fn summary(&self) -> CrawlSummary {
        self.coordinator.summary()
    }
}
