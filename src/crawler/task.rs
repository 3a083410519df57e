//! A single crawl task: fetch one URL, emit it, fan out to its links

use crate::crawler::coordinator::TaskGuard;
use crate::crawler::Traversal;
use crate::fetch::{Fetcher, Page};
use crate::state::TaskState;
use crate::FetchResult;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

type TaskFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Visit-once bookkeeping for one URL
#[derive(Debug, Clone, Copy)]
struct Claim {
    /// Largest depth budget the URL has been traversed with
    budget: u32,
    /// Whether the URL has been delivered to the output stream
    emitted: bool,
}

/// State shared by every task of one crawl run
pub(crate) struct CrawlContext<F: ?Sized> {
    pub(crate) fetcher: Arc<F>,
    pub(crate) traversal: Traversal,
    pub(crate) cancel: CancellationToken,
    fetch_permits: Option<Semaphore>,
    claims: Mutex<HashMap<String, Claim>>,
}

impl<F: ?Sized> CrawlContext<F> {
    pub(crate) fn new(
        fetcher: Arc<F>,
        traversal: Traversal,
        cancel: CancellationToken,
        max_concurrent_fetches: Option<usize>,
    ) -> Self {
        Self {
            fetcher,
            traversal,
            cancel,
            fetch_permits: max_concurrent_fetches.map(Semaphore::new),
            claims: Mutex::new(HashMap::new()),
        }
    }

    /// Claims `url` with budget `depth`
    ///
    /// False if another task already claimed it with at least this budget. A
    /// larger budget replaces a smaller one so deeper links are still reached.
    fn claim(&self, url: &str, depth: u32) -> bool {
        let mut claims = self.claims.lock().unwrap_or_else(PoisonError::into_inner);
        match claims.get_mut(url) {
            Some(claim) if claim.budget >= depth => false,
            Some(claim) => {
                claim.budget = depth;
                true
            }
            None => {
                claims.insert(
                    url.to_string(),
                    Claim {
                        budget: depth,
                        emitted: false,
                    },
                );
                true
            }
        }
    }

    /// Gives back a claim made with `depth` so a later path can retry `url`
    fn unclaim(&self, url: &str, depth: u32) {
        let mut claims = self.claims.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(claim) = claims.get(url) {
            if claim.budget == depth && !claim.emitted {
                claims.remove(url);
            }
        }
    }

    /// Marks `url` as delivered; false if it already was
    fn mark_emitted(&self, url: &str) -> bool {
        let mut claims = self.claims.lock().unwrap_or_else(PoisonError::into_inner);
        match claims.get_mut(url) {
            Some(claim) => !std::mem::replace(&mut claim.emitted, true),
            None => true,
        }
    }
}

/// Spawns a registered task onto the runtime
pub(crate) fn spawn_task<F>(ctx: Arc<CrawlContext<F>>, url: String, depth: u32, guard: TaskGuard)
where
    F: Fetcher + ?Sized + 'static,
{
    tokio::spawn(run_task(ctx, url, depth, guard));
}

fn run_task<F>(ctx: Arc<CrawlContext<F>>, url: String, depth: u32, mut guard: TaskGuard) -> TaskFuture
where
    F: Fetcher + ?Sized + 'static,
{
    Box::pin(async move {
        let state = visit(&ctx, &url, depth, &mut guard).await;
        tracing::trace!("Task {} (depth {}) finished: {}", url, depth, state);
        guard.finish(state);
    })
}

/// Fetches `url`, first waiting for a fetch permit when concurrency is bounded
async fn fetch_with_permit<F>(ctx: &CrawlContext<F>, url: &str) -> FetchResult<Arc<Page>>
where
    F: Fetcher + ?Sized,
{
    let _permit = match &ctx.fetch_permits {
        Some(permits) => permits.acquire().await.ok(),
        None => None,
    };
    ctx.fetcher.fetch(url).await
}

/// Runs one task to a terminal state
///
/// Children are registered with the coordinator through `guard` before they are
/// spawned, and before this task's own guard is released by the caller.
async fn visit<F>(
    ctx: &Arc<CrawlContext<F>>,
    url: &str,
    depth: u32,
    guard: &mut TaskGuard,
) -> TaskState
where
    F: Fetcher + ?Sized + 'static,
{
    if depth == 0 {
        return TaskState::Pruned;
    }

    if ctx.cancel.is_cancelled() {
        return TaskState::Cancelled;
    }

    let visit_once = ctx.traversal == Traversal::VisitOnce;
    if visit_once && !ctx.claim(url, depth) {
        tracing::trace!("Already visited: {}", url);
        return TaskState::Skipped;
    }

    guard.set_state(TaskState::Fetching);
    let result = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => return TaskState::Cancelled,
        result = fetch_with_permit(ctx, url) => result,
    };

    let page = match result {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!("{}", e);
            if visit_once {
                ctx.unclaim(url, depth);
            }
            return TaskState::FetchFailed;
        }
    };

    tracing::debug!("Found: {} {:?}", url, page.body);

    if visit_once && !ctx.mark_emitted(url) {
        tracing::trace!("Revisiting {} with depth budget {}", url, depth);
    } else {
        let delivered = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return TaskState::Cancelled,
            delivered = guard.emit(url.to_string()) => delivered,
        };

        if !delivered {
            tracing::info!("Output stream receiver dropped, cancelling crawl");
            ctx.cancel.cancel();
            return TaskState::Cancelled;
        }
    }

    for link in &page.links {
        let child = guard.register_child();
        spawn_task(Arc::clone(ctx), link.clone(), depth - 1, child);
    }

    TaskState::SpawnedChildren
}
