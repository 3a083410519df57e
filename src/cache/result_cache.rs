//! Shared fetch-result cache
//!
//! Every URL owns a slot: a fetch lock plus a set-once page. A request takes the
//! URL's fetch lock (or the single global lock), and while holding it either finds the
//! stored page or performs the underlying fetch and stores the result. A URL is
//! therefore fetched successfully at most once for the lifetime of the cache. A failed
//! fetch stores nothing, so the next request for that URL retries it; its slot is
//! dropped once no other request is waiting on it. Slots holding a page are kept
//! until the cache itself is dropped.

use crate::fetch::{Fetcher, Page};
use crate::{FetchError, FetchResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

/// How exclusive access to a cache entry is obtained
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LockStrategy {
    /// One guard per URL; distinct URLs fetch in parallel
    #[default]
    PerKey,
    /// A single lock held across every underlying fetch
    Global,
}

/// Counters describing cache traffic
#[derive(Debug, Default)]
pub struct CacheStats {
    requests: AtomicU64,
    hits: AtomicU64,
    fetches: AtomicU64,
    failures: AtomicU64,
    contention_timeouts: AtomicU64,
}

/// Point-in-time copy of `CacheStats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    /// Calls to `get_or_fetch`
    pub requests: u64,
    /// Requests answered from a stored page
    pub hits: u64,
    /// Calls made into the underlying fetcher
    pub fetches: u64,
    /// Underlying fetches that failed
    pub failures: u64,
    /// Requests that gave up waiting for exclusive access
    pub contention_timeouts: u64,
}

impl CacheStats {
    /// Takes a snapshot of the counters
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            contention_timeouts: self.contention_timeouts.load(Ordering::Relaxed),
        }
    }
}

/// Per-URL cache entry
#[derive(Debug, Default)]
struct Slot {
    fetch_lock: tokio::sync::Mutex<()>,
    page: OnceLock<Arc<Page>>,
}

/// Result cache guaranteeing at most one successful underlying fetch per URL
#[derive(Debug, Default)]
pub struct ResultCache {
    strategy: LockStrategy,
    lock_timeout: Option<Duration>,
    slots: Mutex<HashMap<String, Arc<Slot>>>,
    global: tokio::sync::Mutex<()>,
    stats: CacheStats,
}

impl ResultCache {
    /// Creates an empty cache using per-key locking and no lock timeout
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the locking strategy
    pub fn with_strategy(mut self, strategy: LockStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Bounds how long a request waits for exclusive access before failing with
    /// `FetchError::CacheContention`
    pub fn with_lock_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// The locking strategy in use
    pub fn strategy(&self) -> LockStrategy {
        self.strategy
    }

    /// Returns the cached page for `url`, or fetches it through `fetcher`
    ///
    /// # Behavior
    ///
    /// 1. Acquire exclusive access for `url` (the global lock, or the URL's own lock)
    /// 2. Hit: return the stored page
    /// 3. Miss: fetch while still holding access; store on success
    ///
    /// Errors are returned to the caller and never stored. The lock timeout, when
    /// configured, bounds only the wait for access, not the fetch itself.
    pub async fn get_or_fetch<F>(&self, url: &str, fetcher: &F) -> FetchResult<Arc<Page>>
    where
        F: Fetcher + ?Sized,
    {
        self.stats.requests.fetch_add(1, Ordering::Relaxed);

        let _global = match self.strategy {
            LockStrategy::Global => Some(self.acquire(url, self.global.lock()).await?),
            LockStrategy::PerKey => None,
        };

        let slot = self.slot(url);
        if let Some(page) = slot.page.get() {
            return Ok(self.hit(url, page));
        }

        let access = self.acquire(url, slot.fetch_lock.lock()).await;
        let access = match access {
            Ok(access) => access,
            Err(e) => {
                self.forget_if_idle(url, &slot);
                return Err(e);
            }
        };
        if let Some(page) = slot.page.get() {
            return Ok(self.hit(url, page));
        }

        tracing::debug!("Cache miss: {}", url);
        self.stats.fetches.fetch_add(1, Ordering::Relaxed);

        match fetcher.fetch(url).await {
            Ok(page) => Ok(Arc::clone(slot.page.get_or_init(|| page))),
            Err(e) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                drop(access);
                self.forget_if_idle(url, &slot);
                Err(e)
            }
        }
    }

    /// Returns true if a page is stored for `url`
    pub fn contains(&self, url: &str) -> bool {
        self.lock_slots()
            .get(url)
            .is_some_and(|slot| slot.page.get().is_some())
    }

    /// Number of stored pages
    pub fn len(&self) -> usize {
        self.lock_slots()
            .values()
            .filter(|slot| slot.page.get().is_some())
            .count()
    }

    /// Returns true if no page is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cache traffic counters
    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    fn hit(&self, url: &str, page: &Arc<Page>) -> Arc<Page> {
        tracing::debug!("Cache hit: {}", url);
        self.stats.hits.fetch_add(1, Ordering::Relaxed);
        Arc::clone(page)
    }

    /// Finds or lazily creates the slot for `url`
    ///
    /// The top-level map lock is only held for the lookup, never across a fetch.
    fn slot(&self, url: &str) -> Arc<Slot> {
        Arc::clone(self.lock_slots().entry(url.to_string()).or_default())
    }

    /// Removes the empty slot for `url` unless another request still holds it
    ///
    /// Keeps URLs that only ever failed from accumulating in the map.
    fn forget_if_idle(&self, url: &str, slot: &Arc<Slot>) {
        let mut slots = self.lock_slots();
        let idle = slots.get(url).is_some_and(|held| {
            Arc::ptr_eq(held, slot) && Arc::strong_count(slot) == 2 && slot.page.get().is_none()
        });
        if idle {
            slots.remove(url);
        }
    }

    fn lock_slots(&self) -> MutexGuard<'_, HashMap<String, Arc<Slot>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Waits for a lock, giving up after the configured timeout
    async fn acquire<G>(&self, url: &str, lock: impl Future<Output = G>) -> FetchResult<G> {
        let Some(limit) = self.lock_timeout else {
            return Ok(lock.await);
        };

        tokio::time::timeout(limit, lock).await.map_err(|_| {
            tracing::warn!("Gave up waiting {:?} for cache access to {}", limit, url);
            self.stats
                .contention_timeouts
                .fetch_add(1, Ordering::Relaxed);
            FetchError::CacheContention {
                url: url.to_string(),
            }
        })
    }
}
