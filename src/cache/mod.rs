//! Fetch-result caching
//!
//! This module provides the shared cache that keeps the crawler from fetching the
//! same URL twice, including:
//! - `ResultCache`: the at-most-once-per-URL store with per-key or global locking
//! - `CachingFetcher`: a `Fetcher` decorator routing every fetch through a cache

mod caching_fetcher;
mod result_cache;

pub use caching_fetcher::CachingFetcher;
pub use result_cache::{CacheStats, CacheStatsSnapshot, LockStrategy, ResultCache};
