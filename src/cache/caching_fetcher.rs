use crate::cache::ResultCache;
use crate::fetch::{Fetcher, Page};
use crate::FetchResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Fetcher decorator that answers from a `ResultCache`
///
/// It has no state of its own: every call is `cache.get_or_fetch(url, inner)`.
#[derive(Debug)]
pub struct CachingFetcher<F> {
    inner: F,
    cache: Arc<ResultCache>,
}

impl<F: Fetcher> CachingFetcher<F> {
    /// Wraps `inner` with a fresh per-key cache
    pub fn new(inner: F) -> Self {
        Self::with_cache(inner, Arc::new(ResultCache::new()))
    }

    /// Wraps `inner` with an existing, possibly shared, cache
    pub fn with_cache(inner: F, cache: Arc<ResultCache>) -> Self {
        Self { inner, cache }
    }

    /// The cache this fetcher reads through
    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// The wrapped fetcher
    pub fn inner(&self) -> &F {
        &self.inner
    }
}

#[async_trait]
impl<F: Fetcher> Fetcher for CachingFetcher<F> {
    async fn fetch(&self, url: &str) -> FetchResult<Arc<Page>> {
        self.cache.get_or_fetch(url, &self.inner).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::StaticFetcher;
    use crate::FetchError;

    #[tokio::test]
    async fn test_delegates_through_cache() {
        let fetcher = CachingFetcher::new(StaticFetcher::new().with_page("a", "Page A", &["b"]));

        let first = fetcher.fetch("a").await.unwrap();
        let second = fetcher.fetch("a").await.unwrap();

        assert_eq!(first.links, vec!["b".to_string()]);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.cache().stats().fetches, 1);
        assert_eq!(fetcher.cache().stats().hits, 1);
    }

    #[tokio::test]
    async fn test_shared_cache_between_decorators() {
        let cache = Arc::new(ResultCache::new());
        let dataset = StaticFetcher::new().with_page("a", "Page A", &[]);
        let left = CachingFetcher::with_cache(dataset.clone(), Arc::clone(&cache));
        let right = CachingFetcher::with_cache(dataset, Arc::clone(&cache));

        left.fetch("a").await.unwrap();
        right.fetch("a").await.unwrap();

        assert_eq!(cache.stats().fetches, 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_errors_pass_through() {
        let fetcher = CachingFetcher::new(StaticFetcher::new());

        let err = fetcher.fetch("missing").await.unwrap_err();
        assert!(matches!(err, FetchError::NotFound { .. }));
        assert!(fetcher.cache().is_empty());
    }
}
