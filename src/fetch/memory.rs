//! In-memory fetcher backed by a canned dataset

use crate::config::PageEntry;
use crate::fetch::{Fetcher, Page};
use crate::{FetchError, FetchResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Fetcher that answers from a fixed URL → page map
///
/// Unknown URLs fail with `FetchError::NotFound`.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    pages: HashMap<String, Arc<Page>>,
}

impl StaticFetcher {
    /// Creates an empty fetcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a page
    pub fn with_page(
        mut self,
        url: impl Into<String>,
        body: impl Into<String>,
        links: &[&str],
    ) -> Self {
        self.insert(
            url,
            Page::new(body, links.iter().map(|l| l.to_string()).collect()),
        );
        self
    }

    /// Inserts a page, replacing any previous page for the same URL
    pub fn insert(&mut self, url: impl Into<String>, page: Page) {
        self.pages.insert(url.into(), Arc::new(page));
    }

    /// Builds a fetcher from the `[[page]]` entries of a configuration
    pub fn from_entries(entries: &[PageEntry]) -> Self {
        entries
            .iter()
            .map(|e| (e.url.clone(), Page::new(e.body.clone(), e.links.clone())))
            .collect()
    }

    /// Number of pages in the dataset
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Returns true if the dataset has no pages
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl FromIterator<(String, Page)> for StaticFetcher {
    fn from_iter<I: IntoIterator<Item = (String, Page)>>(iter: I) -> Self {
        let mut fetcher = Self::new();
        for (url, page) in iter {
            fetcher.insert(url, page);
        }
        fetcher
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<Arc<Page>> {
        tracing::debug!("Static fetch: {}", url);

        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                url: url.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_known_page() {
        let fetcher = StaticFetcher::new().with_page("a", "Page A", &["b", "c"]);

        let page = fetcher.fetch("a").await.unwrap();
        assert_eq!(page.body, "Page A");
        assert_eq!(page.links, vec!["b".to_string(), "c".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_unknown_page_is_not_found() {
        let fetcher = StaticFetcher::new();

        let err = fetcher.fetch("missing").await.unwrap_err();
        assert_eq!(
            err,
            FetchError::NotFound {
                url: "missing".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_repeated_fetch_shares_page() {
        let fetcher = StaticFetcher::new().with_page("a", "Page A", &[]);

        let first = fetcher.fetch("a").await.unwrap();
        let second = fetcher.fetch("a").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_from_entries() {
        let entries = vec![
            PageEntry {
                url: "a".to_string(),
                body: "A".to_string(),
                links: vec!["b".to_string()],
            },
            PageEntry {
                url: "b".to_string(),
                body: "B".to_string(),
                links: vec![],
            },
        ];

        let fetcher = StaticFetcher::from_entries(&entries);
        assert_eq!(fetcher.len(), 2);
        assert!(!fetcher.is_empty());
    }
}
