//! Fetch capability for the crawler
//!
//! This module defines the contract every data source must satisfy:
//! - `Page`: the immutable result of a successful fetch (body + outbound links)
//! - `Fetcher`: the async capability turning a URL into a `Page`
//!
//! Two sources are provided: an in-memory `StaticFetcher` and a network-backed
//! `HttpFetcher`.

mod http;
mod memory;
mod parser;

pub use http::{build_http_client, HttpFetcher};
pub use memory::StaticFetcher;
pub use parser::{parse_html, ParsedPage};

use crate::config::{Config, FetcherKind};
use crate::{ConfigError, FetchResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Result of a successful fetch
///
/// Pages are shared read-only between the cache and every branch of the crawl,
/// so fetchers hand them out behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Page {
    /// Page body content
    pub body: String,

    /// Outbound links, in document order
    pub links: Vec<String>,
}

impl Page {
    /// Creates a new page from a body and its links
    pub fn new(body: impl Into<String>, links: Vec<String>) -> Self {
        Self {
            body: body.into(),
            links,
        }
    }
}

/// A facility that retrieves a page and the links found on it
///
/// Implementations make no ordering, concurrency or idempotence promises; the
/// caching decorator in `crate::cache` supplies those.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url`, returning its body and the URLs it links to
    async fn fetch(&self, url: &str) -> FetchResult<Arc<Page>>;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    async fn fetch(&self, url: &str) -> FetchResult<Arc<Page>> {
        (**self).fetch(url).await
    }
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Box<F> {
    async fn fetch(&self, url: &str) -> FetchResult<Arc<Page>> {
        (**self).fetch(url).await
    }
}

/// Builds the data source selected by the `[fetcher]` section
///
/// The static fetcher serves the `[[page]]` tables; the HTTP fetcher needs a
/// `[user-agent]` section.
pub fn build_fetcher(config: &Config) -> crate::Result<Box<dyn Fetcher>> {
    match config.fetcher.kind {
        FetcherKind::Static => Ok(Box::new(StaticFetcher::from_entries(&config.pages))),
        FetcherKind::Http => {
            let user_agent = config.user_agent.as_ref().ok_or_else(|| {
                ConfigError::Validation(
                    "[user-agent] is required when fetcher kind is 'http'".to_string(),
                )
            })?;
            Ok(Box::new(HttpFetcher::from_config(&config.fetcher, user_agent)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::CrawlError;

    #[tokio::test]
    async fn test_build_static_fetcher() {
        let config = parse_config(
            r#"
[crawler]
root = "a"
max-depth = 1

[[page]]
url = "a"
body = "Page A"
links = ["b"]
"#,
        )
        .unwrap();

        let fetcher = build_fetcher(&config).unwrap();
        let page = fetcher.fetch("a").await.unwrap();
        assert_eq!(page.links, vec!["b".to_string()]);
        assert!(fetcher.fetch("b").await.is_err());
    }

    #[test]
    fn test_build_http_fetcher_requires_user_agent() {
        let mut config = parse_config(
            r#"
[crawler]
root = "https://example.com/"
max-depth = 1
"#,
        )
        .unwrap();
        config.fetcher.kind = FetcherKind::Http;

        let result = build_fetcher(&config);
        assert!(matches!(
            result,
            Err(CrawlError::Config(ConfigError::Validation(_)))
        ));
    }
}
