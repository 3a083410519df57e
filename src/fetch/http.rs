//! HTTP fetcher implementation
//!
//! This module retrieves pages over the network, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests to fetch page content
//! - Error classification into `FetchError` variants
//! - Link extraction from HTML responses

use crate::config::{FetcherConfig, UserAgentConfig};
use crate::fetch::{parse_html, Fetcher, Page};
use crate::{FetchError, FetchResult};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;

/// Maximum number of redirects followed for a single fetch
const MAX_REDIRECTS: usize = 10;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `timeout` - Total request timeout
/// * `https_only` - Refuse plain-HTTP URLs
///
/// # Example
///
/// ```no_run
/// use ripple_crawl::config::UserAgentConfig;
/// use ripple_crawl::fetch::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "RippleCrawl".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30), false).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout: Duration,
    https_only: bool,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .https_only(https_only)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetcher that retrieves pages over HTTP(S) and extracts their links
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Wraps an already configured client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher from the `[fetcher]` and `[user-agent]` configuration
    pub fn from_config(
        fetcher: &FetcherConfig,
        user_agent: &UserAgentConfig,
    ) -> crate::Result<Self> {
        let client = build_http_client(
            user_agent,
            Duration::from_secs(fetcher.timeout_secs),
            fetcher.https_only,
        )?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    /// Fetches a URL with error classification
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | HTTP 404 / 410 | `NotFound` |
    /// | Other non-2xx | `Transport` |
    /// | Timeout, connection or body error | `Transport` |
    /// | Non-HTML 2xx | Page with body and no links |
    /// | HTML 2xx | Page with extracted links |
    async fn fetch(&self, url: &str) -> FetchResult<Arc<Page>> {
        tracing::debug!("HTTP fetch: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, &e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Err(FetchError::NotFound {
                url: url.to_string(),
            });
        }

        if !status.is_success() {
            return Err(FetchError::Transport {
                url: url.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = response
            .text()
            .await
            .map_err(|e| classify_error(url, &e))?;

        if !content_type.contains("text/html") {
            tracing::debug!("Not following links in {} ({})", url, content_type);
            return Ok(Arc::new(Page::new(body, Vec::new())));
        }

        let parsed = parse_html(&body, &final_url);
        tracing::debug!(
            "Found: {} {:?} ({} links)",
            url,
            parsed.title.as_deref().unwrap_or(""),
            parsed.links.len()
        );

        Ok(Arc::new(Page::new(body, parsed.links)))
    }
}

/// Maps a client error to a transport failure with a readable reason
fn classify_error(url: &str, error: &reqwest::Error) -> FetchError {
    let message = if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        "Connection refused".to_string()
    } else if error.is_redirect() {
        "Too many redirects".to_string()
    } else {
        error.to_string()
    };

    FetchError::Transport {
        url: url.to_string(),
        message,
    }
}
