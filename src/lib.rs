//! Ripple-Crawl: a bounded-depth concurrent link crawler
//!
//! This crate walks a link graph from a root URL up to a fixed depth, fanning out one
//! task per discovered link, deduplicating fetches through a shared result cache, and
//! streaming every visited URL to a consumer over a channel that closes exactly once
//! when the whole task tree has drained.

pub mod cache;
pub mod config;
pub mod crawler;
pub mod fetch;
pub mod output;
pub mod state;

use thiserror::Error;

/// Main error type for Ripple-Crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Errors returned by a fetch capability
///
/// A fetch error only ends the subtree rooted at the failing URL. It is never cached,
/// so a later request for the same URL retries the underlying fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Not found: {url}")]
    NotFound { url: String },

    #[error("Transport failure for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Timed out waiting for cache access to {url}")]
    CacheContention { url: String },
}

impl FetchError {
    /// The URL the failed fetch was for
    pub fn url(&self) -> &str {
        match self {
            Self::NotFound { url } | Self::Transport { url, .. } | Self::CacheContention { url } => {
                url
            }
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Ripple-Crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use cache::{CachingFetcher, LockStrategy, ResultCache};
pub use config::Config;
pub use crawler::{crawl, CrawlHandle, Crawler, Traversal};
pub use fetch::{build_fetcher, Fetcher, HttpFetcher, Page, StaticFetcher};
pub use state::TaskState;
