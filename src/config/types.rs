use crate::cache::LockStrategy;
use crate::crawler::Traversal;
use serde::Deserialize;
use std::time::Duration;

/// Default capacity of the output channel
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Default HTTP request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Main configuration structure for Ripple-Crawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: Option<UserAgentConfig>,
    #[serde(rename = "page", default)]
    pub pages: Vec<PageEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// URL the crawl starts from
    pub root: String,

    /// Depth budget of the root task; 0 crawls nothing
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Capacity of the bounded output channel
    #[serde(rename = "channel-capacity", default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Whether a URL reached along several paths is traversed once per path
    #[serde(default)]
    pub traversal: Traversal,

    /// Upper bound on fetches in flight at once; unbounded when unset
    #[serde(rename = "max-concurrent-fetches", default)]
    pub max_concurrent_fetches: Option<usize>,
}

/// Result cache configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
    /// How exclusive access to cache entries is obtained
    #[serde(default)]
    pub locking: LockStrategy,

    /// Upper bound on waiting for exclusive access (milliseconds)
    #[serde(rename = "lock-timeout-ms", default)]
    pub lock_timeout_ms: Option<u64>,
}

impl CacheConfig {
    /// Lock timeout as a `Duration`, if one is configured
    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_ms.map(Duration::from_millis)
    }
}

/// Which data source backs the crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetcherKind {
    /// Pages come from the `[[page]]` tables
    #[default]
    Static,
    /// Pages are fetched over HTTP(S)
    Http,
}

/// Fetcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    #[serde(default)]
    pub kind: FetcherKind,

    /// Total request timeout for HTTP fetches
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Refuse plain-HTTP URLs
    #[serde(rename = "https-only", default)]
    pub https_only: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            kind: FetcherKind::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            https_only: false,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// One page of the static dataset
#[derive(Debug, Clone, Deserialize)]
pub struct PageEntry {
    pub url: String,

    #[serde(default)]
    pub body: String,

    #[serde(default)]
    pub links: Vec<String>,
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
