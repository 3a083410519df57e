//! Run statistics for a finished crawl
//!
//! This module provides the report printed at the end of a crawl, built from
//! the coordinator's task counters, the cache's traffic counters and the log of
//! delivered URLs.

use crate::cache::CacheStatsSnapshot;
use crate::crawler::CrawlSummary;
use crate::output::VisitLog;
use chrono::{DateTime, Utc};
use std::fmt;

/// Crawl run report
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Root URL of the run
    pub root: String,

    /// Depth budget of the root task
    pub max_depth: u32,

    /// When the crawl was started
    pub started_at: DateTime<Utc>,

    /// When the output stream closed
    pub finished_at: DateTime<Utc>,

    /// Task outcome counters
    pub crawl: CrawlSummary,

    /// Cache traffic counters, when the fetcher was cached
    pub cache: Option<CacheStatsSnapshot>,

    /// Distinct URLs delivered on the output stream
    pub unique_urls: u64,

    /// Deliveries of a URL already delivered before
    pub repeat_visits: u64,
}

impl CrawlReport {
    /// Builds a report from the pieces collected during a run
    pub fn new(
        root: impl Into<String>,
        max_depth: u32,
        started_at: DateTime<Utc>,
        crawl: CrawlSummary,
        cache: Option<CacheStatsSnapshot>,
        visits: &VisitLog,
    ) -> Self {
        Self {
            root: root.into(),
            max_depth,
            started_at,
            finished_at: Utc::now(),
            crawl,
            cache,
            unique_urls: visits.unique().len() as u64,
            repeat_visits: visits.repeats(),
        }
    }

    /// Wall-clock duration of the run in milliseconds
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    /// Share of cache requests answered without an underlying fetch
    pub fn cache_hit_rate(&self) -> Option<f64> {
        let cache = self.cache?;
        if cache.requests == 0 {
            return None;
        }
        Some(cache.hits as f64 / cache.requests as f64 * 100.0)
    }
}

impl fmt::Display for CrawlReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let crawl = &self.crawl;

        writeln!(f, "=== Crawl Statistics ===\n")?;
        writeln!(f, "Overview:")?;
        writeln!(f, "  Root: {} (max depth {})", self.root, self.max_depth)?;
        writeln!(f, "  Duration: {}ms", self.duration_ms())?;
        writeln!(f, "  URLs emitted: {}", crawl.emitted)?;
        writeln!(f, "  Unique URLs: {}", self.unique_urls)?;
        writeln!(f, "  Repeat visits: {}", self.repeat_visits)?;

        writeln!(f, "\nTasks ({} spawned):", crawl.spawned)?;
        writeln!(f, "  Visited: {}", crawl.visited)?;
        writeln!(f, "  Pruned: {}", crawl.pruned)?;
        writeln!(f, "  Skipped: {}", crawl.skipped)?;
        writeln!(f, "  Cancelled: {}", crawl.cancelled)?;
        writeln!(f, "  Fetch failed: {}", crawl.failed)?;

        let Some(cache) = self.cache else {
            return Ok(());
        };

        writeln!(f, "\nCache:")?;
        writeln!(f, "  Requests: {}", cache.requests)?;
        writeln!(f, "  Underlying fetches: {}", cache.fetches)?;
        writeln!(f, "  Failed fetches: {}", cache.failures)?;
        if cache.contention_timeouts > 0 {
            writeln!(f, "  Lock timeouts: {}", cache.contention_timeouts)?;
        }
        match self.cache_hit_rate() {
            Some(rate) => writeln!(f, "  Hits: {} ({:.1}%)", cache.hits, rate),
            None => writeln!(f, "  Hits: {}", cache.hits),
        }
    }
}

/// Prints a report to stdout
pub fn print_report(report: &CrawlReport) {
    print!("{}", report);
}
