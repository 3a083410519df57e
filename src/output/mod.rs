//! Output module for consuming the visit stream and reporting on a run
//!
//! This module handles:
//! - Recording the URLs delivered on the output stream (`VisitLog`)
//! - Combining crawl and cache counters into a run report
//! - Rendering that report for the console

pub mod stats;

pub use stats::{print_report, CrawlReport};

use std::collections::HashMap;

/// Record of the URLs received from the output stream
///
/// Keeps first-seen order and how often each URL was delivered; under per-path
/// traversal a URL reached along several paths is delivered more than once.
#[derive(Debug, Clone, Default)]
pub struct VisitLog {
    order: Vec<String>,
    counts: HashMap<String, u64>,
}

impl VisitLog {
    /// Creates an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one delivery of `url`; returns true the first time it is seen
    pub fn record(&mut self, url: &str) -> bool {
        let count = self.counts.entry(url.to_string()).or_insert(0);
        *count += 1;
        if *count == 1 {
            self.order.push(url.to_string());
            true
        } else {
            false
        }
    }

    /// Distinct URLs in first-seen order
    pub fn unique(&self) -> &[String] {
        &self.order
    }

    /// Number of deliveries of `url`
    pub fn count(&self, url: &str) -> u64 {
        self.counts.get(url).copied().unwrap_or(0)
    }

    /// Total deliveries
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Deliveries beyond the first for each URL
    pub fn repeats(&self) -> u64 {
        self.total() - self.order.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visit_log_tracks_repeats() {
        let mut log = VisitLog::new();

        assert!(log.record("a"));
        assert!(log.record("b"));
        assert!(!log.record("a"));

        assert_eq!(log.unique(), ["a".to_string(), "b".to_string()]);
        assert_eq!(log.count("a"), 2);
        assert_eq!(log.count("zzz"), 0);
        assert_eq!(log.total(), 3);
        assert_eq!(log.repeats(), 1);
    }
}
