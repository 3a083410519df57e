//! End-to-end crawls over the demo dataset shipped in `crawl.toml`

use ripple_crawl::config::parse_config;
use ripple_crawl::crawler::CrawlSummary;
use ripple_crawl::output::VisitLog;
use ripple_crawl::{
    CachingFetcher, Config, Crawler, LockStrategy, ResultCache, StaticFetcher, Traversal,
};
use std::sync::Arc;
use tokio::sync::mpsc;

const DEMO_CONFIG: &str = include_str!("../../crawl.toml");

const ROOT: &str = "http://golang.org/";
const PKG: &str = "http://golang.org/pkg/";
const FMT: &str = "http://golang.org/pkg/fmt/";
const OS: &str = "http://golang.org/pkg/os/";
const CMD: &str = "http://golang.org/cmd/";

fn demo_config() -> Config {
    parse_config(DEMO_CONFIG).expect("demo config should be valid")
}

/// Runs a crawl from the config's root and returns what the stream delivered
async fn run(config: &Config, cache: Arc<ResultCache>) -> (VisitLog, CrawlSummary) {
    let fetcher = Arc::new(CachingFetcher::with_cache(
        StaticFetcher::from_entries(&config.pages),
        cache,
    ));
    let (tx, mut rx) = mpsc::channel(config.crawler.channel_capacity);

    let handle = Crawler::new(fetcher)
        .with_traversal(config.crawler.traversal)
        .with_max_concurrent_fetches(config.crawler.max_concurrent_fetches)
        .start(config.crawler.root.clone(), config.crawler.max_depth, tx);

    let mut visits = VisitLog::new();
    while let Some(url) = rx.recv().await {
        visits.record(&url);
    }

    assert!(handle.is_complete());
    (visits, handle.summary())
}

#[test]
fn test_demo_config_parses() {
    let config = demo_config();

    assert_eq!(config.crawler.root, ROOT);
    assert_eq!(config.crawler.max_depth, 4);
    assert_eq!(config.pages.len(), 4);
    assert!(config.pages.iter().all(|p| p.url != CMD));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_demo_crawl_per_path() {
    let config = demo_config();
    let cache = Arc::new(ResultCache::new().with_strategy(config.cache.locking));

    let (visits, summary) = run(&config, Arc::clone(&cache)).await;

    // Every path of length < 4 from the root to a known page
    assert_eq!(visits.count(ROOT), 4);
    assert_eq!(visits.count(PKG), 4);
    assert_eq!(visits.count(FMT), 1);
    assert_eq!(visits.count(OS), 1);
    assert_eq!(visits.count(CMD), 0);
    assert_eq!(visits.unique().first().map(String::as_str), Some(ROOT));

    assert_eq!(summary.emitted, 10);
    assert_eq!(summary.visited, 10);
    assert_eq!(summary.failed, 3);
    assert_eq!(summary.pruned, 16);
    assert_eq!(summary.spawned, 29);
    assert_eq!(summary.outstanding, 0);

    // Known pages fetched once; the missing page is retried by every path
    let stats = cache.stats();
    assert_eq!(stats.fetches, 7);
    assert_eq!(stats.failures, 3);
    assert_eq!(cache.len(), 4);
    assert!(!cache.contains(CMD));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_demo_crawl_visit_once() {
    let mut config = demo_config();
    config.crawler.traversal = Traversal::VisitOnce;

    let (visits, summary) = run(&config, Arc::new(ResultCache::new())).await;

    assert_eq!(visits.total(), 4);
    assert_eq!(visits.repeats(), 0);
    for url in [ROOT, PKG, FMT, OS] {
        assert_eq!(visits.count(url), 1, "{} should be visited once", url);
    }
    assert_eq!(summary.emitted, 4);
    assert!(summary.failed >= 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_demo_crawl_global_lock_same_result() {
    let mut config = demo_config();
    config.cache.locking = LockStrategy::Global;
    config.crawler.max_concurrent_fetches = Some(2);
    let cache = Arc::new(ResultCache::new().with_strategy(config.cache.locking));

    let (visits, summary) = run(&config, Arc::clone(&cache)).await;

    assert_eq!(visits.total(), 10);
    assert_eq!(visits.unique().len(), 4);
    assert_eq!(summary.failed, 3);
    assert_eq!(cache.stats().fetches, 7);
}

#[tokio::test]
async fn test_demo_crawl_depth_one() {
    let mut config = demo_config();
    config.crawler.max_depth = 1;
    let cache = Arc::new(ResultCache::new());

    let (visits, summary) = run(&config, Arc::clone(&cache)).await;

    assert_eq!(visits.unique(), [ROOT.to_string()]);
    assert_eq!(summary.pruned, 2);
    assert_eq!(cache.stats().fetches, 1);
}

#[tokio::test]
async fn test_unknown_root_closes_stream() {
    let mut config = demo_config();
    config.crawler.root = CMD.to_string();

    let (visits, summary) = run(&config, Arc::new(ResultCache::new())).await;

    assert_eq!(visits.total(), 0);
    assert_eq!(summary.failed, 1);
    assert!(summary.complete);
}
