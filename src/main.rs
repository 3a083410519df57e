//! Ripple-Crawl main entry point
//!
//! This is the command-line interface for the Ripple-Crawl concurrent crawler.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use ripple_crawl::config::{load_config_with_hash, Config, FetcherKind};
use ripple_crawl::output::{print_report, CrawlReport, VisitLog};
use ripple_crawl::{build_fetcher, CachingFetcher, Crawler, ResultCache};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Ripple-Crawl: a bounded-depth concurrent crawler
///
/// Ripple-Crawl follows links from a root URL up to a depth budget, fetching
/// every page at most once through a shared result cache, and prints each
/// visited URL as it is found.
#[derive(Parser, Debug)]
#[command(name = "ripple-crawl")]
#[command(version = "1.0.0")]
#[command(about = "A bounded-depth concurrent crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Override the root URL from the configuration
    #[arg(long, value_name = "URL")]
    root: Option<String>,

    /// Override the depth budget from the configuration
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(root) = cli.root {
        config.crawler.root = root;
    }
    if let Some(max_depth) = cli.max_depth {
        config.crawler.max_depth = max_depth;
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripple_crawl=info,warn"),
            1 => EnvFilter::new("ripple_crawl=debug,info"),
            2 => EnvFilter::new("ripple_crawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Ripple-Crawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Root: {}", config.crawler.root);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Channel capacity: {}", config.crawler.channel_capacity);
    println!("  Traversal: {:?}", config.crawler.traversal);
    match config.crawler.max_concurrent_fetches {
        Some(limit) => println!("  Max concurrent fetches: {}", limit),
        None => println!("  Max concurrent fetches: unbounded"),
    }

    println!("\nCache:");
    println!("  Locking: {:?}", config.cache.locking);
    match config.cache.lock_timeout_ms {
        Some(ms) => println!("  Lock timeout: {}ms", ms),
        None => println!("  Lock timeout: none"),
    }

    println!("\nFetcher: {:?}", config.fetcher.kind);
    match config.fetcher.kind {
        FetcherKind::Static => {
            println!("  Pages ({}):", config.pages.len());
            for page in &config.pages {
                println!("  - {} ({} links)", page.url, page.links.len());
            }
        }
        FetcherKind::Http => {
            println!("  Timeout: {}s", config.fetcher.timeout_secs);
            println!("  HTTPS only: {}", config.fetcher.https_only);
            if let Some(user_agent) = &config.user_agent {
                println!("  User agent: {}", user_agent.header_value());
            }
        }
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would crawl {} to depth {}",
        config.crawler.root, config.crawler.max_depth
    );
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, quiet: bool) -> anyhow::Result<()> {
    let cache = Arc::new(
        ResultCache::new()
            .with_strategy(config.cache.locking)
            .with_lock_timeout(config.cache.lock_timeout()),
    );
    let source = build_fetcher(&config).context("failed to build fetcher")?;
    let fetcher = Arc::new(CachingFetcher::with_cache(source, Arc::clone(&cache)));

    let (tx, mut rx) = mpsc::channel(config.crawler.channel_capacity);
    let root = config.crawler.root.clone();
    let max_depth = config.crawler.max_depth;

    let started_at = Utc::now();
    let handle = Crawler::new(fetcher)
        .with_traversal(config.crawler.traversal)
        .with_max_concurrent_fetches(config.crawler.max_concurrent_fetches)
        .start(root.clone(), max_depth, tx);

    let mut visits = VisitLog::new();
    loop {
        tokio::select! {
            url = rx.recv() => match url {
                Some(url) => {
                    visits.record(&url);
                    println!("Visited URL: {}", url);
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c(), if !handle.is_cancelled() => {
                tracing::warn!("Interrupted, cancelling crawl");
                handle.cancel();
            }
        }
    }

    let summary = handle.summary();
    if handle.is_cancelled() {
        tracing::warn!("Crawl cancelled after {} URLs", summary.emitted);
    } else {
        tracing::info!("Crawl completed successfully");
    }

    if !quiet {
        println!();
        let report = CrawlReport::new(
            root,
            max_depth,
            started_at,
            summary,
            Some(cache.stats()),
            &visits,
        );
        print_report(&report);
    }

    Ok(())
}
