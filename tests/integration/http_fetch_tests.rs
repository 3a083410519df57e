//! HTTP fetcher tests against a wiremock server
//!
//! These tests exercise link extraction, status classification and a full
//! cached crawl over real HTTP requests.

use ripple_crawl::config::{FetcherConfig, UserAgentConfig};
use ripple_crawl::{
    CachingFetcher, Crawler, FetchError, Fetcher, HttpFetcher, ResultCache, Traversal,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    }
}

fn test_fetcher() -> HttpFetcher {
    HttpFetcher::from_config(&FetcherConfig::default(), &test_user_agent())
        .expect("Failed to build HTTP fetcher")
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

#[tokio::test]
async fn test_fetch_extracts_links() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header(
            "user-agent",
            "TestBot/1.0.0 (+https://example.com/contact; test@example.com)",
        ))
        .respond_with(html(
            r##"<html><head><title>Home</title></head><body>
            <a href="/page1">Page 1</a>
            <a href="page2#intro">Page 2</a>
            <a href="/page1">Page 1 again</a>
            <a href="mailto:someone@example.com">Mail</a>
            <a href="#top">Top</a>
            </body></html>"##,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let page = test_fetcher()
        .fetch(&format!("{}/", base_url))
        .await
        .expect("Fetch failed");

    assert!(page.body.contains("<title>Home</title>"));
    assert_eq!(
        page.links,
        vec![format!("{}/page1", base_url), format!("{}/page2", base_url)]
    );
}

#[tokio::test]
async fn test_fetch_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let url = format!("{}/missing", mock_server.uri());
    let err = test_fetcher().fetch(&url).await.unwrap_err();

    assert_eq!(err, FetchError::NotFound { url: url.clone() });
    assert_eq!(err.url(), url);
}

#[tokio::test]
async fn test_fetch_server_error_is_transport() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let url = format!("{}/broken", mock_server.uri());
    let err = test_fetcher().fetch(&url).await.unwrap_err();

    match err {
        FetchError::Transport { url: failed, message } => {
            assert_eq!(failed, url);
            assert_eq!(message, "HTTP 500");
        }
        other => panic!("Expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_non_html_has_no_links() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notes.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<a href="/page1">not a link</a>"#)
                .insert_header("content-type", "text/plain"),
        )
        .mount(&mock_server)
        .await;

    let page = test_fetcher()
        .fetch(&format!("{}/notes.txt", mock_server.uri()))
        .await
        .expect("Fetch failed");

    assert!(page.body.contains("not a link"));
    assert!(page.links.is_empty());
}

/// Mounts a three-page site: `/` links to `/a` and `/b`, `/a` links back to
/// `/` and to `/b`, `/b` has no links
///
/// Each page may be requested exactly once; the server verifies this on drop.
async fn mount_site(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/a">A</a> <a href="/b">B</a>"#))
        .expect(1)
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html(r#"<a href="/">Home</a> <a href="/b">B</a>"#))
        .expect(1)
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html("<p>Leaf</p>"))
        .expect(1)
        .mount(mock_server)
        .await;
}

async fn crawl_site(mock_server: &MockServer, traversal: Traversal) -> Vec<String> {
    let cache = Arc::new(ResultCache::new());
    let fetcher = Arc::new(CachingFetcher::with_cache(test_fetcher(), Arc::clone(&cache)));
    let (tx, mut rx) = mpsc::channel(4);

    let handle = Crawler::new(fetcher)
        .with_traversal(traversal)
        .start(format!("{}/", mock_server.uri()), 3, tx);

    let mut visited = Vec::new();
    while let Some(url) = rx.recv().await {
        visited.push(url);
    }

    assert!(handle.is_complete());
    assert_eq!(cache.stats().fetches, 3);
    assert_eq!(cache.len(), 3);

    visited.sort();
    visited
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cached_http_crawl_fetches_each_page_once() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;
    let base_url = mock_server.uri();

    let visited = crawl_site(&mock_server, Traversal::PerPath).await;

    // `/` and `/b` are each reachable along two paths within depth 3
    let mut expected = vec![
        format!("{}/", base_url),
        format!("{}/", base_url),
        format!("{}/a", base_url),
        format!("{}/b", base_url),
        format!("{}/b", base_url),
    ];
    expected.sort();
    assert_eq!(visited, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cached_http_crawl_visit_once() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;
    let base_url = mock_server.uri();

    let visited = crawl_site(&mock_server, Traversal::VisitOnce).await;

    let mut expected = vec![
        format!("{}/", base_url),
        format!("{}/a", base_url),
        format!("{}/b", base_url),
    ];
    expected.sort();
    assert_eq!(visited, expected);
}
