//! Discovery against mock documentation sites

use docbinder::config::ClassifierConfig;
use docbinder::crawler::{DiscoveryLimits, DiscoveryReport, LinkClassifier, Scheduler};
use docbinder::output::{ObservedEvent, ObserverSet, RecordingObserver};
use docbinder::render::HttpRenderer;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts an HTML page at `route`
async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html"))
        .mount(server)
        .await;
}

async fn run_discovery(
    server: &MockServer,
    max_depth: u32,
    max_pages: usize,
    observers: ObserverSet,
) -> DiscoveryReport {
    let seed = Url::parse(&format!("{}/", server.uri())).unwrap();
    let renderer = Arc::new(HttpRenderer::new("TestBot/1.0").unwrap());
    let classifier = LinkClassifier::new(seed, &ClassifierConfig::default());
    let limits = DiscoveryLimits {
        max_depth,
        max_pages,
        timeout: Duration::from_secs(5),
    };

    Scheduler::new(renderer, classifier, limits)
        .with_observers(observers)
        .discover()
        .await
}

fn paths(report: &DiscoveryReport) -> Vec<String> {
    report.urls.iter().map(|u| u.path().to_string()).collect()
}

#[tokio::test]
async fn test_navigation_links_from_seed() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body>
            <nav>
                <a href="/a">A</a>
                <a href="/b">B</a>
                <a href="https://other.com/x">External</a>
            </nav>
            <main><p>Welcome</p></main>
        </body></html>"#,
    )
    .await;

    let report = run_discovery(&server, 1, 200, ObserverSet::new()).await;

    assert_eq!(paths(&report), vec!["/", "/a", "/b"]);
    assert_eq!(report.urls[0].as_str(), format!("{}/", server.uri()));
    assert_eq!(report.pages_processed, 1);
}

#[tokio::test]
async fn test_unreachable_seed_yields_seed_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let recorder = Arc::new(RecordingObserver::new());
    let mut observers = ObserverSet::new();
    observers.register(recorder.clone());

    let report = run_discovery(&server, 2, 200, observers).await;

    assert_eq!(paths(&report), vec!["/"]);
    assert_eq!(report.fetch_failures, 1);
    assert_eq!(
        recorder.events(),
        vec![ObservedEvent::FetchFailed {
            url: format!("{}/", server.uri())
        }]
    );
}

#[tokio::test]
async fn test_two_level_crawl_follows_doc_paths_only() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<body><div class="sidebar">
            <a href="/docs/start">Start</a>
            <a href="/blog">Blog</a>
        </div></body>"#,
    )
    .await;
    mount_page(
        &server,
        "/docs/start",
        &format!(
            r#"<body><nav><a href="/nav-only">ignored</a></nav>
            <article>
                <a href="/docs/install?ref=start">Install</a>
                <a href="/docs/install#linux">Install (Linux)</a>
                <a href="/pricing">Pricing</a>
                <a href="/docs/logo.png">Logo</a>
                <a href="/docs/login">Login</a>
                <a href="{}/docs/elsewhere">Other port</a>
            </article></body>"#,
            other.uri()
        ),
    )
    .await;
    mount_page(
        &server,
        "/blog",
        r#"<body><main><a href="/docs/from-blog">x</a><a href="/news">n</a></main></body>"#,
    )
    .await;

    let report = run_discovery(&server, 2, 200, ObserverSet::new()).await;

    assert_eq!(
        paths(&report),
        vec!["/", "/docs/start", "/blog", "/docs/install", "/docs/from-blog"]
    );
    assert!(other.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_max_pages_limits_requests() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<nav>
            <a href="/docs/1">1</a><a href="/docs/2">2</a>
            <a href="/docs/3">3</a><a href="/docs/4">4</a>
        </nav>"#,
    )
    .await;
    for i in 1..=4 {
        mount_page(
            &server,
            &format!("/docs/{}", i),
            &format!(r#"<main><a href="/docs/{}/child">child</a></main>"#, i),
        )
        .await;
    }

    let report = run_discovery(&server, 3, 3, ObserverSet::new()).await;

    assert_eq!(report.pages_processed, 3);
    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 3);

    // Every navigation link survives even though only three pages were scanned
    for i in 1..=4 {
        let expected = format!("/docs/{}", i);
        assert!(paths(&report).contains(&expected), "{}", expected);
    }
}

#[tokio::test]
async fn test_failed_inner_page_keeps_discovered_urls() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<nav><a href="/docs/broken">Broken</a><a href="/docs/fine">Fine</a></nav>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/docs/broken"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/docs/fine",
        r#"<main><a href="/docs/fine/deeper">Deeper</a></main>"#,
    )
    .await;

    let report = run_discovery(&server, 2, 200, ObserverSet::new()).await;

    assert_eq!(
        paths(&report),
        vec!["/", "/docs/broken", "/docs/fine", "/docs/fine/deeper"]
    );
    assert_eq!(report.fetch_failures, 1);
}

#[tokio::test]
async fn test_discovery_result_is_unique() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<nav>
            <a href="/docs/a">A</a><a href="/docs/a/">A slash</a>
            <a href="/docs/a?v=1">A query</a><a href="./docs/a#top">A fragment</a>
            <a href="/">Home</a>
        </nav>"#,
    )
    .await;
    mount_page(&server, "/docs/a", r#"<main><a href="/docs/a">self</a><a href="/">home</a></main>"#).await;
    mount_page(&server, "/docs/a/", r#"<main><a href="/docs/a">a</a></main>"#).await;

    let report = run_discovery(&server, 3, 200, ObserverSet::new()).await;

    let mut unique = report.urls.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), report.urls.len());
    assert_eq!(paths(&report), vec!["/", "/docs/a", "/docs/a/"]);
}

#[tokio::test]
async fn test_relative_links_resolve_against_redirect_target() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/en/latest/", server.uri()).as_str()),
        )
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/en/latest/",
        r#"<nav><a href="intro">Intro</a><a href="api/">API</a></nav>"#,
    )
    .await;

    let report = run_discovery(&server, 1, 200, ObserverSet::new()).await;

    assert_eq!(
        paths(&report),
        vec!["/", "/en/latest/intro", "/en/latest/api/"]
    );
}
