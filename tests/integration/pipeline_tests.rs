//! End-to-end runs of the conversion pipeline

use async_trait::async_trait;
use docbinder::config::{Engine, PdfOptions};
use docbinder::output::{ArtifactKind, ObservedEvent, ObserverSet, RecordingObserver};
use docbinder::render::{HttpRenderer, PdfSink, RenderError};
use docbinder::{Config, DocbinderError, OutputFormat, Pipeline};
use lopdf::{Dictionary, Document, Object, Stream};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// PDF sink that writes a one-page PDF per URL, failing URLs containing `broken`
struct FakePdfSink {
    fail_all: bool,
}

#[async_trait]
impl PdfSink for FakePdfSink {
    async fn render_to_pdf(
        &self,
        url: &Url,
        _options: &PdfOptions,
        output: &Path,
        _timeout: Duration,
    ) -> Result<(), RenderError> {
        if self.fail_all || url.path().contains("broken") {
            return Err(RenderError::Script {
                url: url.to_string(),
                message: "page crashed".to_string(),
            });
        }
        write_pdf(output, url.path()).map_err(|message| RenderError::Write {
            url: url.to_string(),
            message,
        })
    }
}

fn write_pdf(path: &Path, text: &str) -> Result<(), String> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let content = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", text);
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

    let mut page = Dictionary::new();
    page.set("Type", Object::Name(b"Page".to_vec()));
    page.set("Parent", Object::Reference(pages_id));
    page.set("Contents", Object::Reference(content_id));
    let page_id = doc.add_object(page);

    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
    pages.set("Count", Object::Integer(1));
    pages.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(595),
            Object::Integer(842),
        ]),
    );
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc.save(path).map(|_| ()).map_err(|e| e.to_string())
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html"))
        .mount(server)
        .await;
}

/// A three-page site: home, intro and usage
async fn docs_site() -> MockServer {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body>
            <nav><a href="/docs/intro">Intro</a><a href="/docs/usage">Usage</a></nav>
            <main><h1>Home</h1><p>Welcome to the docs.</p></main>
        </body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/docs/intro",
        r#"<html><head><title>Introduction</title></head><body>
            <nav><a href="/">Home</a></nav>
            <main><h1>Introduction</h1><p>Start here.</p></main>
            <footer>Copyright</footer>
        </body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/docs/usage",
        r#"<html><head><title>Usage</title></head><body>
            <article><h1>Usage</h1><p>Run the tool.</p></article>
        </body></html>"#,
    )
    .await;
    server
}

fn test_config(format: OutputFormat, dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.output.format = format;
    config.output.engine = Engine::Http;
    config.output.output_dir = Some(dir.path().join("pages"));
    config.output.final_name = Some(dir.path().join("book.pdf").to_string_lossy().into_owned());
    config.crawler.discovery_timeout_ms = 5_000;
    config.crawler.page_timeout_ms = 5_000;
    config.crawler.max_concurrent_conversions = 2;
    config
}

fn seed(server: &MockServer) -> Url {
    Url::parse(&format!("{}/", server.uri())).unwrap()
}

fn http() -> Arc<HttpRenderer> {
    Arc::new(HttpRenderer::new("TestBot/1.0").unwrap())
}

#[tokio::test]
async fn test_markdown_run_writes_pages_and_book() {
    let server = docs_site().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(OutputFormat::Markdown, &dir);

    let outcome = Pipeline::new(config, seed(&server), http())
        .with_observers(ObserverSet::new())
        .run()
        .await
        .unwrap();

    assert!(outcome.success());
    assert_eq!(outcome.summary.pages_discovered, 3);

    let pages = dir.path().join("pages");
    for name in ["000_index.md", "001_docs_intro.md", "002_docs_usage.md"] {
        assert!(pages.join(name).exists(), "{} missing", name);
    }

    let intro = std::fs::read_to_string(pages.join("001_docs_intro.md")).unwrap();
    assert!(intro.starts_with("---\ntitle: Introduction\nsource: "));
    assert!(intro.contains("Start here."));
    assert!(!intro.contains("Copyright"));

    let book_path = dir.path().join("book.md");
    assert_eq!(outcome.combined_paths(), vec![book_path.as_path()]);

    let book = std::fs::read_to_string(&book_path).unwrap();
    assert!(book.starts_with(&format!("# Documentation from {}", seed(&server))));
    assert!(book.contains("## Table of Contents"));
    assert!(book.contains("1. [Home](#1-home)"));
    assert!(book.contains("2. [Introduction](#2-introduction)"));
    assert!(book.contains("3. [Usage](#3-usage)"));

    let intro_at = book.find("## 2. Introduction").unwrap();
    let usage_at = book.find("## 3. Usage").unwrap();
    assert!(intro_at < usage_at);
    assert!(!book.contains("title: Introduction"));
}

#[tokio::test]
async fn test_seed_query_and_fragment_are_dropped() {
    let server = docs_site().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(OutputFormat::Markdown, &dir);
    let raw_seed = Url::parse(&format!("{}/?ref=home#top", server.uri())).unwrap();

    let outcome = Pipeline::new(config, raw_seed, http())
        .with_observers(ObserverSet::new())
        .run()
        .await
        .unwrap();

    assert!(outcome.success());
    assert_eq!(outcome.summary.seed, seed(&server).to_string());
    assert_eq!(outcome.summary.pages_discovered, 3);

    let pages = dir.path().join("pages");
    assert!(pages.join("000_index.md").exists());
    assert!(!pages.join("003_index.md").exists());

    let book = std::fs::read_to_string(dir.path().join("book.md")).unwrap();
    assert!(book.starts_with(&format!("# Documentation from {}\n", seed(&server))));
}

#[tokio::test]
async fn test_failed_page_leaves_gap_but_branch_succeeds() {
    let server = docs_site().await;
    mount_page(
        &server,
        "/guide/",
        r#"<nav><a href="/docs/intro">Intro</a><a href="/docs/broken">Broken</a><a href="/docs/usage">Usage</a></nav>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/docs/broken"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(OutputFormat::Markdown, &dir);
    let seed = Url::parse(&format!("{}/guide/", server.uri())).unwrap();

    let recorder = Arc::new(RecordingObserver::new());
    let mut observers = ObserverSet::new();
    observers.register(recorder.clone());

    let outcome = Pipeline::new(config, seed, http())
        .with_observers(observers)
        .run()
        .await
        .unwrap();

    assert!(outcome.success());
    let branch = &outcome.summary.branches[0];
    assert_eq!(branch.written, 3);
    assert_eq!(branch.failed, 1);

    let pages = dir.path().join("pages");
    assert!(pages.join("000_guide.md").exists());
    assert!(pages.join("001_docs_intro.md").exists());
    assert!(!pages.join("002_docs_broken.md").exists());
    assert!(pages.join("003_docs_usage.md").exists());

    let events = recorder.events();
    assert!(events.contains(&ObservedEvent::ArtifactFailed {
        kind: ArtifactKind::Markdown,
        ordinal: 2,
        url: format!("{}/docs/broken", server.uri()),
    }));
    assert_eq!(
        events.last(),
        Some(&ObservedEvent::BranchFinished {
            kind: ArtifactKind::Markdown,
            success: true,
        })
    );
}

#[tokio::test]
async fn test_both_formats_use_separate_directories() {
    let server = docs_site().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(OutputFormat::Both, &dir);

    let outcome = Pipeline::new(config, seed(&server), http())
        .with_pdf_sink(Arc::new(FakePdfSink { fail_all: false }))
        .with_observers(ObserverSet::new())
        .run()
        .await
        .unwrap();

    assert!(outcome.success());
    assert_eq!(outcome.summary.branches.len(), 2);

    let pdfs = dir.path().join("pages").join("pdfs");
    let markdown = dir.path().join("pages").join("markdown");
    assert!(pdfs.join("000_index.pdf").exists());
    assert!(pdfs.join("002_docs_usage.pdf").exists());
    assert!(markdown.join("000_index.md").exists());
    assert!(!pdfs.join("000_index.md").exists());
    assert!(!markdown.join("000_index.pdf").exists());

    let book = Document::load(dir.path().join("book.pdf")).unwrap();
    assert_eq!(book.get_pages().len(), 3);
    assert!(dir.path().join("book.md").exists());
}

#[tokio::test]
async fn test_pdf_run_with_no_pages_converted_fails() {
    let server = docs_site().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(OutputFormat::Pdf, &dir);

    let outcome = Pipeline::new(config, seed(&server), http())
        .with_pdf_sink(Arc::new(FakePdfSink { fail_all: true }))
        .with_observers(ObserverSet::new())
        .run()
        .await
        .unwrap();

    assert!(!outcome.success());
    assert!(outcome.combined_paths().is_empty());
    assert!(!dir.path().join("book.pdf").exists());

    let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("pages"))
        .unwrap()
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_unreachable_seed_still_attempts_seed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(OutputFormat::Markdown, &dir);

    let outcome = Pipeline::new(config, seed(&server), http())
        .with_observers(ObserverSet::new())
        .run()
        .await
        .unwrap();

    assert_eq!(outcome.summary.pages_discovered, 1);
    assert_eq!(outcome.summary.fetch_failures, 1);
    assert!(!outcome.success());
    assert!(!dir.path().join("book.md").exists());
}

#[tokio::test]
async fn test_pdf_without_sink_is_rejected() {
    let server = docs_site().await;
    let dir = TempDir::new().unwrap();
    let config = test_config(OutputFormat::Pdf, &dir);

    let result = Pipeline::new(config, seed(&server), http())
        .with_observers(ObserverSet::new())
        .run()
        .await;

    assert!(matches!(result, Err(DocbinderError::Config(_))));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
