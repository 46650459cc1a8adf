//! Docbinder main entry point
//!
//! This is the command-line interface for the Docbinder documentation binder.

use anyhow::Context;
use clap::Parser;
use docbinder::config::{load_config_with_hash, validate, Config, Engine, OutputFormat, PageFormat};
use docbinder::output::print_summary;
use docbinder::pipeline::branch_contexts;
use docbinder::render::{BrowserRenderer, HttpRenderer};
use docbinder::{parse_seed_url, Pipeline};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use url::Url;

const EXIT_FAILURE: u8 = 1;
const EXIT_INTERRUPTED: u8 = 130;

/// Docbinder: bind a documentation website into one document
///
/// Docbinder discovers the pages of a documentation site from its navigation,
/// converts every page to PDF and/or Markdown, and merges them into a single
/// combined file.
#[derive(Parser, Debug)]
#[command(name = "docbinder")]
#[command(version)]
#[command(about = "Bind a documentation website into one PDF or Markdown file", long_about = None)]
struct Cli {
    /// Documentation URL to start from (http:// or https://)
    #[arg(value_name = "URL")]
    url: String,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Directory for per-page files
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Name of the combined PDF (the Markdown file uses the same name with .md)
    #[arg(long, value_name = "FILE", alias = "final-name")]
    final_pdf: Option<String>,

    /// Paper size for PDF pages
    #[arg(long, value_enum, ignore_case = true)]
    page_format: Option<PageFormat>,

    /// Do not print background graphics
    #[arg(long)]
    no_background: bool,

    /// Top margin, e.g. 20mm, 1in
    #[arg(long, value_name = "LENGTH")]
    margin_top: Option<String>,

    /// Bottom margin
    #[arg(long, value_name = "LENGTH")]
    margin_bottom: Option<String>,

    /// Left margin
    #[arg(long, value_name = "LENGTH")]
    margin_left: Option<String>,

    /// Right margin
    #[arg(long, value_name = "LENGTH")]
    margin_right: Option<String>,

    /// Page load timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Maximum link distance from the start page
    #[arg(long)]
    max_depth: Option<u32>,

    /// Maximum number of pages scanned during discovery
    #[arg(long)]
    max_pages: Option<usize>,

    /// Maximum number of pages converted at the same time
    #[arg(long)]
    concurrency: Option<usize>,

    /// Rendering engine (http supports Markdown only)
    #[arg(long, value_enum)]
    engine: Option<Engine>,

    /// Path to a TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Validate settings and show the plan without crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Usage errors exit with 1 like any other invalid input
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(EXIT_FAILURE)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{:#}", e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let seed = match parse_seed_url(&cli.url) {
        Ok(seed) => seed,
        Err(e) => {
            tracing::error!("Invalid URL '{}': {}", cli.url, e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    if cli.dry_run {
        handle_dry_run(&config, &seed);
        return ExitCode::SUCCESS;
    }

    let quiet = cli.quiet;
    tokio::select! {
        result = handle_convert(config, seed, quiet) => match result {
            Ok(true) => ExitCode::SUCCESS,
            Ok(false) => ExitCode::from(EXIT_FAILURE),
            Err(e) => {
                tracing::error!("Conversion failed: {:#}", e);
                ExitCode::from(EXIT_FAILURE)
            }
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted; partially written files were left as .partial");
            ExitCode::from(EXIT_INTERRUPTED)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("docbinder=info,warn"),
            1 => EnvFilter::new("docbinder=debug,info"),
            2 => EnvFilter::new("docbinder=trace,debug"),
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

/// Loads the configuration file, if any, and layers the flags on top
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(format) = cli.format {
        config.output.format = format;
    }
    if let Some(dir) = &cli.output_dir {
        config.output.output_dir = Some(dir.clone());
    }
    if let Some(name) = &cli.final_pdf {
        config.output.final_name = Some(name.clone());
    }
    if let Some(engine) = cli.engine {
        config.output.engine = engine;
    }

    if let Some(page_format) = cli.page_format {
        config.pdf.page_format = page_format;
    }
    if cli.no_background {
        config.pdf.print_background = false;
    }
    let margins = &mut config.pdf.margins;
    for (flag, margin) in [
        (&cli.margin_top, &mut margins.top),
        (&cli.margin_bottom, &mut margins.bottom),
        (&cli.margin_left, &mut margins.left),
        (&cli.margin_right, &mut margins.right),
    ] {
        if let Some(value) = flag {
            *margin = value.clone();
        }
    }

    if let Some(seconds) = cli.timeout {
        config.crawler.page_timeout_ms = seconds.saturating_mul(1000);
    }
    if let Some(depth) = cli.max_depth {
        config.crawler.max_depth = depth;
    }
    if let Some(pages) = cli.max_pages {
        config.crawler.max_pages = pages;
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawler.max_concurrent_conversions = concurrency;
    }

    validate(&config).context("invalid settings")?;
    Ok(config)
}

/// Handles the --dry-run mode: shows what a run would do
fn handle_dry_run(config: &Config, seed: &Url) {
    println!("=== Docbinder Dry Run ===\n");

    println!("Seed: {}", seed);
    println!("Format: {}", config.output.format);
    println!("Engine: {:?}", config.output.engine);

    println!("\nCrawler:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Discovery timeout: {}ms", config.crawler.discovery_timeout_ms);
    println!("  Page timeout: {}ms", config.crawler.page_timeout_ms);
    println!(
        "  Concurrent conversions: {}",
        config.crawler.max_concurrent_conversions
    );

    if config.output.format.wants_pdf() {
        let margins = &config.pdf.margins;
        println!("\nPDF:");
        println!("  Page format: {:?}", config.pdf.page_format);
        println!("  Print background: {}", config.pdf.print_background);
        println!(
            "  Margins: {} {} {} {} (top bottom left right)",
            margins.top, margins.bottom, margins.left, margins.right
        );
    }

    println!("\nOutput:");
    for branch in branch_contexts(&config.output, seed) {
        println!(
            "  {}: pages in {}, combined {}",
            branch.kind,
            branch.output_dir.display(),
            branch.combined_path.display()
        );
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main conversion, returning whether every branch succeeded
async fn handle_convert(config: Config, seed: Url, quiet: bool) -> anyhow::Result<bool> {
    let http = Arc::new(
        HttpRenderer::new(&config.crawler.user_agent).context("failed to build HTTP client")?,
    );

    let (pipeline, browser) = match config.output.engine {
        Engine::Http => (Pipeline::new(config, seed, http), None),
        Engine::Browser => {
            let browser = Arc::new(
                BrowserRenderer::launch(&config.crawler.user_agent, config.crawler.settle())
                    .await?,
            );
            let pipeline = Pipeline::new(config, seed, browser.clone())
                .with_discovery_renderer(http.clone())
                .with_fallback_renderer(http)
                .with_pdf_sink(browser.clone());
            (pipeline, Some(browser))
        }
    };

    let outcome = pipeline.run().await;
    drop(pipeline);

    if let Some(browser) = browser {
        match Arc::try_unwrap(browser) {
            Ok(browser) => browser.shutdown().await,
            Err(_) => tracing::debug!("Browser still in use; leaving shutdown to drop"),
        }
    }

    let outcome = outcome?;
    if !quiet {
        print_summary(&outcome.summary);
    }
    Ok(outcome.success())
}
