//! Pipeline orchestration
//!
//! Sequences a run: output directories, discovery, per-page conversion for each
//! requested format, and assembly of the combined artifacts.
//!
//! # Example
//!
//! ```no_run
//! use docbinder::render::HttpRenderer;
//! use docbinder::{parse_seed_url, Config, OutputFormat, Pipeline};
//! use docbinder::config::Engine;
//! use std::sync::Arc;
//!
//! # async fn run() -> docbinder::Result<()> {
//! let mut config = Config::default();
//! config.output.format = OutputFormat::Markdown;
//! config.output.engine = Engine::Http;
//!
//! let seed = parse_seed_url("https://docs.example.com/")?;
//! let http = Arc::new(HttpRenderer::new(&config.crawler.user_agent).map_err(|e| {
//!     docbinder::DocbinderError::Browser(e.to_string())
//! })?);
//!
//! let outcome = Pipeline::new(config, seed, http).run().await?;
//! assert!(outcome.success());
//! # Ok(())
//! # }
//! ```

mod context;
mod convert;

pub use crate::output::{ObserverSet, PipelineObserver};
pub use context::{branch_contexts, BranchContext};
pub use convert::{convert_all, convert_pdf, ConversionError, Converted, MarkdownJob};

use crate::assemble::{combine_markdown, merge_pdfs, LopdfBinder, PageArtifact, PdfBinder};
use crate::config::Config;
use crate::crawler::{discover_with_config, DiscoveryReport};
use crate::extract::{ContentExtractor, Html2MdFormatter, MarkdownFormatter};
use crate::output::{ArtifactKind, BranchSummary, RunSummary};
use crate::render::{PageRenderer, PdfSink};
use crate::url::{artifact_file_name, normalize_parsed};
use crate::{ConfigError, DocbinderError};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub summary: RunSummary,
}

impl RunOutcome {
    /// True when every requested branch produced its combined artifact
    pub fn success(&self) -> bool {
        self.summary.success()
    }

    /// Combined artifacts that were written
    pub fn combined_paths(&self) -> Vec<&Path> {
        self.summary
            .branches
            .iter()
            .filter_map(|b| b.combined.as_deref())
            .collect()
    }
}

/// Discovery, conversion and assembly for one seed
pub struct Pipeline {
    config: Config,
    seed: Url,
    discovery: Arc<dyn PageRenderer>,
    renderer: Arc<dyn PageRenderer>,
    fallback: Option<Arc<dyn PageRenderer>>,
    pdf_sink: Option<Arc<dyn PdfSink>>,
    formatter: Arc<dyn MarkdownFormatter>,
    binder: Arc<dyn PdfBinder>,
    observers: ObserverSet,
}

impl Pipeline {
    /// Creates a pipeline that uses `renderer` for discovery and Markdown
    ///
    /// PDF output additionally needs [`Pipeline::with_pdf_sink`].
    pub fn new(config: Config, seed: Url, renderer: Arc<dyn PageRenderer>) -> Self {
        Self {
            config,
            seed: normalize_parsed(&seed),
            discovery: Arc::clone(&renderer),
            renderer,
            fallback: None,
            pdf_sink: None,
            formatter: Arc::new(Html2MdFormatter),
            binder: Arc::new(LopdfBinder),
            observers: ObserverSet::tracing(),
        }
    }

    /// Renderer used for link discovery only
    pub fn with_discovery_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.discovery = renderer;
        self
    }

    /// Renderer tried when the primary renderer fails a Markdown page
    pub fn with_fallback_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.fallback = Some(renderer);
        self
    }

    pub fn with_pdf_sink(mut self, sink: Arc<dyn PdfSink>) -> Self {
        self.pdf_sink = Some(sink);
        self
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn MarkdownFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_binder(mut self, binder: Arc<dyn PdfBinder>) -> Self {
        self.binder = binder;
        self
    }

    pub fn with_observers(mut self, observers: ObserverSet) -> Self {
        self.observers = observers;
        self
    }

    /// Runs the whole pipeline
    ///
    /// # Returns
    ///
    /// * `Ok(RunOutcome)` - Every branch settled; check [`RunOutcome::success`]
    /// * `Err(DocbinderError)` - Output directories could not be created, PDF
    ///   output was requested without a PDF sink, or discovery found nothing
    pub async fn run(&self) -> Result<RunOutcome, DocbinderError> {
        let started_at = Utc::now();
        let start = Instant::now();

        let branches = branch_contexts(&self.config.output, &self.seed);
        if self.pdf_sink.is_none() && branches.iter().any(|b| b.kind == ArtifactKind::Pdf) {
            return Err(ConfigError::Validation(
                "PDF output requires the browser engine".to_string(),
            )
            .into());
        }

        for branch in &branches {
            tokio::fs::create_dir_all(&branch.output_dir).await?;
            if let Some(parent) = branch.combined_path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }

        let report = discover_with_config(
            &self.config,
            Arc::clone(&self.discovery),
            &self.seed,
            self.observers.clone(),
        )
        .await;

        if report.urls.is_empty() {
            return Err(DocbinderError::NoPages {
                seed: self.seed.to_string(),
            });
        }

        let mut summaries = Vec::with_capacity(branches.len());
        for branch in &branches {
            tracing::info!(
                "Converting {} pages to {} in {}",
                report.urls.len(),
                branch.kind,
                branch.output_dir.display()
            );

            let summary = match branch.kind {
                ArtifactKind::Pdf => self.run_pdf_branch(branch, &report).await,
                ArtifactKind::Markdown => self.run_markdown_branch(branch, &report).await,
            };
            self.observers
                .notify_branch_finished(branch.kind, summary.success())
                .await;
            summaries.push(summary);
        }

        Ok(RunOutcome {
            summary: RunSummary {
                seed: self.seed.to_string(),
                started_at,
                elapsed: start.elapsed(),
                pages_discovered: report.urls.len(),
                pages_rendered: report.pages_processed,
                fetch_failures: report.fetch_failures,
                branches: summaries,
            },
        })
    }

    async fn run_pdf_branch(&self, branch: &BranchContext, report: &DiscoveryReport) -> BranchSummary {
        let Some(sink) = self.pdf_sink.clone() else {
            return self.failed_branch(branch, report.urls.len());
        };
        let options = self.config.pdf.clone();
        let timeout = self.config.crawler.page_timeout();
        let output_dir = branch.output_dir.clone();

        let settled = convert_all(
            &report.urls,
            self.config.crawler.max_concurrent_conversions,
            |ordinal, url| {
                let path = output_dir.join(artifact_file_name(ordinal, &url, "pdf"));
                convert_pdf(Arc::clone(&sink), url, options.clone(), path, timeout)
            },
        )
        .await;

        let artifacts = self.collect(branch.kind, &settled).await;
        let combined = match merge_pdfs(
            &artifacts,
            &branch.combined_path,
            Arc::clone(&self.binder),
            &self.observers,
        )
        .await
        {
            Ok(outcome) => Some(outcome.output),
            Err(e) => {
                tracing::error!("Failed to create {}: {}", branch.combined_path.display(), e);
                None
            }
        };

        self.branch_summary(branch, report.urls.len(), artifacts.len(), combined)
    }

    async fn run_markdown_branch(&self, branch: &BranchContext, report: &DiscoveryReport) -> BranchSummary {
        let job = MarkdownJob {
            renderer: Arc::clone(&self.renderer),
            fallback: self.fallback.clone(),
            formatter: Arc::clone(&self.formatter),
            extractor: ContentExtractor::new(),
            timeout: self.config.crawler.page_timeout(),
            fallback_timeout: self.config.crawler.discovery_timeout(),
        };
        let output_dir = branch.output_dir.clone();

        let settled = convert_all(
            &report.urls,
            self.config.crawler.max_concurrent_conversions,
            |ordinal, url| {
                let path = output_dir.join(artifact_file_name(ordinal, &url, "md"));
                job.clone().convert(url, path)
            },
        )
        .await;

        let artifacts = self.collect(branch.kind, &settled).await;
        let combined = match combine_markdown(
            &artifacts,
            self.seed.as_str(),
            &branch.combined_path,
            &self.observers,
        )
        .await
        {
            Ok(outcome) => Some(outcome.output),
            Err(e) => {
                tracing::error!("Failed to create {}: {}", branch.combined_path.display(), e);
                None
            }
        };

        self.branch_summary(branch, report.urls.len(), artifacts.len(), combined)
    }

    /// Reports every settled conversion and keeps the artifacts that exist
    async fn collect(&self, kind: ArtifactKind, settled: &[Converted]) -> Vec<PageArtifact> {
        let mut artifacts = Vec::with_capacity(settled.len());
        for converted in settled {
            match &converted.result {
                Ok(path) => {
                    self.observers
                        .notify_artifact_written(kind, converted.ordinal, path)
                        .await;
                }
                Err(e) => {
                    self.observers
                        .notify_artifact_failed(kind, converted.ordinal, &converted.url, &e.to_string())
                        .await;
                }
            }
            artifacts.extend(converted.artifact());
        }
        artifacts
    }

    fn branch_summary(
        &self,
        branch: &BranchContext,
        pages: usize,
        written: usize,
        combined: Option<PathBuf>,
    ) -> BranchSummary {
        BranchSummary {
            kind: branch.kind,
            output_dir: branch.output_dir.clone(),
            written,
            failed: pages.saturating_sub(written),
            combined,
        }
    }

    fn failed_branch(&self, branch: &BranchContext, pages: usize) -> BranchSummary {
        self.branch_summary(branch, pages, 0, None)
    }
}
