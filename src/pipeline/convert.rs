//! Bounded per-page conversion
//!
//! Each discovered URL is converted in its own task. A semaphore caps how many
//! conversions hold a renderer session at once; a failed page never cancels
//! its siblings and simply leaves its slot empty.

use crate::assemble::PageArtifact;
use crate::config::PdfOptions;
use crate::extract::{ContentExtractor, MarkdownFormatter};
use crate::output::{commit_staged, discard_staged, staging_path, write_atomic};
use crate::render::{PageRenderer, PdfSink, RenderError};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// Why one page produced no artifact
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("conversion task did not complete: {0}")]
    Task(String),
}

/// Settled conversion of one URL
#[derive(Debug)]
pub struct Converted {
    pub ordinal: usize,
    pub url: Url,
    pub result: Result<PathBuf, ConversionError>,
}

impl Converted {
    pub fn artifact(&self) -> Option<PageArtifact> {
        self.result.as_ref().ok().map(|path| PageArtifact {
            ordinal: self.ordinal,
            url: self.url.clone(),
            path: path.clone(),
        })
    }
}

/// Runs `job` for every URL with at most `limit` in flight
///
/// Returns once every conversion has settled, ordered by ordinal.
pub async fn convert_all<F, Fut>(urls: &[Url], limit: usize, job: F) -> Vec<Converted>
where
    F: Fn(usize, Url) -> Fut,
    Fut: Future<Output = Result<PathBuf, ConversionError>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut tasks = JoinSet::new();

    for (ordinal, url) in urls.iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let work = job(ordinal, url.clone());
        let url = url.clone();
        tasks.spawn(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => work.await,
                Err(e) => Err(ConversionError::Task(e.to_string())),
            };
            Converted {
                ordinal,
                url,
                result,
            }
        });
    }

    let mut settled = Vec::with_capacity(urls.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(converted) => settled.push(converted),
            Err(e) => tracing::error!("Conversion task failed: {}", e),
        }
    }

    settled.sort_by_key(|converted| converted.ordinal);
    settled
}

/// Renders one page to PDF at `path`
pub async fn convert_pdf(
    sink: Arc<dyn PdfSink>,
    url: Url,
    options: PdfOptions,
    path: PathBuf,
    timeout: Duration,
) -> Result<PathBuf, ConversionError> {
    let staging = staging_path(&path);

    if let Err(e) = sink.render_to_pdf(&url, &options, &staging, timeout).await {
        discard_staged(&staging).await;
        return Err(e.into());
    }

    if let Err(source) = commit_staged(&staging, &path).await {
        discard_staged(&staging).await;
        return Err(ConversionError::Write { path, source });
    }

    Ok(path)
}

/// Renderers and formatting used by Markdown conversion
#[derive(Clone)]
pub struct MarkdownJob {
    pub renderer: Arc<dyn PageRenderer>,

    /// Tried once when the primary renderer fails
    pub fallback: Option<Arc<dyn PageRenderer>>,
    pub formatter: Arc<dyn MarkdownFormatter>,
    pub extractor: ContentExtractor,
    pub timeout: Duration,
    pub fallback_timeout: Duration,
}

impl MarkdownJob {
    /// Extracts one page and writes its Markdown document to `path`
    pub async fn convert(self, url: Url, path: PathBuf) -> Result<PathBuf, ConversionError> {
        let html = match self.renderer.render(&url, self.timeout).await {
            Ok(html) => html,
            Err(primary) => match &self.fallback {
                Some(fallback) => {
                    tracing::warn!("{}; retrying {} over plain HTTP", primary, url);
                    fallback.render(&url, self.fallback_timeout).await?
                }
                None => return Err(primary.into()),
            },
        };

        let document = self
            .extractor
            .to_document(&html, &url, self.formatter.as_ref());

        write_atomic(&path, document.render())
            .await
            .map_err(|source| ConversionError::Write {
                path: path.clone(),
                source,
            })?;

        Ok(path)
    }
}
