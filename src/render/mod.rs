//! Page rendering collaborators
//!
//! The crawler and the conversion pipeline never talk to the network directly.
//! They go through two seams:
//! - [`PageRenderer`]: URL in, rendered HTML out
//! - [`PdfSink`]: URL in, a PDF file written to disk
//!
//! [`HttpRenderer`] fetches markup with a plain HTTP client and is used for link
//! discovery. [`BrowserRenderer`] drives headless Chromium, waits for the
//! network to go quiet and implements both seams.

mod browser;
mod http;

pub use browser::BrowserRenderer;
pub use http::{build_http_client, HttpRenderer};

use crate::config::PdfOptions;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Why a page could not be rendered
///
/// Every variant is recovered at the URL boundary: the page yields no links
/// during discovery and no artifact during conversion.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("timed out after {timeout:?} loading {url}")]
    Timeout { url: String, timeout: Duration },

    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("expected HTML from {url}, got {content_type}")]
    NotHtml { url: String, content_type: String },

    #[error("browser error for {url}: {message}")]
    Script { url: String, message: String },

    #[error("failed to write PDF for {url}: {message}")]
    Write { url: String, message: String },
}

impl RenderError {
    /// The URL the failure belongs to
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url, .. }
            | Self::Network { url, .. }
            | Self::Status { url, .. }
            | Self::NotHtml { url, .. }
            | Self::Script { url, .. }
            | Self::Write { url, .. } => url,
        }
    }
}

/// Markup of a loaded page and the URL it was finally served from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// Address after redirects; relative links resolve against it
    pub final_url: Url,
    pub html: String,
}

/// Produces rendered HTML for a URL
#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Loads `url` and returns its markup, failing after `timeout`
    async fn render(&self, url: &Url, timeout: Duration) -> Result<String, RenderError>;

    /// Like [`PageRenderer::render`], also reporting where the page ended up
    ///
    /// Renderers that cannot observe redirects report `url` itself.
    async fn render_page(&self, url: &Url, timeout: Duration) -> Result<RenderedPage, RenderError> {
        let html = self.render(url, timeout).await?;
        Ok(RenderedPage {
            final_url: url.clone(),
            html,
        })
    }
}

/// Captures a URL as a PDF file
#[async_trait]
pub trait PdfSink: Send + Sync {
    /// Renders `url` with `options` and writes the PDF to `output`
    async fn render_to_pdf(
        &self,
        url: &Url,
        options: &PdfOptions,
        output: &Path,
        timeout: Duration,
    ) -> Result<(), RenderError>;
}
