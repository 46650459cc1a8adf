//! HTTP renderer
//!
//! Fetches raw markup without executing scripts. Cheap enough for link
//! discovery, and the fallback for Markdown extraction when the browser fails.

use crate::render::{PageRenderer, RenderError, RenderedPage};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with the crawler's user agent
///
/// Per-request timeouts are applied by the caller, so the client only carries a
/// connect timeout.
///
/// # Example
///
/// ```no_run
/// use docbinder::render::build_http_client;
///
/// let client = build_http_client("docbinder/0.1").unwrap();
/// ```
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .pool_idle_timeout(Duration::from_secs(30))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`PageRenderer`] backed by a plain HTTP GET
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    pub fn new(user_agent: &str) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(user_agent)?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    /// Fetches `url` and returns the body
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | Request exceeds `timeout` | `Timeout` |
    /// | Connection or body failure | `Network` |
    /// | Non-2xx status | `Status` |
    /// | Content-Type present but not HTML | `NotHtml` |
    async fn render(&self, url: &Url, timeout: Duration) -> Result<String, RenderError> {
        self.render_page(url, timeout).await.map(|page| page.html)
    }

    /// Fetches `url`, following redirects, and reports the final address
    async fn render_page(&self, url: &Url, timeout: Duration) -> Result<RenderedPage, RenderError> {
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(url, timeout, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        if !content_type.is_empty() && !content_type.contains("html") {
            return Err(RenderError::NotHtml {
                url: url.to_string(),
                content_type,
            });
        }

        let final_url = response.url().clone();
        if final_url != *url {
            tracing::debug!("{} redirected to {}", url, final_url);
        }

        let html = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(url, timeout, e))?;

        Ok(RenderedPage { final_url, html })
    }
}

fn classify_reqwest_error(url: &Url, timeout: Duration, error: reqwest::Error) -> RenderError {
    if error.is_timeout() {
        RenderError::Timeout {
            url: url.to_string(),
            timeout,
        }
    } else if error.is_connect() {
        RenderError::Network {
            url: url.to_string(),
            message: "connection refused".to_string(),
        }
    } else {
        RenderError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
