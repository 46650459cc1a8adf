//! Headless Chromium renderer
//!
//! One browser process is shared by all conversions; every render opens its
//! own tab and closes it afterwards, so the number of live tabs equals the
//! number of in-flight conversions.

use crate::config::{parse_length_inches, PdfOptions};
use crate::render::{PageRenderer, PdfSink, RenderError, RenderedPage};
use crate::DocbinderError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{EventLifecycleEvent, PrintToPdfParams};
use chromiumoxide::error::CdpError;
use chromiumoxide::listeners::EventStream;
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

const DEFAULT_MARGIN_INCHES: f64 = 20.0 / 25.4;

/// [`PageRenderer`] and [`PdfSink`] backed by headless Chromium
pub struct BrowserRenderer {
    browser: Browser,
    handler: JoinHandle<()>,
    settle: Duration,
}

impl BrowserRenderer {
    /// Launches a headless browser
    ///
    /// `settle` bounds how long a render waits for the network to go idle
    /// after the load event.
    pub async fn launch(user_agent: &str, settle: Duration) -> Result<Self, DocbinderError> {
        let config = BrowserConfig::builder()
            .arg(format!("--user-agent={}", user_agent))
            .build()
            .map_err(DocbinderError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| DocbinderError::Browser(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler stopped: {}", e);
                    break;
                }
            }
        });

        tracing::info!("Headless browser launched");

        Ok(Self {
            browser,
            handler,
            settle,
        })
    }

    /// Closes the browser and waits for the process to exit
    pub async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("Failed to close browser: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            tracing::debug!("Browser process wait failed: {}", e);
        }
        self.handler.abort();
    }

    /// Opens a tab, navigates to `url` and waits for it to settle
    async fn open(&self, url: &Url, timeout: Duration) -> Result<Page, RenderError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| script_error(url, e))?;

        let lifecycle = match page.event_listener::<EventLifecycleEvent>().await {
            Ok(stream) => Some(stream),
            Err(e) => {
                tracing::debug!("Lifecycle events unavailable for {}: {}", url, e);
                None
            }
        };

        let navigation = async {
            page.goto(url.as_str()).await?;
            page.wait_for_navigation().await?;
            Ok::<(), CdpError>(())
        };

        let outcome = tokio::time::timeout(timeout, navigation).await;
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                close_page(page, url).await;
                return Err(RenderError::Network {
                    url: url.to_string(),
                    message: e.to_string(),
                });
            }
            Err(_) => {
                close_page(page, url).await;
                return Err(RenderError::Timeout {
                    url: url.to_string(),
                    timeout,
                });
            }
        }

        if let Some(events) = lifecycle {
            self.wait_for_network_idle(url, events).await;
        }

        Ok(page)
    }

    async fn wait_for_network_idle(&self, url: &Url, mut events: EventStream<EventLifecycleEvent>) {
        let idle = async {
            while let Some(event) = events.next().await {
                if event.name == "networkIdle" {
                    break;
                }
            }
        };

        if tokio::time::timeout(self.settle, idle).await.is_err() {
            tracing::debug!(
                "Network did not go idle within {:?} for {}; continuing",
                self.settle,
                url
            );
        }
    }
}

#[async_trait]
impl PageRenderer for BrowserRenderer {
    async fn render(&self, url: &Url, timeout: Duration) -> Result<String, RenderError> {
        self.render_page(url, timeout).await.map(|page| page.html)
    }

    async fn render_page(&self, url: &Url, timeout: Duration) -> Result<RenderedPage, RenderError> {
        let page = self.open(url, timeout).await?;
        let final_url = match page.url().await {
            Ok(Some(current)) => Url::parse(&current).unwrap_or_else(|_| url.clone()),
            _ => url.clone(),
        };
        let content = page.content().await.map_err(|e| script_error(url, e));
        close_page(page, url).await;
        content.map(|html| RenderedPage { final_url, html })
    }
}

#[async_trait]
impl PdfSink for BrowserRenderer {
    async fn render_to_pdf(
        &self,
        url: &Url,
        options: &PdfOptions,
        output: &Path,
        timeout: Duration,
    ) -> Result<(), RenderError> {
        let page = self.open(url, timeout).await?;
        let written = page
            .save_pdf(print_params(options), output)
            .await
            .map(|_| ())
            .map_err(|e| RenderError::Write {
                url: url.to_string(),
                message: e.to_string(),
            });
        close_page(page, url).await;
        written
    }
}

/// Translates [`PdfOptions`] into DevTools print parameters (inches)
fn print_params(options: &PdfOptions) -> PrintToPdfParams {
    let (width, height) = options.page_format.dimensions_inches();
    let margin = |value: &str| parse_length_inches(value).unwrap_or(DEFAULT_MARGIN_INCHES);

    PrintToPdfParams {
        print_background: Some(options.print_background),
        paper_width: Some(width),
        paper_height: Some(height),
        margin_top: Some(margin(&options.margins.top)),
        margin_bottom: Some(margin(&options.margins.bottom)),
        margin_left: Some(margin(&options.margins.left)),
        margin_right: Some(margin(&options.margins.right)),
        ..Default::default()
    }
}

async fn close_page(page: Page, url: &Url) {
    if let Err(e) = page.close().await {
        tracing::debug!("Failed to close tab for {}: {}", url, e);
    }
}

fn script_error(url: &Url, error: CdpError) -> RenderError {
    RenderError::Script {
        url: url.to_string(),
        message: error.to_string(),
    }
}
