//! Breadth-first discovery of documentation pages
//!
//! This module handles:
//! - The FIFO frontier of pages waiting to be scanned
//! - Depth and page-count ceilings
//! - Deduplication on normalized URLs
//! - Recovering from pages that fail to render

use crate::config::CrawlerConfig;
use crate::crawler::classifier::{Classification, LinkClassifier};
use crate::crawler::regions::{extract_links, LinkRegion};
use crate::output::ObserverSet;
use crate::render::PageRenderer;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// A page waiting to be scanned, with its link distance from the seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: Url,
    pub depth: u32,
}

/// Ceilings for one discovery run
#[derive(Debug, Clone, Copy)]
pub struct DiscoveryLimits {
    pub max_depth: u32,

    /// Maximum number of pages rendered
    pub max_pages: usize,

    /// Timeout for each discovery render
    pub timeout: Duration,
}

impl From<&CrawlerConfig> for DiscoveryLimits {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            max_pages: config.max_pages,
            timeout: config.discovery_timeout(),
        }
    }
}

/// Outcome of a discovery run
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    /// Discovered pages, seed first, in discovery order, without duplicates
    pub urls: Vec<Url>,

    /// Pages actually rendered
    pub pages_processed: usize,

    /// Renders that failed
    pub fetch_failures: usize,
}

/// Drives discovery from the classifier's seed
///
/// Traversal is single-threaded: one page is rendered at a time, strictly in
/// frontier order, so depth ordering is deterministic.
pub struct Scheduler {
    renderer: Arc<dyn PageRenderer>,
    classifier: LinkClassifier,
    limits: DiscoveryLimits,
    observers: ObserverSet,
}

impl Scheduler {
    pub fn new(renderer: Arc<dyn PageRenderer>, classifier: LinkClassifier, limits: DiscoveryLimits) -> Self {
        Self {
            renderer,
            classifier,
            limits,
            observers: ObserverSet::new(),
        }
    }

    pub fn with_observers(mut self, observers: ObserverSet) -> Self {
        self.observers = observers;
        self
    }

    /// Runs discovery to completion
    ///
    /// # Algorithm
    ///
    /// 1. The frontier starts with the seed at depth 0
    /// 2. Pop the front entry; entries beyond `max_depth` are dropped
    /// 3. Entries at exactly `max_depth` cannot contribute links, so they are
    ///    not rendered
    /// 4. Render the page; a failure is reported and the loop continues.
    ///    Links resolve against the page's final URL after redirects
    /// 5. Classify each link from the page's link region; new accepted links
    ///    join the result and, room permitting, the back of the frontier
    /// 6. Stop when the frontier is empty or `max_pages` pages were rendered
    ///
    /// Navigation links on the seed page are always queued; other links are
    /// queued only while the frontier holds fewer than `max_pages` entries.
    pub async fn discover(&self) -> DiscoveryReport {
        let seed = self.classifier.seed().clone();
        let limits = self.limits;

        let mut frontier = VecDeque::from([FrontierEntry {
            url: seed.clone(),
            depth: 0,
        }]);
        let mut seen: HashSet<Url> = HashSet::from([seed.clone()]);
        let mut result: Vec<Url> = Vec::new();
        let mut report = DiscoveryReport::default();

        tracing::info!(
            "Starting link discovery from {} (max depth {}, max pages {})",
            seed,
            limits.max_depth,
            limits.max_pages
        );

        while report.pages_processed < limits.max_pages {
            let Some(entry) = frontier.pop_front() else {
                break;
            };

            if entry.depth >= limits.max_depth {
                continue;
            }

            report.pages_processed += 1;
            tracing::debug!("Scanning {} (depth {})", entry.url, entry.depth);

            let rendered = match self.renderer.render_page(&entry.url, limits.timeout).await {
                Ok(rendered) => rendered,
                Err(e) => {
                    report.fetch_failures += 1;
                    self.observers.notify_fetch_failed(&e).await;
                    continue;
                }
            };

            // Relative links resolve against where the page was served from
            let page = extract_links(&rendered.html, &rendered.final_url, entry.depth);
            let next_depth = entry.depth + 1;
            let from_navigation = page.region == LinkRegion::Navigation;

            for link in page.links {
                if seen.contains(&link) {
                    continue;
                }

                let classification = self.classifier.classify(&link, entry.depth, from_navigation);
                let Classification::Accept { priority } = classification else {
                    tracing::trace!("Rejected {}: {:?}", link, classification);
                    continue;
                };

                seen.insert(link.clone());
                result.push(link.clone());
                self.observers
                    .notify_page_discovered(&link, next_depth, priority)
                    .await;

                if priority || frontier.len() < limits.max_pages {
                    frontier.push_back(FrontierEntry {
                        url: link,
                        depth: next_depth,
                    });
                }
            }
        }

        // Seed first; `seen` kept it out of `result` so far
        result.insert(0, seed);
        report.urls = result;

        tracing::info!(
            "Found {} documentation pages ({} rendered, {} failed)",
            report.urls.len(),
            report.pages_processed,
            report.fetch_failures
        );

        report
    }
}

/// Discovers pages from `seed` with the default classifier vocabulary
///
/// # Example
///
/// ```no_run
/// use docbinder::crawler::discover;
/// use docbinder::render::HttpRenderer;
/// use std::sync::Arc;
/// use url::Url;
///
/// # async fn run() {
/// let renderer = Arc::new(HttpRenderer::new("docbinder").unwrap());
/// let seed = Url::parse("https://docs.example.com/").unwrap();
/// let urls = discover(renderer, &seed, 1, 200).await;
/// assert_eq!(urls[0], seed);
/// # }
/// ```
pub async fn discover(
    renderer: Arc<dyn PageRenderer>,
    seed: &Url,
    max_depth: u32,
    max_pages: usize,
) -> Vec<Url> {
    let config = CrawlerConfig::default();
    let classifier = LinkClassifier::new(seed.clone(), &Default::default());
    let limits = DiscoveryLimits {
        max_depth,
        max_pages,
        timeout: config.discovery_timeout(),
    };

    Scheduler::new(renderer, classifier, limits)
        .with_observers(ObserverSet::tracing())
        .discover()
        .await
        .urls
}
