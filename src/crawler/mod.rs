//! Crawler module for documentation discovery
//!
//! This module contains the discovery logic, including:
//! - Link classification (scope, asset filtering, documentation paths)
//! - Region detection with ordered selector chains
//! - Breadth-first scheduling with depth and page ceilings

mod classifier;
mod regions;
mod scheduler;

pub use classifier::{Classification, LinkClassifier, PathPolicy, RejectReason};
pub use regions::{
    body_or_root, extract_links, LinkRegion, PageLinks, SelectorChain, CHROME_SELECTORS,
    CONTENT_SELECTORS, NAVIGATION_SELECTORS,
};
pub use scheduler::{discover, DiscoveryLimits, DiscoveryReport, FrontierEntry, Scheduler};

use crate::config::Config;
use crate::output::ObserverSet;
use crate::render::PageRenderer;
use std::sync::Arc;
use url::Url;

/// Runs discovery for `seed` with the crawler and classifier settings of `config`
pub async fn discover_with_config(
    config: &Config,
    renderer: Arc<dyn PageRenderer>,
    seed: &Url,
    observers: ObserverSet,
) -> DiscoveryReport {
    let classifier = LinkClassifier::new(seed.clone(), &config.classifier);
    Scheduler::new(renderer, classifier, DiscoveryLimits::from(&config.crawler))
        .with_observers(observers)
        .discover()
        .await
}
