//! Page regions and link extraction
//!
//! A documentation page is scanned through ordered selector chains: the first
//! selector that matches wins, and the whole `<body>` is the last resort.

use crate::url::normalize_parsed;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Selectors for navigation menus and sidebars, most specific first
pub const NAVIGATION_SELECTORS: &[&str] = &[
    "nav",
    "[role=\"navigation\"]",
    ".sidebar",
    ".nav-sidebar",
    ".docs-sidebar",
    ".toc",
    ".table-of-contents",
    "aside",
    ".menu",
    ".navigation",
    ".gitbook-sidebar",
    ".book-summary",
];

/// Selectors for the main content region: semantic regions before generic classes
pub const CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    "[role=\"main\"]",
    ".content",
    ".main-content",
    ".documentation-content",
    ".markdown-body",
    ".doc-content",
    "#content",
    ".page-content",
    ".post-content",
];

/// Repeated page chrome removed from extracted content
pub const CHROME_SELECTORS: &[&str] = &[
    "nav",
    ".sidebar",
    ".navigation",
    "footer",
    ".footer",
    "aside",
    "script",
    "style",
];

/// Ordered list of selectors tried in sequence
#[derive(Debug, Clone)]
pub struct SelectorChain {
    selectors: Vec<(String, Selector)>,
}

impl SelectorChain {
    /// Parses every selector, skipping any that are not valid CSS
    pub fn new(selectors: &[&str]) -> Self {
        let selectors = selectors
            .iter()
            .filter_map(|s| match Selector::parse(s) {
                Ok(selector) => Some((s.to_string(), selector)),
                Err(e) => {
                    tracing::warn!("Ignoring invalid selector '{}': {:?}", s, e);
                    None
                }
            })
            .collect();
        Self { selectors }
    }

    pub fn navigation() -> Self {
        Self::new(NAVIGATION_SELECTORS)
    }

    pub fn content() -> Self {
        Self::new(CONTENT_SELECTORS)
    }

    pub fn chrome() -> Self {
        Self::new(CHROME_SELECTORS)
    }

    /// Returns the first element matched by the earliest selector in the chain
    pub fn first_match<'a>(&self, document: &'a Html) -> Option<(&str, ElementRef<'a>)> {
        self.selectors.iter().find_map(|(source, selector)| {
            document
                .select(selector)
                .next()
                .map(|element| (source.as_str(), element))
        })
    }

    /// Every element matched by any selector in the chain
    pub fn all_matches<'a>(&self, root: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        self.selectors
            .iter()
            .flat_map(|(_, selector)| root.select(selector))
            .collect()
    }
}

/// Which part of a page supplied its links
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRegion {
    Navigation,
    Content,
    Body,
}

/// Links scanned from one page
#[derive(Debug, Clone)]
pub struct PageLinks {
    pub region: LinkRegion,

    /// Absolute, normalized links in document order
    pub links: Vec<Url>,
}

/// Returns the `<body>` element, or the root when the markup has none
pub fn body_or_root(document: &Html) -> ElementRef<'_> {
    Selector::parse("body")
        .ok()
        .and_then(|body| document.select(&body).next())
        .unwrap_or_else(|| document.root_element())
}

/// Extracts links from the region appropriate for `depth`
///
/// The seed page (depth 0) is read through its navigation region, deeper pages
/// through their main content. Either falls back to the whole body.
///
/// # Link Extraction Rules
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - Fragment-only links
/// - Anything that does not resolve to HTTP(S)
pub fn extract_links(html: &str, page_url: &Url, depth: u32) -> PageLinks {
    let document = Html::parse_document(html);

    let (chain, region) = if depth == 0 {
        (SelectorChain::navigation(), LinkRegion::Navigation)
    } else {
        (SelectorChain::content(), LinkRegion::Content)
    };

    let (region, root) = match chain.first_match(&document) {
        Some((selector, element)) => {
            tracing::debug!("Link region for {} matched '{}'", page_url, selector);
            (region, element)
        }
        None => {
            tracing::debug!("No link region matched for {}; scanning body", page_url);
            (LinkRegion::Body, body_or_root(&document))
        }
    };

    PageLinks {
        region,
        links: links_in(root, page_url),
    }
}

fn links_in(root: ElementRef<'_>, page_url: &Url) -> Vec<Url> {
    let Ok(anchor) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    root.select(&anchor)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, page_url))
        .collect()
}

/// Resolves an href against the page URL and normalizes it
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(normalize_parsed(&absolute)),
        _ => None,
    }
}
