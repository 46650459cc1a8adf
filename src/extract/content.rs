use crate::crawler::{body_or_root, SelectorChain};
use crate::extract::{clean_markdown, ExtractionError, MarkdownFormatter, PageDocument};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Title used when a page declares none
pub const UNTITLED: &str = "Untitled";

/// Title and content markup of one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub title: String,

    /// Inner HTML of the content region, chrome removed
    pub body_html: String,
}

/// Locates a page's main content region
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    content: SelectorChain,
    chrome: SelectorChain,
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentExtractor {
    pub fn new() -> Self {
        Self {
            content: SelectorChain::content(),
            chrome: SelectorChain::chrome(),
        }
    }

    /// Extracts title and cleaned content markup
    ///
    /// The content region is the first match of the content selector chain,
    /// falling back to `<body>`. Navigation, sidebars, footers and scripts
    /// inside the region are removed before its markup is returned.
    pub fn try_extract(&self, html: &str) -> Result<Extracted, ExtractionError> {
        if html.trim().is_empty() {
            return Err(ExtractionError::EmptyDocument);
        }

        let mut document = Html::parse_document(html);
        let title = page_title(&document);

        let (region_id, chrome_ids) = {
            let region = self
                .content
                .first_match(&document)
                .map(|(_, element)| element)
                .unwrap_or_else(|| body_or_root(&document));
            let chrome: Vec<_> = self
                .chrome
                .all_matches(region)
                .into_iter()
                .map(|element| element.id())
                .collect();
            (region.id(), chrome)
        };

        for id in chrome_ids {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
            }
        }

        let body_html = document
            .tree
            .get(region_id)
            .and_then(ElementRef::wrap)
            .map(|region| region.inner_html())
            .unwrap_or_default();

        if body_html.trim().is_empty() {
            return Err(ExtractionError::NoContent);
        }

        Ok(Extracted { title, body_html })
    }

    /// Builds the page's Markdown document, degrading instead of failing
    ///
    /// A page whose content cannot be extracted yields a document titled
    /// [`UNTITLED`] with a one-line note as its body.
    pub fn to_document(&self, html: &str, url: &Url, formatter: &dyn MarkdownFormatter) -> PageDocument {
        match self.try_extract(html) {
            Ok(extracted) => PageDocument {
                title: extracted.title,
                source: url.to_string(),
                body: clean_markdown(&formatter.to_markdown(&extracted.body_html)),
            },
            Err(e) => {
                tracing::warn!("Failed to extract content from {}: {}", url, e);
                degraded_document(url)
            }
        }
    }
}

/// Placeholder document for a page without usable content
pub fn degraded_document(url: &Url) -> PageDocument {
    PageDocument {
        title: UNTITLED.to_string(),
        source: url.to_string(),
        body: format!("Failed to extract content from {}", url),
    }
}

/// `<title>`, else the first `<h1>`, else [`UNTITLED`]
fn page_title(document: &Html) -> String {
    ["title", "h1"]
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| {
            document
                .select(&selector)
                .map(|element| collapse_whitespace(&element.text().collect::<String>()))
                .find(|text| !text.is_empty())
        })
        .unwrap_or_else(|| UNTITLED.to_string())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
