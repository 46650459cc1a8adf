//! Content extraction
//!
//! Turns rendered HTML into the per-page Markdown document:
//! - [`ContentExtractor`] picks the main content region and strips page chrome
//! - [`MarkdownFormatter`] converts the region to Markdown
//! - [`PageDocument`] is the on-disk format with its metadata header

mod content;
mod markdown;

pub use content::{degraded_document, ContentExtractor, Extracted, UNTITLED};
pub use markdown::{clean_markdown, Html2MdFormatter, MarkdownFormatter, PageDocument};

use thiserror::Error;

/// Why a page's content could not be extracted
///
/// Never escapes a page: the extractor converts it into a degraded document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("document is empty")]
    EmptyDocument,

    #[error("no content left after removing navigation and page chrome")]
    NoContent,
}
