//! Artifact assembly
//!
//! Per-page artifacts are combined in ordinal order:
//! - PDFs are merged structurally (pages copied, not re-rendered), then
//!   compacted on a best-effort basis
//! - Markdown pages are concatenated under numbered headings after a
//!   generated table of contents

mod markdown;
mod pdf;

pub use markdown::{anchor_slug, combine_markdown, render_combined, CombineOutcome};
pub use pdf::{merge_pdfs, BindReport, LopdfBinder, MergeOutcome, PdfBinder};

use std::path::PathBuf;
use thiserror::Error;
use url::Url;

/// Why a branch could not produce its combined artifact
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("no valid PDF pages to merge")]
    NoValidPages,

    #[error("no Markdown page files to combine")]
    NoPageFiles,

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<lopdf::Error> for AssemblyError {
    fn from(e: lopdf::Error) -> Self {
        AssemblyError::Pdf(e.to_string())
    }
}

/// A per-page artifact on disk, tagged with its position in the crawl result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageArtifact {
    pub ordinal: usize,
    pub url: Url,
    pub path: PathBuf,
}

/// Artifacts sorted by ordinal
fn in_ordinal_order(artifacts: &[PageArtifact]) -> Vec<&PageArtifact> {
    let mut ordered: Vec<&PageArtifact> = artifacts.iter().collect();
    ordered.sort_by_key(|artifact| artifact.ordinal);
    ordered
}
