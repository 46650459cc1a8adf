use crate::assemble::{in_ordinal_order, AssemblyError, PageArtifact};
use crate::extract::PageDocument;
use crate::output::{write_atomic, ObserverSet};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Outcome of a successful combine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombineOutcome {
    pub output: PathBuf,

    /// Pages included in the combined document
    pub pages: usize,

    /// Page files that were missing on disk
    pub skipped: Vec<PathBuf>,
}

/// Anchor fragment for a numbered section heading
///
/// Follows the GitHub heading-id scheme: lowercase, spaces become `-`, other
/// punctuation is dropped.
///
/// # Examples
///
/// ```
/// use docbinder::assemble::anchor_slug;
///
/// assert_eq!(anchor_slug(3, "Getting Started!"), "3-getting-started");
/// ```
pub fn anchor_slug(number: usize, title: &str) -> String {
    let slug: String = title
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('-'),
            c if c.is_alphanumeric() || c == '-' || c == '_' => Some(c),
            _ => None,
        })
        .collect();
    format!("{}-{}", number, slug)
}

/// Builds the combined document from pages in order
///
/// ```text
/// # Documentation from <seed>
///
/// ---
///
/// ## Table of Contents
///
/// 1. [Title](#1-title)
///
/// ---
///
/// ## 1. Title
///
/// <body>
///
/// ---
/// ```
///
/// Numbering runs over the pages given, so entries and headings always agree.
pub fn render_combined(seed: &str, pages: &[PageDocument]) -> String {
    let mut out = String::new();

    let _ = write!(out, "# Documentation from {}\n\n", seed);
    out.push_str("---\n\n");
    out.push_str("## Table of Contents\n\n");

    let toc: Vec<String> = pages
        .iter()
        .enumerate()
        .map(|(i, page)| format!("{}. [{}](#{})", i + 1, page.title, anchor_slug(i + 1, &page.title)))
        .collect();
    out.push_str(&toc.join("\n"));
    out.push_str("\n\n---\n\n");

    for (i, page) in pages.iter().enumerate() {
        let _ = write!(out, "## {}. {}\n\n", i + 1, page.title);
        if !page.body.is_empty() {
            out.push_str(&page.body);
            out.push_str("\n\n");
        }
        out.push_str("---\n\n");
    }

    out
}

/// Combines per-page Markdown files into `output` in ordinal order
///
/// Files missing on disk are skipped. With no readable file left the combine
/// fails and nothing is written.
pub async fn combine_markdown(
    artifacts: &[PageArtifact],
    seed: &str,
    output: &Path,
    observers: &ObserverSet,
) -> Result<CombineOutcome, AssemblyError> {
    let mut pages = Vec::new();
    let mut skipped = Vec::new();

    for artifact in in_ordinal_order(artifacts) {
        match tokio::fs::read_to_string(&artifact.path).await {
            Ok(text) => pages.push(PageDocument::parse(&text)),
            Err(e) => {
                observers
                    .notify_artifact_skipped(&artifact.path, &e.to_string())
                    .await;
                skipped.push(artifact.path.clone());
            }
        }
    }

    if pages.is_empty() {
        return Err(AssemblyError::NoPageFiles);
    }

    tracing::info!("Combining {} Markdown files into {}", pages.len(), output.display());
    write_atomic(output, render_combined(seed, &pages)).await?;

    Ok(CombineOutcome {
        output: output.to_path_buf(),
        pages: pages.len(),
        skipped,
    })
}
