//! Per-branch output layout

use crate::config::{OutputConfig, OutputFormat};
use crate::output::ArtifactKind;
use crate::url::domain_label;
use std::path::{Path, PathBuf};
use url::Url;

/// Where one format branch writes its artifacts
///
/// Each branch owns its own context; running both formats never shares or
/// toggles a directory between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchContext {
    pub kind: ArtifactKind,

    /// Directory for per-page artifacts
    pub output_dir: PathBuf,

    /// Path of the combined artifact
    pub combined_path: PathBuf,
}

/// Builds the branch contexts requested by `output`
///
/// | Format | Page directory | Combined file |
/// |--------|----------------|---------------|
/// | pdf | `<domain>_pdfs` | `<domain>_documentation.pdf` |
/// | markdown | `<domain>_markdown` | `<domain>_documentation.md` |
/// | both | `<domain>_output/pdfs`, `<domain>_output/markdown` | both of the above |
///
/// An explicit output directory replaces the default directory; an explicit
/// final name replaces the combined PDF path, and the Markdown file takes the
/// same path with an `.md` extension.
pub fn branch_contexts(output: &OutputConfig, seed: &Url) -> Vec<BranchContext> {
    let label = domain_label(seed);
    let dir = |default: String| {
        output
            .output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(default))
    };

    let combined = |kind: ArtifactKind| match &output.final_name {
        Some(name) if kind == ArtifactKind::Pdf => PathBuf::from(name),
        Some(name) => Path::new(name).with_extension(kind.extension()),
        None => PathBuf::from(format!("{}_documentation.{}", label, kind.extension())),
    };

    match output.format {
        OutputFormat::Pdf => vec![BranchContext {
            kind: ArtifactKind::Pdf,
            output_dir: dir(format!("{}_pdfs", label)),
            combined_path: combined(ArtifactKind::Pdf),
        }],
        OutputFormat::Markdown => vec![BranchContext {
            kind: ArtifactKind::Markdown,
            output_dir: dir(format!("{}_markdown", label)),
            combined_path: combined(ArtifactKind::Markdown),
        }],
        OutputFormat::Both => {
            let root = dir(format!("{}_output", label));
            vec![
                BranchContext {
                    kind: ArtifactKind::Pdf,
                    output_dir: root.join("pdfs"),
                    combined_path: combined(ArtifactKind::Pdf),
                },
                BranchContext {
                    kind: ArtifactKind::Markdown,
                    output_dir: root.join("markdown"),
                    combined_path: combined(ArtifactKind::Markdown),
                },
            ]
        }
    }
}
