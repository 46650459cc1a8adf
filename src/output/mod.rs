//! Output module for run reporting and artifact files
//!
//! This module handles:
//! - Writing artifacts through a staging path so interrupted runs never leave
//!   a truncated file under its final name
//! - Observing run progress
//! - Summarizing the run for the user

mod fs;
mod observer;
mod summary;

pub use fs::{commit_staged, discard_staged, staging_path, write_atomic};
pub use observer::{ObservedEvent, ObserverSet, PipelineObserver, RecordingObserver, TracingObserver};
pub use summary::{print_summary, BranchSummary, RunSummary};

use std::fmt;

/// Kind of artifact a branch produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Pdf,
    Markdown,
}

impl ArtifactKind {
    /// File extension of per-page and combined artifacts
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Markdown => "md",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pdf => write!(f, "PDF"),
            Self::Markdown => write!(f, "Markdown"),
        }
    }
}
