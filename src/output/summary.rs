//! End-of-run summary

use crate::output::ArtifactKind;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::time::Duration;

/// Result of one format branch
#[derive(Debug, Clone, PartialEq)]
pub struct BranchSummary {
    pub kind: ArtifactKind,

    /// Directory holding the per-page artifacts
    pub output_dir: PathBuf,

    /// Per-page artifacts written
    pub written: usize,

    /// Pages that produced no artifact
    pub failed: usize,

    /// Combined artifact, when assembly succeeded
    pub combined: Option<PathBuf>,
}

impl BranchSummary {
    pub fn success(&self) -> bool {
        self.combined.is_some()
    }
}

/// Summary of a whole run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub seed: String,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub pages_discovered: usize,
    pub pages_rendered: usize,
    pub fetch_failures: usize,
    pub branches: Vec<BranchSummary>,
}

impl RunSummary {
    /// True when every requested branch produced its combined artifact
    pub fn success(&self) -> bool {
        !self.branches.is_empty() && self.branches.iter().all(BranchSummary::success)
    }
}

/// Prints the summary to stdout
pub fn print_summary(summary: &RunSummary) {
    println!();
    println!("=== Run Summary ===");
    println!();
    println!("Seed: {}", summary.seed);
    println!(
        "Started: {}",
        summary.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("Elapsed: {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    println!("Discovery:");
    println!("  Pages found: {}", summary.pages_discovered);
    println!("  Pages scanned: {}", summary.pages_rendered);
    println!("  Scan failures: {}", summary.fetch_failures);
    println!();

    for branch in &summary.branches {
        println!("{}:", branch.kind);
        println!("  Pages converted: {}", branch.written);
        println!("  Pages failed: {}", branch.failed);
        println!("  Page files: {}", branch.output_dir.display());
        match &branch.combined {
            Some(path) => println!("  Combined: {}", path.display()),
            None => println!("  Combined: not created"),
        }
        println!();
    }

    if summary.success() {
        println!("Conversion complete");
    } else {
        println!("Conversion failed");
    }
}
