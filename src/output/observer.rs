//! Run observers
//!
//! Discovery and conversion report their progress through [`PipelineObserver`]
//! instead of printing, so the core logic can be tested without capturing
//! process output.

use crate::output::ArtifactKind;
use crate::render::RenderError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use url::Url;

/// Receives run events
///
/// Every method has a no-op default, so implementors only override what they
/// care about.
///
/// # Example
///
/// ```ignore
/// use docbinder::PipelineObserver;
///
/// struct Progress;
///
/// #[async_trait::async_trait]
/// impl PipelineObserver for Progress {
///     async fn on_page_discovered(&self, url: &url::Url, depth: u32, _priority: bool) {
///         println!("found {} at depth {}", url, depth);
///     }
/// }
/// ```
#[async_trait]
pub trait PipelineObserver: Send + Sync {
    /// A link was accepted into the crawl result
    async fn on_page_discovered(&self, _url: &Url, _depth: u32, _priority: bool) {}

    /// A page could not be rendered during discovery
    async fn on_fetch_failed(&self, _error: &RenderError) {}

    /// A per-page artifact was written to its final path
    async fn on_artifact_written(&self, _kind: ArtifactKind, _ordinal: usize, _path: &Path) {}

    /// A page produced no artifact
    async fn on_artifact_failed(&self, _kind: ArtifactKind, _ordinal: usize, _url: &Url, _error: &str) {}

    /// An artifact was left out of the combined document
    async fn on_artifact_skipped(&self, _path: &Path, _reason: &str) {}

    /// Post-merge compaction failed; the merged file is kept as is
    async fn on_optimization_warning(&self, _message: &str) {}

    /// A format branch settled
    async fn on_branch_finished(&self, _kind: ArtifactKind, _success: bool) {}
}

/// Fans events out to every registered observer
#[derive(Clone, Default)]
pub struct ObserverSet {
    observers: Vec<Arc<dyn PipelineObserver>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// An observer set that logs through `tracing`
    pub fn tracing() -> Self {
        let mut set = Self::new();
        set.register(Arc::new(TracingObserver));
        set
    }

    pub fn register(&mut self, observer: Arc<dyn PipelineObserver>) {
        self.observers.push(observer);
    }

    pub async fn notify_page_discovered(&self, url: &Url, depth: u32, priority: bool) {
        for observer in &self.observers {
            observer.on_page_discovered(url, depth, priority).await;
        }
    }

    pub async fn notify_fetch_failed(&self, error: &RenderError) {
        for observer in &self.observers {
            observer.on_fetch_failed(error).await;
        }
    }

    pub async fn notify_artifact_written(&self, kind: ArtifactKind, ordinal: usize, path: &Path) {
        for observer in &self.observers {
            observer.on_artifact_written(kind, ordinal, path).await;
        }
    }

    pub async fn notify_artifact_failed(&self, kind: ArtifactKind, ordinal: usize, url: &Url, error: &str) {
        for observer in &self.observers {
            observer.on_artifact_failed(kind, ordinal, url, error).await;
        }
    }

    pub async fn notify_artifact_skipped(&self, path: &Path, reason: &str) {
        for observer in &self.observers {
            observer.on_artifact_skipped(path, reason).await;
        }
    }

    pub async fn notify_optimization_warning(&self, message: &str) {
        for observer in &self.observers {
            observer.on_optimization_warning(message).await;
        }
    }

    pub async fn notify_branch_finished(&self, kind: ArtifactKind, success: bool) {
        for observer in &self.observers {
            observer.on_branch_finished(kind, success).await;
        }
    }
}

/// Logs every event through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

#[async_trait]
impl PipelineObserver for TracingObserver {
    async fn on_page_discovered(&self, url: &Url, depth: u32, priority: bool) {
        if priority {
            tracing::debug!("Found navigation link: {} (depth {})", url, depth);
        } else {
            tracing::debug!("Found doc link: {} (depth {})", url, depth);
        }
    }

    async fn on_fetch_failed(&self, error: &RenderError) {
        tracing::warn!("Discovery fetch failed: {}", error);
    }

    async fn on_artifact_written(&self, kind: ArtifactKind, ordinal: usize, path: &Path) {
        tracing::info!("[{} #{}] Saved {}", kind, ordinal + 1, path.display());
    }

    async fn on_artifact_failed(&self, kind: ArtifactKind, ordinal: usize, url: &Url, error: &str) {
        tracing::warn!("[{} #{}] Failed to convert {}: {}", kind, ordinal + 1, url, error);
    }

    async fn on_artifact_skipped(&self, path: &Path, reason: &str) {
        tracing::warn!("Skipping {}: {}", path.display(), reason);
    }

    async fn on_optimization_warning(&self, message: &str) {
        tracing::warn!("PDF optimization skipped: {}", message);
    }

    async fn on_branch_finished(&self, kind: ArtifactKind, success: bool) {
        if success {
            tracing::info!("{} output complete", kind);
        } else {
            tracing::error!("{} output failed", kind);
        }
    }
}

/// Event captured by [`RecordingObserver`]
#[derive(Debug, Clone, PartialEq)]
pub enum ObservedEvent {
    PageDiscovered { url: String, depth: u32, priority: bool },
    FetchFailed { url: String },
    ArtifactWritten { kind: ArtifactKind, ordinal: usize, path: PathBuf },
    ArtifactFailed { kind: ArtifactKind, ordinal: usize, url: String },
    ArtifactSkipped { path: PathBuf },
    OptimizationWarning,
    BranchFinished { kind: ArtifactKind, success: bool },
}

/// Keeps events in memory for later inspection
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObservedEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far
    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    fn record(&self, event: ObservedEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[async_trait]
impl PipelineObserver for RecordingObserver {
    async fn on_page_discovered(&self, url: &Url, depth: u32, priority: bool) {
        self.record(ObservedEvent::PageDiscovered {
            url: url.to_string(),
            depth,
            priority,
        });
    }

    async fn on_fetch_failed(&self, error: &RenderError) {
        self.record(ObservedEvent::FetchFailed {
            url: error.url().to_string(),
        });
    }

    async fn on_artifact_written(&self, kind: ArtifactKind, ordinal: usize, path: &Path) {
        self.record(ObservedEvent::ArtifactWritten {
            kind,
            ordinal,
            path: path.to_path_buf(),
        });
    }

    async fn on_artifact_failed(&self, kind: ArtifactKind, ordinal: usize, url: &Url, _error: &str) {
        self.record(ObservedEvent::ArtifactFailed {
            kind,
            ordinal,
            url: url.to_string(),
        });
    }

    async fn on_artifact_skipped(&self, path: &Path, _reason: &str) {
        self.record(ObservedEvent::ArtifactSkipped {
            path: path.to_path_buf(),
        });
    }

    async fn on_optimization_warning(&self, _message: &str) {
        self.record(ObservedEvent::OptimizationWarning);
    }

    async fn on_branch_finished(&self, kind: ArtifactKind, success: bool) {
        self.record(ObservedEvent::BranchFinished { kind, success });
    }
}
