//! Staged file writes
//!
//! Every artifact is first written next to its destination under a
//! `.partial` name and renamed into place once complete.

use std::io;
use std::path::{Path, PathBuf};

const STAGING_SUFFIX: &str = ".partial";

/// Sibling path an artifact is written to before it is committed
///
/// # Examples
///
/// ```
/// use docbinder::output::staging_path;
/// use std::path::Path;
///
/// assert_eq!(
///     staging_path(Path::new("out/001_intro.pdf")),
///     Path::new("out/001_intro.pdf.partial")
/// );
/// ```
pub fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(STAGING_SUFFIX);
    path.with_file_name(name)
}

/// Moves a staged file to its final path
pub async fn commit_staged(staging: &Path, path: &Path) -> io::Result<()> {
    tokio::fs::rename(staging, path).await
}

/// Removes a staged file left behind by a failed write
pub async fn discard_staged(staging: &Path) {
    match tokio::fs::remove_file(staging).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::debug!("Failed to remove {}: {}", staging.display(), e),
    }
}

/// Writes `contents` to `path` through its staging path
pub async fn write_atomic(path: &Path, contents: impl AsRef<[u8]>) -> io::Result<()> {
    let staging = staging_path(path);
    if let Err(e) = tokio::fs::write(&staging, contents).await {
        discard_staged(&staging).await;
        return Err(e);
    }
    if let Err(e) = commit_staged(&staging, path).await {
        discard_staged(&staging).await;
        return Err(e);
    }
    Ok(())
}
