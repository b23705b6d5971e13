//! Artifact discovery and cleanup
//!
//! Tools choose their own output extension, so files are located by prefix:
//! `<stem>.*` inside a directory. Cleanup here is best-effort. Failures are
//! logged and never replace the error that caused the cleanup.

use crate::error::{Error, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Suffixes of files a downloader is still writing (never a finished output)
const IN_PROGRESS_SUFFIXES: &[&str] = &[".part", ".ytdl"];

/// Result of looking up an artifact by prefix
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArtifactLookup {
    /// A matching file exists
    Found(PathBuf),
    /// Nothing matched; `pattern` describes what was searched
    NotFound {
        /// Human-readable search pattern, e.g. `/out/title.*`
        pattern: String,
    },
}

impl ArtifactLookup {
    /// Convert into a `Result`, mapping a miss to [`Error::OutputNotFound`]
    pub fn into_result(self) -> Result<PathBuf> {
        match self {
            ArtifactLookup::Found(path) => Ok(path),
            ArtifactLookup::NotFound { pattern } => Err(Error::OutputNotFound { pattern }),
        }
    }

    /// The found path, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            ArtifactLookup::Found(path) => Some(path),
            ArtifactLookup::NotFound { .. } => None,
        }
    }
}

/// Find a finished file named `<stem>.<anything>` in `dir`
///
/// Matches are ordered by file name so the choice is deterministic. Partial
/// downloads (`.part`, `.ytdl`) are never returned.
pub async fn find_by_prefix(dir: &Path, stem: &str) -> ArtifactLookup {
    let mut matches = prefixed_files(dir, stem).await;
    matches.retain(|path| !is_in_progress(path));
    matches.sort();

    match matches.into_iter().next() {
        Some(path) => ArtifactLookup::Found(path),
        None => ArtifactLookup::NotFound {
            pattern: pattern_label(dir, stem),
        },
    }
}

/// Find the output `<stem>.<preferred_extension>`, else any `<stem>.*`
pub async fn find_output(dir: &Path, stem: &str, preferred_extension: &str) -> ArtifactLookup {
    let preferred = dir.join(format!("{stem}.{preferred_extension}"));
    if fs::metadata(&preferred).await.is_ok_and(|m| m.is_file()) {
        return ArtifactLookup::Found(preferred);
    }
    find_by_prefix(dir, stem).await
}

/// Remove every file named `<stem>.*` in `dir`, partial downloads included
///
/// Returns the number of files removed.
pub async fn remove_prefixed(dir: &Path, stem: &str) -> usize {
    let mut removed = 0;
    for path in prefixed_files(dir, stem).await {
        if remove_file(&path).await {
            removed += 1;
        }
    }
    debug!(?dir, stem, removed, "removed prefixed artifacts");
    removed
}

/// Recreate `dir` empty, discarding whatever a previous job left behind
pub async fn reset_dir(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir).await {
        Ok(()) => debug!(?dir, "discarded previous working directory"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    fs::create_dir_all(dir).await?;
    Ok(())
}

/// Recursively remove `dir`; a missing directory is not an error
pub async fn remove_dir(dir: &Path) -> bool {
    match fs::remove_dir_all(dir).await {
        Ok(()) => {
            debug!(?dir, "removed directory");
            true
        }
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => {
            warn!(?dir, error = %e, "failed to remove directory");
            false
        }
    }
}

/// Remove a single file; a missing file is not an error
pub async fn remove_file(path: &Path) -> bool {
    match fs::remove_file(path).await {
        Ok(()) => {
            debug!(?path, "removed file");
            true
        }
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => {
            warn!(?path, error = %e, "failed to remove file");
            false
        }
    }
}

/// Cleanup for an abnormal Convert exit: the working directory and any
/// partial output at the final destination
pub async fn discard_convert(temp_dir: &Path, partial_output: &Path) {
    remove_dir(temp_dir).await;
    remove_file(partial_output).await;
}

async fn prefixed_files(dir: &Path, stem: &str) -> Vec<PathBuf> {
    let prefix = format!("{stem}.");
    let mut found = Vec::new();

    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != ErrorKind::NotFound {
                warn!(?dir, error = %e, "failed to read directory");
            }
            return found;
        }
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!(?dir, error = %e, "failed to read directory entry");
                break;
            }
        };
        if !entry.file_name().to_string_lossy().starts_with(&prefix) {
            continue;
        }
        if entry.file_type().await.is_ok_and(|t| t.is_file()) {
            found.push(entry.path());
        }
    }

    found
}

fn is_in_progress(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    IN_PROGRESS_SUFFIXES.iter().any(|s| name.ends_with(s))
}

fn pattern_label(dir: &Path, stem: &str) -> String {
    dir.join(format!("{stem}.*")).display().to_string()
}
