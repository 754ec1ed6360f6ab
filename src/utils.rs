//! Utility functions for filetrack
//!
//! Process identity lookups, path helpers and atomic writes shared by the
//! engine and its collaborators.

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Name of the account the process runs under
///
/// Falls back to `"unknown"` when neither `USER` nor `USERNAME` is set.
pub fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Host name of the machine, or `"unknown"`
pub fn host_name() -> String {
    hostname::get()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Express `path` relative to `base` when it lives below it
///
/// Paths outside `base` are returned unchanged.
pub fn make_relative(path: &Path, base: &Path) -> PathBuf {
    path.strip_prefix(base)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Write a file atomically (write to temp + rename)
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("tmp");

    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;

    trace!("Atomically wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
