//! Core data types used throughout the filetrack library
//!
//! ## Overview
//!
//! The types in this module represent:
//! - **Ledger State**: `TrackedFile`, `HistoryEntry`, `FileStatus` - the
//!   per-file record kept by the tracking store
//! - **Input**: `Notification` - a raw create/modify/remove signal from the
//!   notification source
//! - **Output**: `ChangeEvent` - what the change detector reports to observers
//! - **Configuration**: `TrackerConfig` - engine parameters
//!
//! ## Examples
//!
//! ```rust
//! use filetrack::types::TrackerConfig;
//! use std::path::PathBuf;
//!
//! let config = TrackerConfig {
//!     root_path: PathBuf::from("./project"),
//!     history_limit: Some(64),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use crate::error::{Result, TrackError};
use crate::filter::DEFAULT_IGNORED_EXTENSIONS;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Observed state of a tracked file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// Appeared through a creation notification
    Created,
    /// Content changed at least once since it was first observed
    Modified,
    /// Seeded by the initial scan and not changed since
    Unchanged,
    /// Removed from disk while tracked
    Deleted,
}

impl FileStatus {
    /// Lowercase name used in logs and the change log
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Created => "created",
            FileStatus::Modified => "modified",
            FileStatus::Unchanged => "unchanged",
            FileStatus::Deleted => "deleted",
        }
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable snapshot of one observed state of a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// When the state was observed
    pub timestamp: DateTime<Utc>,
    /// Content fingerprint, `None` when the file was unreadable
    pub hash: Option<String>,
    /// Effective user of the observing process
    pub user: String,
    /// Status tag of this entry
    pub status: FileStatus,
}

/// Ledger record for one tracked path
///
/// `current_hash` always equals the hash of the last history entry once the
/// store has finished an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedFile {
    /// Path of the file, rooted at the watched directory
    pub path: PathBuf,
    /// Time of the most recent observed state
    pub last_timestamp: DateTime<Utc>,
    /// User under which the most recent state was observed
    pub last_user: String,
    /// Fingerprint at `last_timestamp`
    pub current_hash: Option<String>,
    /// Current status
    pub status: FileStatus,
    /// Chronological, append-only list of observed states
    pub history: Vec<HistoryEntry>,
}

impl TrackedFile {
    pub(crate) fn new(
        path: PathBuf,
        hash: Option<String>,
        user: &str,
        timestamp: DateTime<Utc>,
        status: FileStatus,
    ) -> Self {
        let entry = HistoryEntry {
            timestamp,
            hash: hash.clone(),
            user: user.to_string(),
            status,
        };
        Self {
            path,
            last_timestamp: timestamp,
            last_user: user.to_string(),
            current_hash: hash,
            status,
            history: vec![entry],
        }
    }

    /// Most recent history entry
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }

    /// Check that the live fields agree with the last history entry
    pub fn is_consistent(&self) -> bool {
        self.latest()
            .map(|entry| entry.hash == self.current_hash)
            .unwrap_or(false)
    }

    /// Short form of the current fingerprint for display
    pub fn short_hash(&self) -> &str {
        match &self.current_hash {
            Some(hash) => &hash[..hash.len().min(12)],
            None => "-",
        }
    }
}

/// Raw filesystem notification fed to the change detector
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Notification {
    /// A path was created
    Created(PathBuf),
    /// A path's content or metadata was written
    Modified(PathBuf),
    /// A path was removed
    Removed(PathBuf),
    /// Something was renamed onto a path (e.g. an editor's atomic save)
    ///
    /// Treated as a modification when the path is already tracked and
    /// present, and as a creation otherwise.
    MovedTo(PathBuf),
}

impl Notification {
    /// Path the notification refers to
    pub fn path(&self) -> &Path {
        match self {
            Notification::Created(p)
            | Notification::Modified(p)
            | Notification::Removed(p)
            | Notification::MovedTo(p) => p,
        }
    }
}

/// Change reported by the engine after a store mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ChangeEvent {
    /// Initial state recorded by the directory scan
    Seeded {
        path: PathBuf,
        hash: Option<String>,
        user: String,
        timestamp: DateTime<Utc>,
    },
    /// A file was (re)created and its record reset
    Created {
        path: PathBuf,
        hash: Option<String>,
        user: String,
        timestamp: DateTime<Utc>,
    },
    /// A file's fingerprint changed
    Modified {
        path: PathBuf,
        previous_hash: Option<String>,
        hash: Option<String>,
        user: String,
        timestamp: DateTime<Utc>,
    },
    /// A tracked file disappeared
    Deleted {
        path: PathBuf,
        previous_hash: Option<String>,
        user: String,
        timestamp: DateTime<Utc>,
    },
}

impl ChangeEvent {
    /// Build a `Seeded` event from a freshly seeded record
    pub fn seeded(file: &TrackedFile) -> Self {
        ChangeEvent::Seeded {
            path: file.path.clone(),
            hash: file.current_hash.clone(),
            user: file.last_user.clone(),
            timestamp: file.last_timestamp,
        }
    }

    /// Path the event refers to
    pub fn path(&self) -> &Path {
        match self {
            ChangeEvent::Seeded { path, .. }
            | ChangeEvent::Created { path, .. }
            | ChangeEvent::Modified { path, .. }
            | ChangeEvent::Deleted { path, .. } => path,
        }
    }

    /// Fingerprint of the state the event leaves behind
    pub fn hash(&self) -> Option<&str> {
        match self {
            ChangeEvent::Seeded { hash, .. }
            | ChangeEvent::Created { hash, .. }
            | ChangeEvent::Modified { hash, .. } => hash.as_deref(),
            ChangeEvent::Deleted { .. } => None,
        }
    }

    /// When the event was observed
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ChangeEvent::Seeded { timestamp, .. }
            | ChangeEvent::Created { timestamp, .. }
            | ChangeEvent::Modified { timestamp, .. }
            | ChangeEvent::Deleted { timestamp, .. } => *timestamp,
        }
    }

    /// Status the file is left in
    pub fn status(&self) -> FileStatus {
        match self {
            ChangeEvent::Seeded { .. } => FileStatus::Unchanged,
            ChangeEvent::Created { .. } => FileStatus::Created,
            ChangeEvent::Modified { .. } => FileStatus::Modified,
            ChangeEvent::Deleted { .. } => FileStatus::Deleted,
        }
    }
}

/// Engine configuration
///
/// Can be loaded from a JSON file; any field left out takes its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Directory to watch
    pub root_path: PathBuf,
    /// Path suffixes that are never tracked
    pub ignored_extensions: Vec<String>,
    /// Additional glob patterns that are never tracked
    pub ignore_patterns: Vec<String>,
    /// Maximum history entries kept per file (`None` = unbounded)
    pub history_limit: Option<usize>,
    /// Whether the initial scan follows symbolic links
    pub follow_symlinks: bool,
    /// Worker threads used to fingerprint the initial scan
    pub parallel_workers: usize,
    /// JSON-lines change log destination
    pub log_file: Option<PathBuf>,
    /// Content-addressed backup directory
    pub backup_dir: Option<PathBuf>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            root_path: PathBuf::from("."),
            ignored_extensions: DEFAULT_IGNORED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            ignore_patterns: Vec::new(),
            history_limit: None,
            follow_symlinks: false,
            parallel_workers: num_cpus::get(),
            log_file: None,
            backup_dir: None,
        }
    }
}

impl TrackerConfig {
    /// Load a configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: TrackerConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.parallel_workers == 0 {
            return Err(TrackError::InvalidConfiguration(
                "parallel_workers must be at least 1".to_string(),
            ));
        }
        if let Some(limit) = self.history_limit {
            if limit < 2 {
                return Err(TrackError::InvalidConfiguration(format!(
                    "history_limit must be at least 2 (got {})",
                    limit
                )));
            }
        }
        if self.ignored_extensions.iter().any(|ext| ext.is_empty()) {
            return Err(TrackError::InvalidConfiguration(
                "ignored_extensions must not contain an empty suffix".to_string(),
            ));
        }
        Ok(())
    }
}
