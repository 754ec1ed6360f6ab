//! In-memory tracking store
//!
//! The store is the authoritative ledger: one [`TrackedFile`] per path, each
//! with an append-only history. All mutation goes through a single lock, and
//! the same lock guards [`TrackingStore::snapshot`], so a reader never sees a
//! record whose `current_hash` disagrees with its last history entry.
//!
//! Mutation is crate-internal. The scanner seeds records and the change
//! detector updates them; everyone else only gets cloned snapshots.
//!
//! ## History accounting
//!
//! | Transition | Entries appended |
//! |------------|------------------|
//! | seed       | 1 (`unchanged`), fresh record |
//! | create     | 1 (`created`), replaces any previous record |
//! | modify     | 2 (`modified` pre-image, `modified` post-image) |
//! | delete     | 1 (`deleted`, no hash) |
//!
//! A modification whose fingerprint equals `current_hash` appends nothing.

use crate::types::{ChangeEvent, FileStatus, HistoryEntry, TrackedFile};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Shared ledger of tracked files
#[derive(Debug, Default)]
pub struct TrackingStore {
    files: Mutex<HashMap<PathBuf, TrackedFile>>,
    history_limit: Option<usize>,
}

impl TrackingStore {
    /// Create an empty store with unbounded history
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that keeps at most `limit` entries per file
    ///
    /// Values below 2 are raised to 2 so a modification's pre-image and
    /// post-image are never split.
    pub fn with_history_limit(limit: Option<usize>) -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            history_limit: limit.map(|l| l.max(2)),
        }
    }

    /// Number of tracked files
    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    /// Whether nothing is tracked yet
    pub fn is_empty(&self) -> bool {
        self.files.lock().is_empty()
    }

    /// Whether `path` has a record
    pub fn contains(&self, path: &Path) -> bool {
        self.files.lock().contains_key(path)
    }

    /// Copy of the record for `path`
    pub fn get(&self, path: &Path) -> Option<TrackedFile> {
        self.files.lock().get(path).cloned()
    }

    /// All records, most recently touched first
    ///
    /// Ties on `last_timestamp` are ordered by path so repeated snapshots
    /// of an unchanged store are identical.
    pub fn snapshot(&self) -> Vec<TrackedFile> {
        let mut records: Vec<TrackedFile> = self.files.lock().values().cloned().collect();
        records.sort_by(|a, b| {
            b.last_timestamp
                .cmp(&a.last_timestamp)
                .then_with(|| a.path.cmp(&b.path))
        });
        records
    }

    /// Record the initial state of a file found by the directory scan
    ///
    /// Returns `false` without touching the store if the path is already
    /// present, so a path is seeded at most once.
    pub(crate) fn seed(
        &self,
        path: PathBuf,
        hash: Option<String>,
        user: &str,
        timestamp: DateTime<Utc>,
    ) -> bool {
        let mut files = self.files.lock();
        if files.contains_key(&path) {
            trace!("{} already tracked, not reseeding", path.display());
            return false;
        }
        let record = TrackedFile::new(path.clone(), hash, user, timestamp, FileStatus::Unchanged);
        files.insert(path, record);
        true
    }

    /// Reset the record for a newly created file
    ///
    /// Any existing history for the path is discarded: a creation marks a
    /// new file identity even when the path was tracked before.
    pub(crate) fn record_created(
        &self,
        path: PathBuf,
        hash: Option<String>,
        user: &str,
        timestamp: DateTime<Utc>,
    ) -> ChangeEvent {
        let record =
            TrackedFile::new(path.clone(), hash.clone(), user, timestamp, FileStatus::Created);
        let replaced = self.files.lock().insert(path.clone(), record);
        if let Some(old) = replaced {
            debug!(
                "Replaced record for {} ({} history entries dropped)",
                path.display(),
                old.history.len()
            );
        }

        ChangeEvent::Created {
            path,
            hash,
            user: user.to_string(),
            timestamp,
        }
    }

    /// Apply a freshly computed fingerprint to a tracked file
    ///
    /// Returns `None` when the path is not tracked or the fingerprint is
    /// unchanged. Otherwise appends the pre-image and the post-image and
    /// returns the resulting event. The post-image timestamp is kept
    /// strictly after the pre-image timestamp.
    pub(crate) fn record_modified(
        &self,
        path: &Path,
        hash: Option<String>,
        user: &str,
        timestamp: DateTime<Utc>,
    ) -> Option<ChangeEvent> {
        let mut files = self.files.lock();
        let file = files.get_mut(path)?;
        if file.current_hash == hash {
            trace!("{} fingerprint unchanged", path.display());
            return None;
        }

        let previous = HistoryEntry {
            timestamp: file.last_timestamp,
            hash: file.current_hash.clone(),
            user: file.last_user.clone(),
            status: FileStatus::Modified,
        };
        let timestamp = if timestamp <= previous.timestamp {
            previous.timestamp + Duration::microseconds(1)
        } else {
            timestamp
        };
        let previous_hash = previous.hash.clone();
        file.history.push(previous);

        file.last_timestamp = timestamp;
        file.last_user = user.to_string();
        file.current_hash = hash.clone();
        file.status = FileStatus::Modified;
        file.history.push(HistoryEntry {
            timestamp,
            hash: hash.clone(),
            user: user.to_string(),
            status: FileStatus::Modified,
        });
        self.enforce_history_limit(file);

        Some(ChangeEvent::Modified {
            path: path.to_path_buf(),
            previous_hash,
            hash,
            user: user.to_string(),
            timestamp,
        })
    }

    /// Mark a tracked file as removed from disk
    ///
    /// Returns `None` for untracked paths and for files already marked
    /// deleted.
    pub(crate) fn record_deleted(
        &self,
        path: &Path,
        user: &str,
        timestamp: DateTime<Utc>,
    ) -> Option<ChangeEvent> {
        let mut files = self.files.lock();
        let file = files.get_mut(path)?;
        if file.status == FileStatus::Deleted {
            return None;
        }

        let previous_hash = file.current_hash.take();
        file.last_timestamp = timestamp;
        file.last_user = user.to_string();
        file.status = FileStatus::Deleted;
        file.history.push(HistoryEntry {
            timestamp,
            hash: None,
            user: user.to_string(),
            status: FileStatus::Deleted,
        });
        self.enforce_history_limit(file);

        Some(ChangeEvent::Deleted {
            path: path.to_path_buf(),
            previous_hash,
            user: user.to_string(),
            timestamp,
        })
    }

    fn enforce_history_limit(&self, file: &mut TrackedFile) {
        let Some(limit) = self.history_limit else {
            return;
        };
        if file.history.len() > limit {
            let excess = file.history.len() - limit;
            file.history.drain(..excess);
            trace!("Pruned {} history entries for {}", excess, file.path.display());
        }
    }
}
