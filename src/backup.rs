//! Content-addressed backup store
//!
//! With backup mode on, every observed file state that has a fingerprint is
//! copied once into a sharded object directory, keyed by its SHA-256 and
//! compressed with LZ4. Any hash recorded in a file's history can then be
//! turned back into bytes with [`BackupStore::load`].
//!
//! ## Layout
//!
//! ```text
//! <backup-dir>/
//! └── objects/
//!     └── 2c/
//!         └── f24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824
//! ```
//!
//! Objects are deduplicated: writing the same content twice stores it once.

use crate::error::{Result, TrackError};
use crate::fingerprint::hash_bytes;
use crate::observer::ChangeObserver;
use crate::store::TrackingStore;
use crate::types::ChangeEvent;
use crate::utils;
use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Backup observer writing one compressed object per distinct content hash
#[derive(Debug)]
pub struct BackupStore {
    root: PathBuf,
}

impl BackupStore {
    /// Open the store at `root`, creating its directories if needed
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root.join("objects"))?;
        debug!("Backup store opened at {}", root.display());
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether an object for `hash` is present
    pub fn contains(&self, hash: &str) -> bool {
        self.object_path(hash).is_ok_and(|path| path.is_file())
    }

    /// Copy the content of `path` into the store under `expected_hash`
    ///
    /// Returns `Ok(false)` without writing when the object already exists or
    /// when the file no longer has the expected content (it changed again
    /// after the event was recorded; the newer state gets its own event).
    pub fn backup_file(&self, path: &Path, expected_hash: &str) -> Result<bool> {
        if self.contains(expected_hash) {
            trace!("Object {} already stored", short(expected_hash));
            return Ok(false);
        }

        let content = match fs::read(path) {
            Ok(content) => content,
            Err(e) => {
                trace!("Skipping backup of {}: {}", path.display(), e);
                return Ok(false);
            }
        };
        if hash_bytes(&content) != expected_hash {
            trace!("{} changed before it could be backed up", path.display());
            return Ok(false);
        }

        self.store_bytes(&content).map(|_| true)
    }

    /// Store `content` and return its hash
    pub fn store_bytes(&self, content: &[u8]) -> Result<String> {
        let hash = hash_bytes(content);
        let object_path = self.object_path(&hash)?;
        if object_path.is_file() {
            return Ok(hash);
        }

        let object_dir = object_path
            .parent()
            .ok_or_else(|| TrackError::backup(format!("Bad object path for {}", hash)))?;
        fs::create_dir_all(object_dir)?;

        let compressed = compress_prepend_size(content);
        utils::atomic_write(&object_path, &compressed)?;

        trace!(
            "Stored object {} ({} -> {} bytes)",
            short(&hash),
            content.len(),
            compressed.len()
        );
        Ok(hash)
    }

    /// Load and verify the content stored under `hash`
    ///
    /// # Errors
    ///
    /// - [`TrackError::Backup`] if `hash` is not a SHA-256 hex digest, or the
    ///   object is missing or cannot be decompressed
    /// - [`TrackError::HashMismatch`] if the content does not match its key
    pub fn load(&self, hash: &str) -> Result<Vec<u8>> {
        let object_path = self.object_path(hash)?;
        if !object_path.is_file() {
            return Err(TrackError::backup(format!("Object not found: {}", hash)));
        }

        let compressed = fs::read(&object_path)?;
        let content = decompress_size_prepended(&compressed)
            .map_err(|e| TrackError::backup(format!("Decompression failed for {}: {}", hash, e)))?;

        let actual = hash_bytes(&content);
        if actual != hash {
            return Err(TrackError::HashMismatch {
                expected: hash.to_string(),
                actual,
            });
        }
        Ok(content)
    }

    /// Get path for an object (with sharding)
    ///
    /// Only 64-character lowercase hex digests name objects.
    fn object_path(&self, hash: &str) -> Result<PathBuf> {
        if !is_object_hash(hash) {
            return Err(TrackError::backup(format!("Invalid object hash: {:?}", hash)));
        }
        let (prefix, suffix) = hash.split_at(2);
        Ok(self.root.join("objects").join(prefix).join(suffix))
    }
}

fn is_object_hash(hash: &str) -> bool {
    hash.len() == 64 && hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn short(hash: &str) -> &str {
    hash.get(..8).unwrap_or(hash)
}

impl ChangeObserver for BackupStore {
    fn on_seeded(&self, store: &TrackingStore) -> Result<()> {
        let mut stored = 0usize;
        for file in store.snapshot() {
            if let Some(hash) = &file.current_hash {
                if self.backup_file(&file.path, hash)? {
                    stored += 1;
                }
            }
        }
        debug!("Backed up {} objects after initial scan", stored);
        Ok(())
    }

    fn on_change(&self, event: &ChangeEvent, _store: &TrackingStore) -> Result<()> {
        match (event, event.hash()) {
            (ChangeEvent::Created { path, .. }, Some(hash))
            | (ChangeEvent::Modified { path, .. }, Some(hash)) => {
                self.backup_file(path, hash)?;
            }
            _ => {}
        }
        Ok(())
    }
}
