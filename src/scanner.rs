//! Initial directory scan
//!
//! Before live notifications are processed, the scanner walks the whole tree
//! once and seeds the tracking store with an `unchanged` record per
//! trackable file. Paths are collected sequentially with `walkdir`, then
//! fingerprinted in parallel on a bounded rayon pool.
//!
//! Files created between the start of the scan and the start of the watch
//! may be missed or seeded and then recreated; the engine accepts that
//! narrow startup window.

use crate::error::{Result, TrackError};
use crate::filter::PathFilter;
use crate::fingerprint::fingerprint;
use crate::store::TrackingStore;
use crate::utils;
use chrono::Utc;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Outcome of a seeding pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Records added to the store
    pub files_seeded: usize,
    /// Files rejected by the path filter
    pub files_skipped: usize,
    /// Seeded files whose content could not be read
    pub unreadable: usize,
    /// Wall time of the scan
    pub duration: Duration,
}

/// Seeds a [`TrackingStore`] from a full directory walk
pub struct DirectoryScanner {
    store: Arc<TrackingStore>,
    filter: PathFilter,
    user: String,
    follow_symlinks: bool,
    parallel_workers: usize,
}

impl DirectoryScanner {
    /// Create a scanner with default settings
    ///
    /// Symbolic links are not followed and the number of workers equals the
    /// number of CPU cores.
    pub fn new(store: Arc<TrackingStore>, filter: PathFilter) -> Self {
        Self {
            store,
            filter,
            user: utils::current_user(),
            follow_symlinks: false,
            parallel_workers: num_cpus::get(),
        }
    }

    /// Record seeded files under `user` instead of the process user
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Set symbolic link following behavior
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Set number of fingerprinting workers (minimum 1)
    pub fn with_parallel_workers(mut self, workers: usize) -> Self {
        self.parallel_workers = workers.max(1);
        self
    }

    /// Walk `root` and seed every trackable file
    ///
    /// # Errors
    ///
    /// - [`TrackError::InvalidRoot`] if `root` is not a directory
    /// - [`TrackError::WalkDir`] if the root itself cannot be listed
    /// - [`TrackError::ThreadPool`] if the worker pool cannot be created
    ///
    /// Unreadable entries below the root are logged and skipped.
    pub fn seed(&self, root: &Path) -> Result<ScanStats> {
        if !root.is_dir() {
            return Err(TrackError::InvalidRoot(root.to_path_buf()));
        }

        let start = Instant::now();
        let mut stats = ScanStats::default();
        let mut candidates = Vec::new();

        for entry in WalkDir::new(root).follow_links(self.follow_symlinks) {
            let entry = match entry {
                Ok(entry) => entry,
                // An unreadable root would otherwise seed an empty ledger
                Err(e) if e.path() == Some(root) => return Err(e.into()),
                Err(e) => {
                    warn!("Walk error: {}", e);
                    continue;
                }
            };
            if entry.file_type().is_dir() || entry.path().is_dir() {
                continue;
            }
            if !self.filter.is_trackable(entry.path()) {
                stats.files_skipped += 1;
                continue;
            }
            candidates.push(entry.into_path());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallel_workers)
            .build()
            .map_err(|e| TrackError::ThreadPool(e.to_string()))?;

        let fingerprints: Vec<(PathBuf, Option<String>)> = pool.install(|| {
            candidates
                .into_par_iter()
                .map(|path| {
                    let hash = fingerprint(&path);
                    (path, hash)
                })
                .collect()
        });

        for (path, hash) in fingerprints {
            if hash.is_none() {
                stats.unreadable += 1;
            }
            if self.store.seed(path, hash, &self.user, Utc::now()) {
                stats.files_seeded += 1;
            }
        }

        stats.duration = start.elapsed();
        info!(
            "Seeded {} files from {} in {:?}",
            stats.files_seeded,
            root.display(),
            stats.duration
        );
        debug!(
            "Scan skipped {} ineligible files, {} unreadable",
            stats.files_skipped, stats.unreadable
        );

        Ok(stats)
    }
}
