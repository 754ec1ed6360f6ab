//! File system watcher for tracking changes in real-time
//!
//! This module provides the `FsWatcher` struct which uses OS-specific file
//! system event APIs (through `notify`) to observe a directory tree
//! recursively. Raw events are translated into [`Notification`]s and pushed
//! over a channel to the single consumer that owns change detection.
//!
//! Renames are not a distinct change: the old name is reported as removed
//! and the new name as [`Notification::MovedTo`], which the detector records
//! as a modification when the target was already tracked.

use crate::error::{Result, TrackError};
use crate::types::Notification;
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use tracing::{debug, error, info, trace};

/// Recursive file system watcher feeding a notification channel
pub struct FsWatcher {
    /// The notify watcher instance
    watcher: Mutex<notify::RecommendedWatcher>,
    /// Root directory being watched
    root_path: PathBuf,
    /// Number of notifications forwarded so far
    forwarded: Arc<AtomicU64>,
    /// Whether the backend reported an error (events may have been lost)
    missed_events: Arc<AtomicBool>,
    /// Whether the watcher is running
    running: AtomicBool,
}

impl FsWatcher {
    /// Create a new file system watcher
    ///
    /// # Arguments
    ///
    /// * `root` - The root directory to watch
    /// * `sender` - Channel that receives translated notifications
    ///
    /// # Errors
    ///
    /// - [`TrackError::InvalidRoot`] if `root` is not a directory
    /// - [`TrackError::Watch`] if the OS backend cannot be initialised
    pub fn new(root: &Path, sender: Sender<Notification>) -> Result<Self> {
        if !root.is_dir() {
            return Err(TrackError::InvalidRoot(root.to_path_buf()));
        }
        info!("Initializing file system watcher for: {}", root.display());

        let forwarded = Arc::new(AtomicU64::new(0));
        let missed_events = Arc::new(AtomicBool::new(false));
        let forwarded_clone = Arc::clone(&forwarded);
        let missed_events_clone = Arc::clone(&missed_events);

        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                trace!("File system event: {:?}", event);
                for notification in Self::translate(event) {
                    if sender.send(notification).is_err() {
                        // Consumer is gone; nothing left to deliver to
                        return;
                    }
                    forwarded_clone.fetch_add(1, Ordering::Relaxed);
                }
            }
            Err(e) => {
                error!("Watch error: {}", e);
                missed_events_clone.store(true, Ordering::Relaxed);
            }
        })?;

        Ok(FsWatcher {
            watcher: Mutex::new(watcher),
            root_path: root.to_path_buf(),
            forwarded,
            missed_events,
            running: AtomicBool::new(false),
        })
    }

    /// Start watching for file system events
    pub fn watch(&self) -> Result<()> {
        if self.running.swap(true, Ordering::Relaxed) {
            debug!("Watcher already running");
            return Ok(());
        }

        info!("Starting file system watch on: {}", self.root_path.display());

        if let Err(e) = self
            .watcher
            .lock()
            .watch(&self.root_path, RecursiveMode::Recursive)
        {
            self.running.store(false, Ordering::Relaxed);
            return Err(e.into());
        }

        Ok(())
    }

    /// Stop watching and release the OS watch handles
    pub fn stop(&self) -> Result<()> {
        if !self.running.swap(false, Ordering::Relaxed) {
            debug!("Watcher not running");
            return Ok(());
        }

        info!("Stopping file system watch");

        self.watcher.lock().unwatch(&self.root_path)?;

        Ok(())
    }

    /// Whether the watcher is currently delivering events
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Check if the backend reported errors since creation
    pub fn missed_events(&self) -> bool {
        self.missed_events.load(Ordering::Relaxed)
    }

    /// Number of notifications sent to the channel
    pub fn forwarded(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }

    /// Translate a notify event into zero or more notifications
    pub(crate) fn translate(event: Event) -> Vec<Notification> {
        let Event { kind, paths, .. } = event;
        match kind {
            EventKind::Create(_) => paths.into_iter().map(Notification::Created).collect(),
            EventKind::Remove(_) => paths.into_iter().map(Notification::Removed).collect(),
            EventKind::Modify(ModifyKind::Name(mode)) => Self::translate_rename(mode, paths),
            EventKind::Modify(_) => paths.into_iter().map(Notification::Modified).collect(),
            _ => Vec::new(),
        }
    }

    fn translate_rename(mode: RenameMode, paths: Vec<PathBuf>) -> Vec<Notification> {
        match mode {
            RenameMode::From => paths.into_iter().map(Notification::Removed).collect(),
            RenameMode::To => paths.into_iter().map(Notification::MovedTo).collect(),
            RenameMode::Both => {
                let mut paths = paths.into_iter();
                let mut out = Vec::with_capacity(2);
                if let Some(from) = paths.next() {
                    out.push(Notification::Removed(from));
                }
                if let Some(to) = paths.next() {
                    out.push(Notification::MovedTo(to));
                }
                out
            }
            // Backend could not tell which side of the rename this is
            _ => paths
                .into_iter()
                .map(|p| {
                    if p.exists() {
                        Notification::MovedTo(p)
                    } else {
                        Notification::Removed(p)
                    }
                })
                .collect(),
        }
    }
}

impl Drop for FsWatcher {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!("Failed to stop watcher: {}", e);
        }
    }
}
