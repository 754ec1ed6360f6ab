//! Engine wiring
//!
//! [`Monitor`] owns one tracking store and connects the scanner, the change
//! detector, the notification source and the configured observers. It is
//! built with [`MonitorBuilder`]:
//!
//! ```rust,no_run
//! use filetrack::MonitorBuilder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let monitor = MonitorBuilder::new()
//!     .root_path("./project")
//!     .ignore_patterns(vec!["*.log".to_string()])
//!     .history_limit(Some(100))
//!     .build()?;
//!
//! let stop = monitor.stop_handle();
//! // Hand `stop` to a signal handler, then block until it fires
//! monitor.run()?;
//! # Ok(())
//! # }
//! ```
//!
//! `run` seeds the store, starts the recursive watch, and processes
//! notifications one at a time until the stop handle is triggered. Store
//! mutations are therefore serialized through a single consumer.

use crate::backup::BackupStore;
use crate::detector::ChangeDetector;
use crate::error::{Result, TrackError};
use crate::filter::PathFilter;
use crate::journal::ChangeLog;
use crate::observer::ChangeObserver;
use crate::scanner::{DirectoryScanner, ScanStats};
use crate::store::TrackingStore;
use crate::types::{ChangeEvent, Notification, TrackerConfig};
use crate::utils;
use crate::watcher::FsWatcher;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How often the run loop checks for a stop request while idle
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Cooperative stop signal for [`Monitor::run`]
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    /// Ask the run loop to finish
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    /// Whether a stop was requested
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Builder for [`Monitor`]
pub struct MonitorBuilder {
    config: TrackerConfig,
    user: Option<String>,
    observers: Vec<Arc<dyn ChangeObserver>>,
}

impl Default for MonitorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorBuilder {
    /// Create a builder with default settings
    pub fn new() -> Self {
        Self::from_config(TrackerConfig::default())
    }

    /// Start from an existing configuration
    pub fn from_config(config: TrackerConfig) -> Self {
        Self {
            config,
            user: None,
            observers: Vec::new(),
        }
    }

    /// Set the directory to watch
    pub fn root_path(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.root_path = root.into();
        self
    }

    /// Replace the ignored suffix set
    pub fn ignored_extensions(mut self, extensions: Vec<String>) -> Self {
        self.config.ignored_extensions = extensions;
        self
    }

    /// Add glob patterns for files that are never tracked
    pub fn ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.config.ignore_patterns.extend(patterns);
        self
    }

    /// Cap the number of history entries kept per file
    pub fn history_limit(mut self, limit: Option<usize>) -> Self {
        self.config.history_limit = limit;
        self
    }

    /// Set symbolic link following behavior for the initial scan
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.config.follow_symlinks = follow;
        self
    }

    /// Set number of fingerprinting workers for the initial scan
    pub fn parallel_workers(mut self, workers: usize) -> Self {
        self.config.parallel_workers = workers;
        self
    }

    /// Write every change to a JSON-lines log
    pub fn log_file(mut self, path: Option<PathBuf>) -> Self {
        self.config.log_file = path;
        self
    }

    /// Keep compressed copies of every observed state
    pub fn backup_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.config.backup_dir = dir;
        self
    }

    /// Record changes under `user` instead of the process user
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Register an additional observer, called after the built-in ones
    pub fn observer(mut self, observer: Arc<dyn ChangeObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Validate the configuration and assemble the engine
    ///
    /// # Errors
    ///
    /// - [`TrackError::InvalidConfiguration`] for out-of-range settings
    /// - [`TrackError::InvalidRoot`] if the root is not an existing directory
    /// - [`TrackError::InvalidPattern`] for a bad ignore glob
    /// - [`TrackError::Io`] if the change log or backup store cannot be opened
    pub fn build(self) -> Result<Monitor> {
        let config = self.config;
        config.validate()?;

        if !config.root_path.is_dir() {
            return Err(TrackError::InvalidRoot(config.root_path.clone()));
        }
        let root_path = config.root_path.canonicalize()?;
        let user = self.user.unwrap_or_else(utils::current_user);

        let mut filter = PathFilter::new(config.ignored_extensions.iter().cloned())
            .with_ignore_patterns(&config.ignore_patterns)?;
        let mut builtin: Vec<Arc<dyn ChangeObserver>> = Vec::new();

        if let Some(log_path) = &config.log_file {
            let log = ChangeLog::open(log_path)?;
            filter = filter.with_excluded_file(log_path.canonicalize()?);
            info!("Recording changes to {}", log.path().display());
            builtin.push(Arc::new(log));
        }

        if let Some(backup_dir) = &config.backup_dir {
            let backup = BackupStore::open(backup_dir)?;
            filter = filter.with_excluded_dir(fs::canonicalize(backup.root())?);
            info!("Backing up file states to {}", backup.root().display());
            builtin.push(Arc::new(backup));
        }

        let store = Arc::new(TrackingStore::with_history_limit(config.history_limit));

        let scanner = DirectoryScanner::new(Arc::clone(&store), filter.clone())
            .with_user(user.clone())
            .with_follow_symlinks(config.follow_symlinks)
            .with_parallel_workers(config.parallel_workers);

        let mut detector = ChangeDetector::new(Arc::clone(&store), filter).with_user(user);
        for observer in builtin.into_iter().chain(self.observers) {
            detector.add_observer(observer);
        }

        debug!("Monitor configured for {}", root_path.display());

        Ok(Monitor {
            config,
            root_path,
            store,
            scanner,
            detector,
            stop: StopHandle::default(),
        })
    }
}

/// A configured tracking engine
pub struct Monitor {
    config: TrackerConfig,
    root_path: PathBuf,
    store: Arc<TrackingStore>,
    scanner: DirectoryScanner,
    detector: ChangeDetector,
    stop: StopHandle,
}

impl Monitor {
    /// Canonical path of the watched directory
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Configuration the engine was built from
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Shared handle to the tracking store
    pub fn store(&self) -> Arc<TrackingStore> {
        Arc::clone(&self.store)
    }

    /// Handle that makes [`Monitor::run`] return
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Populate the store from a full walk and notify observers
    pub fn seed(&self) -> Result<ScanStats> {
        let stats = self.scanner.seed(&self.root_path)?;
        self.detector.notify_seeded();
        Ok(stats)
    }

    /// Process a single notification
    ///
    /// Safe to call while [`Monitor::run`] is active; notifications are
    /// processed one at a time either way.
    pub fn handle(&self, notification: &Notification) -> Option<ChangeEvent> {
        self.detector.handle(notification)
    }

    /// Seed, watch, and process notifications until stopped
    ///
    /// # Errors
    ///
    /// Only setup failures are returned (invalid root, watch backend
    /// failure). Per-file problems during the loop are absorbed.
    pub fn run(&self) -> Result<()> {
        self.seed()?;

        let (sender, receiver) = mpsc::channel();
        let watcher = FsWatcher::new(&self.root_path, sender)?;
        watcher.watch()?;
        info!("Monitoring {}", self.root_path.display());

        self.process(&receiver);

        watcher.stop()?;
        if watcher.missed_events() {
            warn!("The watch backend reported errors; some changes may not have been recorded");
        }
        info!("Stopped monitoring after {} notifications", watcher.forwarded());
        Ok(())
    }

    fn process(&self, receiver: &Receiver<Notification>) {
        while !self.stop.is_stopped() {
            match receiver.recv_timeout(POLL_INTERVAL) {
                Ok(notification) => {
                    self.detector.handle(&notification);
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("Notification source disconnected");
                    break;
                }
            }
        }
    }
}
