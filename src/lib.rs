//! # Filetrack - Live file fingerprint tracking
//!
//! A library for watching a directory tree and keeping an in-memory ledger
//! of every file's SHA-256 fingerprint, who changed it, and when.
//!
//! ## Overview
//!
//! Filetrack seeds its ledger from a full scan of the watched directory and
//! then follows create, modify and remove notifications from the operating
//! system. For each tracked file it keeps:
//! - The current content fingerprint (or none, if the file was unreadable)
//! - The current status: `created`, `modified`, `unchanged` or `deleted`
//! - The user and time of the last change
//! - An ordered history of every recorded state
//!
//! Notification backends fire several events for one logical write. A
//! modification is only recorded when the recomputed fingerprint differs
//! from the stored one, so duplicate events never grow the history.
//!
//! ## Architecture
//!
//! - **Path Filter**: decides which paths are eligible (hidden files,
//!   editor/partial suffixes and user glob patterns are rejected)
//! - **Fingerprints**: streaming SHA-256 over file content
//! - **Tracking Store**: the shared ledger, mutated under one lock
//! - **Change Detector**: applies notifications and tells observers
//! - **Directory Scanner**: parallel initial seeding
//! - **Watcher**: recursive OS notifications over a channel
//! - **Observers**: pluggable consumers such as the JSON-lines change log
//!   and the compressed backup store
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use filetrack::{MonitorBuilder, Notification};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let monitor = MonitorBuilder::new().root_path("./project").build()?;
//! monitor.seed()?;
//!
//! // Feed a notification by hand; `run` does this from the OS watcher
//! let path = monitor.root_path().join("notes.txt");
//! if let Some(event) = monitor.handle(&Notification::Modified(path)) {
//!     println!("{} {}", event.status(), event.path().display());
//! }
//!
//! for file in monitor.store().snapshot() {
//!     println!("{} {} {}", file.path.display(), file.status, file.short_hash());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Observers
//!
//! Anything that needs to react to changes implements [`ChangeObserver`]
//! and is registered on the builder. Observers run synchronously on the
//! consumer thread after the store has been updated; a failing observer is
//! logged and never stops tracking.
//!
//! ## Error Handling
//!
//! Setup operations return `Result<T, TrackError>`. Per-file problems met
//! while tracking (an unreadable file, a file that vanished before it could
//! be hashed) are absorbed: the file is recorded with no fingerprint or the
//! notification is dropped.
//!
//! ## Module Organization
//!
//! - [`filter`]: path eligibility rules
//! - [`fingerprint`]: SHA-256 content fingerprints
//! - [`store`]: the tracking ledger
//! - [`detector`]: notification handling
//! - [`scanner`]: initial directory scan
//! - [`watcher`]: OS notification source
//! - [`monitor`]: engine wiring and the run loop
//! - [`observer`], [`journal`], [`backup`]: change consumers
//! - [`types`]: common types and configuration
//! - [`error`]: error types and handling

// Public API modules
pub mod backup;
pub mod detector;
pub mod error;
pub mod filter;
pub mod fingerprint;
pub mod journal;
pub mod monitor;
pub mod observer;
pub mod scanner;
pub mod store;
pub mod types;
pub mod utils;
pub mod watcher;

// Re-export main types for convenience
pub use backup::BackupStore;
pub use detector::ChangeDetector;
pub use error::{Result, TrackError};
pub use filter::{PathFilter, DEFAULT_IGNORED_EXTENSIONS};
pub use fingerprint::fingerprint;
pub use journal::ChangeLog;
pub use monitor::{Monitor, MonitorBuilder, StopHandle};
pub use observer::ChangeObserver;
pub use scanner::{DirectoryScanner, ScanStats};
pub use store::TrackingStore;
pub use types::*;
pub use watcher::FsWatcher;
