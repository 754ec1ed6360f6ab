//! Change detection
//!
//! The [`ChangeDetector`] turns raw [`Notification`]s into ledger updates.
//! Notification backends routinely fire several events for one logical
//! write, so the detector only records a modification when the recomputed
//! fingerprint actually differs from the stored one.
//!
//! ## State machine (per path)
//!
//! ```text
//! Unseen --seed--> Unchanged --modify--> Modified --modify--> Modified ...
//! Unseen --create-> Created  --modify--> Modified
//! any tracked state --remove--> Deleted --create--> Created
//! live tracked state --rename onto--> Modified
//! Unseen or Deleted  --rename onto--> Created
//! ```
//!
//! A rename onto a tracked path is how many editors save, so it extends the
//! existing history instead of replacing it.
//!
//! Fingerprints are computed before the store lock is taken; the comparison
//! against `current_hash` and the mutation happen under one lock, so two
//! back-to-back notifications for the same path never lose an update.

use crate::filter::PathFilter;
use crate::fingerprint::fingerprint;
use crate::observer::ChangeObserver;
use crate::store::TrackingStore;
use crate::types::{ChangeEvent, FileStatus, Notification};
use crate::utils;
use chrono::Utc;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Applies notifications to the tracking store and reports the result
pub struct ChangeDetector {
    store: Arc<TrackingStore>,
    filter: PathFilter,
    user: String,
    observers: Vec<Arc<dyn ChangeObserver>>,
    /// Held for the whole of one notification, observers included
    processing: Mutex<()>,
}

impl ChangeDetector {
    /// Create a detector that records changes under the current user
    pub fn new(store: Arc<TrackingStore>, filter: PathFilter) -> Self {
        Self {
            store,
            filter,
            user: utils::current_user(),
            observers: Vec::new(),
            processing: Mutex::new(()),
        }
    }

    /// Record changes under `user` instead of the process user
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Register an observer; observers are called in registration order
    pub fn add_observer(&mut self, observer: Arc<dyn ChangeObserver>) {
        self.observers.push(observer);
    }

    /// The store this detector mutates
    pub fn store(&self) -> &Arc<TrackingStore> {
        &self.store
    }

    /// Process one notification to completion
    ///
    /// Returns the change that was recorded, or `None` when the notification
    /// was ignored (ineligible path, directory, untracked path, or unchanged
    /// fingerprint). Calls from several threads are processed one at a
    /// time.
    pub fn handle(&self, notification: &Notification) -> Option<ChangeEvent> {
        let _processing = self.processing.lock();
        let event = self.apply(notification)?;
        debug!("{} {}", event.status(), event.path().display());
        self.notify(&event);
        Some(event)
    }

    /// Tell observers that the initial scan finished
    pub fn notify_seeded(&self) {
        let _processing = self.processing.lock();
        for observer in &self.observers {
            if let Err(e) = observer.on_seeded(&self.store) {
                warn!("Observer failed after initial scan: {}", e);
            }
        }
    }

    fn apply(&self, notification: &Notification) -> Option<ChangeEvent> {
        let path = notification.path();
        if !self.filter.is_trackable(path) {
            trace!("Ignoring {}", path.display());
            return None;
        }

        match notification {
            Notification::Created(path) => self.create(path),
            Notification::Modified(path) => self.modify(path),
            Notification::Removed(path) => {
                self.store.record_deleted(path, &self.user, Utc::now())
            }
            Notification::MovedTo(path) => {
                let live = self
                    .store
                    .get(path)
                    .is_some_and(|file| file.status != FileStatus::Deleted);
                if live {
                    self.modify(path)
                } else {
                    self.create(path)
                }
            }
        }
    }

    fn create(&self, path: &Path) -> Option<ChangeEvent> {
        if path.is_dir() {
            return None;
        }
        let hash = fingerprint(path);
        Some(
            self.store
                .record_created(path.to_path_buf(), hash, &self.user, Utc::now()),
        )
    }

    fn modify(&self, path: &Path) -> Option<ChangeEvent> {
        if path.is_dir() || !self.store.contains(path) {
            return None;
        }
        let hash = fingerprint(path);
        self.store
            .record_modified(path, hash, &self.user, Utc::now())
    }

    fn notify(&self, event: &ChangeEvent) {
        for observer in &self.observers {
            if let Err(e) = observer.on_change(event, &self.store) {
                warn!("Observer failed for {}: {}", event.path().display(), e);
            }
        }
    }
}
