//! Change observers
//!
//! Observers decouple the engine from whatever consumes its output. The
//! change detector calls every registered observer after each store
//! mutation, with the store lock already released, so an observer may take
//! a [`TrackingStore::snapshot`] freely.
//!
//! ```rust
//! use filetrack::observer::ChangeObserver;
//! use filetrack::store::TrackingStore;
//! use filetrack::types::ChangeEvent;
//! use filetrack::Result;
//!
//! struct PrintObserver;
//!
//! impl ChangeObserver for PrintObserver {
//!     fn on_change(&self, event: &ChangeEvent, _store: &TrackingStore) -> Result<()> {
//!         println!("{} {}", event.status(), event.path().display());
//!         Ok(())
//!     }
//! }
//! ```

use crate::error::Result;
use crate::store::TrackingStore;
use crate::types::ChangeEvent;

/// Receives engine output
///
/// Errors returned by an observer are logged by the caller and never stop
/// tracking.
pub trait ChangeObserver: Send + Sync {
    /// Called once after the initial directory scan has populated the store
    fn on_seeded(&self, _store: &TrackingStore) -> Result<()> {
        Ok(())
    }

    /// Called after every store mutation
    ///
    /// # Arguments
    ///
    /// * `event` - What changed
    /// * `store` - The store, for observers that need the full picture
    fn on_change(&self, event: &ChangeEvent, store: &TrackingStore) -> Result<()>;
}
