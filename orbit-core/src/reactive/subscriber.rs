//! Identity and subscription types for the reactive layer.
//!
//! Cells and subscribers are named by ids drawn from process-wide atomic
//! counters. Subscriptions are RAII guards: dropping one detaches its
//! callback from the cell it was attached to.

use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a reactive cell.
///
/// Signals and derived cells draw from a single shared counter, so an id
/// names a cell unambiguously regardless of its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellId(u64);

impl CellId {
    /// Allocate the next cell id.
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Unique identifier for a subscriber.
///
/// Each registered callback gets a fresh id. The id is what the detach
/// path uses to find and remove the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard for one active subscription.
///
/// Dropping the guard detaches the callback. Detachment is idempotent and
/// tolerates the cell having been dropped first.
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new<F>(detach: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// Detach immediately instead of waiting for drop.
    pub fn detach(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.detach.is_some())
            .finish()
    }
}
