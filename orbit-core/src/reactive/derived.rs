//! Derived Cell Implementation
//!
//! A Derived is a read-only cell whose value is recomputed from other
//! cells. Sources are wired explicitly: the owner subscribes the derived
//! cell's invalidator to each source it reads from.
//!
//! # How Derived Cells Work
//!
//! 1. On first access, the compute function runs and the result is cached.
//!
//! 2. When a source changes, the invalidator marks the cell dirty and
//!    forwards the notification to the cell's own subscribers.
//!
//! 3. The next access recomputes; clean accesses return the cache.
//!
//! This push-invalidate / pull-recompute split means a derived cell that
//! nobody reads never recomputes, no matter how often its sources change.
//!
//! # Why Explicit Sources
//!
//! Ambient dependency tracking needs a thread-local context stack and a
//! global runtime registry. The store layer always knows its sources when
//! it builds a derived field, so the explicit wiring keeps the primitive
//! self-contained.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use smallvec::SmallVec;

use super::subscriber::{CellId, SubscriberId, Subscription};

type Notifier = (SubscriberId, Arc<dyn Fn() + Send + Sync>);

/// A read-only cell recomputed lazily from explicit sources.
///
/// # Example
///
/// ```rust,ignore
/// let base = Signal::new(2);
/// let base_clone = base.clone();
/// let doubled = Derived::new(move || base_clone.get() * 2);
/// doubled.track(base.subscribe(doubled.invalidator()));
///
/// assert_eq!(doubled.get(), 4);
/// ```
pub struct Derived<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Unique identifier for this cell.
    id: CellId,

    /// The computation producing the value.
    compute: Arc<dyn Fn() -> T + Send + Sync>,

    /// Cached value (`None` until first computed).
    value: Arc<RwLock<Option<T>>>,

    /// Whether the cache is stale.
    dirty: Arc<AtomicBool>,

    /// Subscriber callbacks, invoked on invalidation.
    notifiers: Arc<RwLock<SmallVec<[Notifier; 2]>>>,

    /// Source subscriptions kept alive for the cell's lifetime.
    sources: Arc<RwLock<Vec<Subscription>>>,
}

impl<T> Derived<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new derived cell with the given compute function.
    ///
    /// The computation does not run until the first access.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            id: CellId::next(),
            compute: Arc::new(compute),
            value: Arc::new(RwLock::new(None)),
            dirty: Arc::new(AtomicBool::new(true)),
            notifiers: Arc::new(RwLock::new(SmallVec::new())),
            sources: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Get the cell's unique ID.
    pub fn id(&self) -> CellId {
        self.id
    }

    /// Get the current value, recomputing if the cache is stale.
    pub fn get(&self) -> T {
        if !self.dirty.load(Ordering::SeqCst) {
            if let Some(value) = self.value.read().clone() {
                return value;
            }
        }

        // Compute without holding any of our own locks: the computation
        // reads source cells, which take their own locks.
        let value = (self.compute)();
        *self.value.write() = Some(value.clone());
        self.dirty.store(false, Ordering::SeqCst);
        value
    }

    /// Mark the cache stale and notify subscribers.
    pub fn invalidate(&self) {
        self.dirty.store(true, Ordering::SeqCst);
        let callbacks: Vec<Arc<dyn Fn() + Send + Sync>> = self
            .notifiers
            .read()
            .iter()
            .map(|(_, notify)| Arc::clone(notify))
            .collect();
        for notify in callbacks {
            notify();
        }
    }

    /// Build a callback equivalent to [`Derived::invalidate`] that holds
    /// only weak references.
    ///
    /// Sources store this callback in their subscriber lists; weak
    /// references keep a source from pinning the derived cell alive.
    pub fn invalidator(&self) -> impl Fn() + Send + Sync + 'static {
        let dirty = Arc::downgrade(&self.dirty);
        let notifiers = Arc::downgrade(&self.notifiers);
        move || {
            if let Some(dirty) = dirty.upgrade() {
                dirty.store(true, Ordering::SeqCst);
            }
            if let Some(notifiers) = notifiers.upgrade() {
                let callbacks: Vec<Arc<dyn Fn() + Send + Sync>> = notifiers
                    .read()
                    .iter()
                    .map(|(_, notify)| Arc::clone(notify))
                    .collect();
                for notify in callbacks {
                    notify();
                }
            }
        }
    }

    /// Retain a source subscription for this cell's lifetime.
    pub fn track(&self, subscription: Subscription) {
        self.sources.write().push(subscription);
    }

    /// Register a notification callback, invoked on invalidation.
    pub fn subscribe<F>(&self, notify: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let subscriber_id = SubscriberId::new();
        self.notifiers
            .write()
            .push((subscriber_id, Arc::new(notify)));

        let notifiers = Arc::downgrade(&self.notifiers);
        Subscription::new(move || {
            if let Some(notifiers) = notifiers.upgrade() {
                notifiers.write().retain(|(id, _)| *id != subscriber_id);
            }
        })
    }

    /// Check whether the cache holds a value.
    pub fn has_value(&self) -> bool {
        self.value.read().is_some()
    }

    /// Check whether the next access will recompute.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }
}

impl<T> Clone for Derived<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            compute: Arc::clone(&self.compute),
            value: Arc::clone(&self.value),
            dirty: Arc::clone(&self.dirty),
            notifiers: Arc::clone(&self.notifiers),
            sources: Arc::clone(&self.sources),
        }
    }
}

impl<T> std::fmt::Debug for Derived<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Derived")
            .field("id", &self.id)
            .field("dirty", &self.is_dirty())
            .field("has_value", &self.has_value())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Signal;
    use std::sync::atomic::AtomicI32;

    #[test]
    fn derived_computes_on_first_access() {
        let call_count = Arc::new(AtomicI32::new(0));
        let call_count_clone = call_count.clone();

        let derived = Derived::new(move || {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
            42
        });

        assert!(!derived.has_value());
        assert_eq!(call_count.load(Ordering::SeqCst), 0);

        assert_eq!(derived.get(), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert!(derived.has_value());
    }

    #[test]
    fn derived_caches_until_invalidated() {
        let call_count = Arc::new(AtomicI32::new(0));
        let call_count_clone = call_count.clone();

        let derived = Derived::new(move || {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
            42
        });

        assert_eq!(derived.get(), 42);
        assert_eq!(derived.get(), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);

        derived.invalidate();
        assert_eq!(derived.get(), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn derived_tracks_signal_source() {
        let base = Signal::new(5);
        let base_clone = base.clone();
        let derived = Derived::new(move || base_clone.get() * 2);
        derived.track(base.subscribe(derived.invalidator()));

        assert_eq!(derived.get(), 10);

        base.set(7);
        assert!(derived.is_dirty());
        assert_eq!(derived.get(), 14);
    }

    #[test]
    fn derived_forwards_invalidation_to_subscribers() {
        let base = Signal::new(0);
        let base_clone = base.clone();
        let derived = Derived::new(move || base_clone.get() + 1);
        derived.track(base.subscribe(derived.invalidator()));

        let notified = Arc::new(AtomicI32::new(0));
        let notified_clone = notified.clone();
        let _sub = derived.subscribe(move || {
            notified_clone.fetch_add(1, Ordering::SeqCst);
        });

        base.set(1);
        assert_eq!(notified.load(Ordering::SeqCst), 1);

        base.set(2);
        assert_eq!(notified.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn invalidator_survives_derived_drop() {
        let base = Signal::new(0);

        let _sub = {
            let base_clone = base.clone();
            let derived = Derived::new(move || base_clone.get());
            let sub = base.subscribe(derived.invalidator());
            assert_eq!(derived.get(), 0);
            sub
        };

        // The derived cell is gone but its invalidator is still attached;
        // notifying through the stale weak reference must be a no-op.
        base.set(1);
    }
}
