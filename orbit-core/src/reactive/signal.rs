//! Signal Implementation
//!
//! A Signal is the writable reactive primitive. It holds a value and
//! notifies registered subscribers when the value changes.
//!
//! # How Signals Work
//!
//! 1. Callers read the current value with [`Signal::get`].
//!
//! 2. [`Signal::set`] replaces the value and invokes every subscriber
//!    callback after releasing the value lock.
//!
//! 3. Subscribers attach through [`Signal::subscribe`], which returns an
//!    RAII guard; dropping the guard detaches the callback.
//!
//! # Thread Safety
//!
//! The value sits behind a `parking_lot::RwLock`, so reads never block
//! each other and there is no lock poisoning to handle. Clones share
//! state through `Arc`.

use std::sync::Arc;

use parking_lot::RwLock;
use smallvec::SmallVec;

use super::subscriber::{CellId, SubscriberId, Subscription};

type Notifier = (SubscriberId, Arc<dyn Fn() + Send + Sync>);

/// A writable reactive cell holding a value of type `T`.
///
/// # Example
///
/// ```rust,ignore
/// let count = Signal::new(0);
///
/// let value = count.get();
/// count.set(5); // subscribers are notified
/// ```
pub struct Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Unique identifier for this signal.
    id: CellId,

    /// The current value.
    value: Arc<RwLock<T>>,

    /// Subscriber callbacks, invoked on every set. Most cells have zero
    /// or one subscriber, hence the inline capacity.
    notifiers: Arc<RwLock<SmallVec<[Notifier; 2]>>>,
}

impl<T> Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            id: CellId::next(),
            value: Arc::new(RwLock::new(value)),
            notifiers: Arc::new(RwLock::new(SmallVec::new())),
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> CellId {
        self.id
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Set a new value and notify subscribers.
    pub fn set(&self, value: T) {
        {
            let mut guard = self.value.write();
            *guard = value;
        }
        self.notify();
    }

    /// Update the value using a function of the current value.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let new_value = {
            let guard = self.value.read();
            f(&guard)
        };
        self.set(new_value);
    }

    /// Register a notification callback.
    ///
    /// The callback is invoked after every [`Signal::set`]. The returned
    /// guard detaches it on drop.
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

    /// Get the number of attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.notifiers.read().len()
    }

    /// Invoke every subscriber callback.
    ///
    /// Callbacks run outside the notifier lock so they may subscribe or
    /// detach without deadlocking.
    fn notify(&self) {
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
}

impl<T> Clone for Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            value: Arc::clone(&self.value),
            notifiers: Arc::clone(&self.notifiers),
        }
    }
}

impl<T> std::fmt::Debug for Signal<T>
where
    T: Clone + Send + Sync + std::fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id)
            .field("value", &self.get())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[test]
    fn signal_get_and_set() {
        let signal = Signal::new(0);
        assert_eq!(signal.get(), 0);

        signal.set(42);
        assert_eq!(signal.get(), 42);
    }

    #[test]
    fn signal_update() {
        let signal = Signal::new(10);
        signal.update(|v| v + 5);
        assert_eq!(signal.get(), 15);
    }

    #[test]
    fn signal_notifies_subscribers() {
        let signal = Signal::new(0);
        let call_count = Arc::new(AtomicI32::new(0));
        let call_count_clone = call_count.clone();

        let _sub = signal.subscribe(move || {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(call_count.load(Ordering::SeqCst), 0);

        signal.set(1);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);

        signal.set(2);
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dropped_subscription_stops_notifications() {
        let signal = Signal::new(0);
        let call_count = Arc::new(AtomicI32::new(0));
        let call_count_clone = call_count.clone();

        let sub = signal.subscribe(move || {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        signal.set(1);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);

        drop(sub);
        signal.set(2);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn signal_clone_shares_state() {
        let signal1 = Signal::new(0);
        let signal2 = signal1.clone();

        signal1.set(42);
        assert_eq!(signal2.get(), 42);

        signal2.set(100);
        assert_eq!(signal1.get(), 100);
        assert_eq!(signal1.id(), signal2.id());
    }

    #[test]
    fn subscriber_can_resubscribe_during_notification() {
        let signal = Signal::new(0);
        let signal_clone = signal.clone();
        let count = Arc::new(AtomicI32::new(0));
        let count_clone = count.clone();

        // Reading from inside the callback must not deadlock.
        let _sub = signal.subscribe(move || {
            count_clone.store(signal_clone.get(), Ordering::SeqCst);
        });

        signal.set(7);
        assert_eq!(count.load(Ordering::SeqCst), 7);
    }
}
