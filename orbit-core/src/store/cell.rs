//! Cell handles.
//!
//! A [`Cell`] is the store layer's uniform view of one reactive slot. It
//! hides which primitive sits underneath (a writable [`Signal`] or a
//! read-only [`Derived`]) and applies the function-value codec on both
//! sides, so function-valued fields behave exactly like plain ones.

use thiserror::Error;

use super::codec::{unwrap, wrap, Plain};
use super::value::Value;
use crate::reactive::{CellId, Derived, Signal, Subscription};

/// Error from the raw cell write path.
///
/// The generated accessor surface never exposes a setter for a read-only
/// field, so this error is only reachable through direct [`Cell`] use.
#[derive(Debug, Error)]
pub enum CellError {
    /// The cell has no write capability.
    #[error("cell {0:?} is read-only")]
    ReadOnly(CellId),
}

/// Handle to one reactive cell holding a field value.
///
/// Clones share the underlying cell. Writability is a property of the
/// cell's kind, fixed at construction.
#[derive(Clone)]
pub struct Cell {
    inner: CellInner,
}

#[derive(Clone)]
enum CellInner {
    Writable(Signal<Plain>),
    ReadOnly(Derived<Plain>),
}

impl Cell {
    /// Create a writable cell seeded with `initial`.
    pub fn new(initial: Value) -> Self {
        Self {
            inner: CellInner::Writable(Signal::new(wrap(initial))),
        }
    }

    /// Create a read-only cell recomputed from `sources`.
    ///
    /// The cell subscribes to every source, so writes to any of them
    /// invalidate it and notify its own subscribers.
    pub fn derived<F>(sources: &[Cell], compute: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        let derived = Derived::new(move || wrap(compute()));
        for source in sources {
            derived.track(source.subscribe(derived.invalidator()));
        }
        Self {
            inner: CellInner::ReadOnly(derived),
        }
    }

    /// Get the cell's unique ID.
    pub fn id(&self) -> CellId {
        match &self.inner {
            CellInner::Writable(signal) => signal.id(),
            CellInner::ReadOnly(derived) => derived.id(),
        }
    }

    /// Check whether the cell accepts writes.
    pub fn is_writable(&self) -> bool {
        matches!(self.inner, CellInner::Writable(_))
    }

    /// Read the current value.
    pub fn read(&self) -> Value {
        match &self.inner {
            CellInner::Writable(signal) => unwrap(signal.get()),
            CellInner::ReadOnly(derived) => unwrap(derived.get()),
        }
    }

    /// Write a new value, notifying subscribers.
    pub fn write(&self, value: Value) -> Result<(), CellError> {
        match &self.inner {
            CellInner::Writable(signal) => {
                signal.set(wrap(value));
                Ok(())
            }
            CellInner::ReadOnly(derived) => Err(CellError::ReadOnly(derived.id())),
        }
    }

    /// Register a change callback; the guard detaches it on drop.
    pub fn subscribe<F>(&self, notify: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        match &self.inner {
            CellInner::Writable(signal) => signal.subscribe(notify),
            CellInner::ReadOnly(derived) => derived.subscribe(notify),
        }
    }
}

impl std::fmt::Debug for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cell")
            .field("id", &self.id())
            .field("writable", &self.is_writable())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Arc;

    #[test]
    fn writable_cell_round_trips_values() {
        let cell = Cell::new(Value::from(1));
        assert!(cell.is_writable());
        assert_eq!(cell.read(), Value::from(1));

        cell.write(Value::from(5)).unwrap();
        assert_eq!(cell.read(), Value::from(5));
    }

    #[test]
    fn function_values_pass_through_untouched() {
        let f = Value::func(|args| args.first().cloned().unwrap_or(Value::Null));
        let original = f.as_func().unwrap().clone();

        let cell = Cell::new(f);
        let read = cell.read();

        // The caller sees the function itself, never the codec wrapper.
        assert!(Arc::ptr_eq(&original, read.as_func().unwrap()));

        let f2 = Value::func(|_| Value::Int(9));
        let replacement = f2.as_func().unwrap().clone();
        cell.write(f2).unwrap();
        assert!(Arc::ptr_eq(&replacement, cell.read().as_func().unwrap()));
    }

    #[test]
    fn derived_cell_rejects_writes() {
        let base = Cell::new(Value::from(2));
        let base_clone = base.clone();
        let doubled = Cell::derived(std::slice::from_ref(&base), move || {
            Value::Int(base_clone.read().as_int().unwrap_or(0) * 2)
        });

        assert!(!doubled.is_writable());
        assert_eq!(doubled.read(), Value::from(4));
        assert!(matches!(
            doubled.write(Value::from(0)),
            Err(CellError::ReadOnly(_))
        ));
    }

    #[test]
    fn derived_cell_follows_its_sources() {
        let base = Cell::new(Value::from(3));
        let base_clone = base.clone();
        let plus_one = Cell::derived(std::slice::from_ref(&base), move || {
            Value::Int(base_clone.read().as_int().unwrap_or(0) + 1)
        });

        assert_eq!(plus_one.read(), Value::from(4));

        base.write(Value::from(10)).unwrap();
        assert_eq!(plus_one.read(), Value::from(11));
    }

    #[test]
    fn subscribers_fire_on_write() {
        let cell = Cell::new(Value::from(0));
        let count = Arc::new(AtomicI32::new(0));
        let count_clone = count.clone();

        let _sub = cell.subscribe(move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        cell.write(Value::from(1)).unwrap();
        cell.write(Value::from(2)).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
