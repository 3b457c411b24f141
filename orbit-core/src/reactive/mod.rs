//! Reactive Primitives
//!
//! This module implements the cell layer the store subsystem is built on:
//! signals, derived cells, and subscriptions.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A [`Signal`] is a container for mutable state. Setting a signal's value
//! notifies every attached subscriber.
//!
//! ## Derived cells
//!
//! A [`Derived`] is a read-only value recomputed from other cells. Sources
//! are wired explicitly: whoever builds the derived cell subscribes its
//! invalidator to each source. Invalidation is pushed eagerly; the value
//! itself is recomputed lazily on the next read.
//!
//! ## Subscriptions
//!
//! [`Subscription`] is an RAII guard returned by `subscribe`; dropping it
//! detaches the callback. Cells compose: a derived cell keeps its source
//! subscriptions alive for exactly as long as it lives.

mod derived;
mod signal;
mod subscriber;

pub use derived::Derived;
pub use signal::Signal;
pub use subscriber::{CellId, SubscriberId, Subscription};
