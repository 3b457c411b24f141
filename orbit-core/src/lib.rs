//! Orbit Core
//!
//! This crate provides the core runtime for the Orbit scoped reactive
//! store library. It implements:
//!
//! - Reactive primitives (signals, derived cells, subscriptions)
//! - Scoped store declaration, instantiation, and registry resolution
//! - Hydration and prop-sync bridging between external values and cells
//! - A generated per-field accessor surface
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - `reactive`: the cell layer (signals, derived cells, subscriptions)
//! - `store`: scoped stores built on top of it (registry, providers,
//!   hydration/sync, accessors)
//!
//! # Example
//!
//! ```rust,ignore
//! use indexmap::IndexMap;
//! use orbit_core::store::{create_store, FieldInit, ProviderProps, Snapshot, Value};
//!
//! let mut fields = IndexMap::new();
//! fields.insert("count".to_owned(), FieldInit::Value(Value::from(0)));
//! let store = create_store("app", fields, None);
//!
//! let mut provider = store.provider();
//! let pass = provider.render(&Snapshot::new(), &ProviderProps::default());
//! let snapshot = pass.snapshot.clone();
//! pass.commit();
//!
//! let accessors = store.use_store(&snapshot, ());
//! accessors.setter("count").unwrap().set(Value::from(5));
//! assert_eq!(accessors.get("count"), Some(Value::from(5)));
//! ```

pub mod reactive;
pub mod store;
