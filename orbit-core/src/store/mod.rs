//! Scoped Stores
//!
//! This module implements the scoped-store layer: declare a bundle of
//! named reactive fields once, mount any number of independent instances
//! of it through providers, and resolve the nearest enclosing instance
//! from anywhere below.
//!
//! # Concepts
//!
//! ## Stores and instances
//!
//! [`create_store`] declares a store's fields. Each [`Provider`] mount
//! builds (or adopts) a concrete [`StoreInstance`]; instances of the same
//! name are fully independent.
//!
//! ## Scope resolution
//!
//! Providers register their instance into an immutable [`Snapshot`]
//! inherited from their ancestors, under `(name, "provider")` and
//! optionally under an explicit `(name, scope)` key. Lookups try the
//! exact scope first, then the wildcard bucket.
//!
//! ## Hydration and sync
//!
//! External values seed a fresh instance exactly once (hydration, before
//! the first paint) and then track it continuously (sync, applied in the
//! commit phase after each render).
//!
//! ## Accessors
//!
//! [`Store::use_store`] resolves the active instance and builds get /
//! setter / use-binding entries per field, with function-valued fields
//! passing through the codec transparently.

mod accessor;
mod cell;
mod codec;
mod instance;
mod provider;
mod registry;
mod value;

pub use accessor::{create_store, Accessors, Binding, BoundStore, ResolveOptions, Setter, Store};
pub use cell::{Cell, CellError};
pub use instance::{ExtendFn, FieldInit, StoreDef, StoreInstance};
pub use provider::{InitFn, Provider, ProviderProps, RenderPass};
pub use registry::{ScopeKey, Snapshot, PROVIDER_SCOPE};
pub use value::{FieldFn, Value};
