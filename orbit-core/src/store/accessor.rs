//! Typed Accessor Surface
//!
//! [`create_store`] declares a named store once. The returned [`Store`]
//! hands out providers and, at any point below them, resolves the active
//! instance and builds a per-field accessor bundle:
//!
//! - `get` for every field,
//! - `setter` and `use_field` for writable fields only (non-writable
//!   fields simply have no entry, rather than an entry that fails),
//! - `get_atom` / `setter_atom` / `use_atom` addressing cells by identity
//!   instead of by name,
//! - [`Store::bind`] for pre-applied default options.
//!
//! Resolution never panics: a missed lookup warns (when asked to) and
//! falls back to the store's module-wide default instance.

use std::sync::Arc;

use indexmap::IndexMap;

use super::cell::Cell;
use super::instance::{ExtendFn, FieldInit, StoreDef, StoreInstance};
use super::provider::Provider;
use super::registry::{Snapshot, PROVIDER_SCOPE};
use super::value::Value;
use crate::reactive::{CellId, Subscription};

/// Name given to stores declared with an empty name.
const DEFAULT_NAME: &str = "store";

/// Declare a named store.
///
/// The name is a registry key; an empty name falls back to `"store"`.
/// Construction also builds the default instance that store-less lookups
/// resolve to.
pub fn create_store(
    name: &str,
    fields: IndexMap<String, FieldInit>,
    extend: Option<ExtendFn>,
) -> Store {
    let name = if name.is_empty() { DEFAULT_NAME } else { name };
    let def = Arc::new(StoreDef::new(name, fields, extend));
    let default_instance = def.instantiate();
    Store {
        def,
        default_instance,
    }
}

/// A declared store: its field layout plus the module-wide default
/// instance used when no provider is in scope.
pub struct Store {
    def: Arc<StoreDef>,
    default_instance: Arc<StoreInstance>,
}

impl Store {
    pub fn name(&self) -> &str {
        self.def.name()
    }

    /// The store descriptor's cell map: the default instance's cells,
    /// keyed by field name in declaration order.
    pub fn atom(&self) -> IndexMap<String, Cell> {
        self.default_instance
            .cells()
            .map(|(key, cell)| (key.to_owned(), cell.clone()))
            .collect()
    }

    /// The instance store-less lookups fall back to.
    pub fn default_instance(&self) -> &Arc<StoreInstance> {
        &self.default_instance
    }

    /// Create a provider node for this store.
    pub fn provider(&self) -> Provider {
        Provider::new(self.def.clone())
    }

    /// Registry resolution only.
    ///
    /// An explicit instance in the options short-circuits the lookup.
    /// Returns `None` on a miss (after an advisory diagnostic when the
    /// options ask for one); never panics.
    pub fn resolve(
        &self,
        snapshot: &Snapshot,
        options: impl Into<ResolveOptions>,
    ) -> Option<Arc<StoreInstance>> {
        let options = options.into();
        if let Some(instance) = options.store {
            return Some(instance);
        }
        let scope = options.scope.as_deref().unwrap_or(PROVIDER_SCOPE);
        snapshot.resolve_or_warn(self.def.name(), scope, options.warn)
    }

    /// Resolve the active instance and build its accessor bundle, falling
    /// back to the default instance when nothing is registered.
    pub fn use_store(
        &self,
        snapshot: &Snapshot,
        options: impl Into<ResolveOptions>,
    ) -> Accessors {
        let instance = self
            .resolve(snapshot, options)
            .unwrap_or_else(|| self.default_instance.clone());
        Accessors::bind(instance)
    }

    /// Pre-apply default options; per-call options override field-wise.
    pub fn bind(&self, defaults: ResolveOptions) -> BoundStore<'_> {
        BoundStore {
            store: self,
            defaults,
        }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.def.name())
            .field("fields", &self.default_instance.len())
            .finish()
    }
}

/// Options for resolving the active instance.
#[derive(Clone, Default)]
pub struct ResolveOptions {
    /// Scope label to look up; defaults to the wildcard.
    pub scope: Option<String>,
    /// Explicitly chosen instance; skips the registry entirely.
    pub store: Option<Arc<StoreInstance>>,
    /// Emit a diagnostic when the registry lookup misses.
    pub warn: bool,
}

impl ResolveOptions {
    /// Look up under an explicit scope.
    pub fn scoped(scope: impl Into<String>) -> Self {
        Self {
            scope: Some(scope.into()),
            ..Self::default()
        }
    }

    /// Target an explicit instance.
    pub fn with_store(instance: Arc<StoreInstance>) -> Self {
        Self {
            store: Some(instance),
            ..Self::default()
        }
    }

    /// Request a diagnostic on a missed lookup.
    pub fn warn_on_miss(mut self) -> Self {
        self.warn = true;
        self
    }

    /// Field-wise fallback onto `defaults` for anything not set here.
    fn or(self, defaults: &ResolveOptions) -> ResolveOptions {
        ResolveOptions {
            scope: self.scope.or_else(|| defaults.scope.clone()),
            store: self.store.or_else(|| defaults.store.clone()),
            warn: self.warn || defaults.warn,
        }
    }
}

impl From<&str> for ResolveOptions {
    fn from(scope: &str) -> Self {
        ResolveOptions::scoped(scope)
    }
}

impl From<()> for ResolveOptions {
    fn from(_: ()) -> Self {
        ResolveOptions::default()
    }
}

/// A store with pre-configured resolution defaults.
pub struct BoundStore<'a> {
    store: &'a Store,
    defaults: ResolveOptions,
}

impl BoundStore<'_> {
    pub fn resolve(
        &self,
        snapshot: &Snapshot,
        options: impl Into<ResolveOptions>,
    ) -> Option<Arc<StoreInstance>> {
        self.store.resolve(snapshot, options.into().or(&self.defaults))
    }

    pub fn use_store(
        &self,
        snapshot: &Snapshot,
        options: impl Into<ResolveOptions>,
    ) -> Accessors {
        self.store.use_store(snapshot, options.into().or(&self.defaults))
    }
}

/// Bound setter for one writable field.
#[derive(Clone)]
pub struct Setter {
    cell: Cell,
}

impl Setter {
    /// Write a new value into the field's cell.
    pub fn set(&self, value: Value) {
        // Setters exist only for writable cells.
        let _ = self.cell.write(value);
    }
}

/// `[value, setter]` pair bound to one writable field, with subscription
/// semantics delegated to the underlying cell.
pub struct Binding {
    cell: Cell,
}

impl Binding {
    /// Current value of the field.
    pub fn value(&self) -> Value {
        self.cell.read()
    }

    /// Write a new value into the field.
    pub fn set(&self, value: Value) {
        let _ = self.cell.write(value);
    }

    /// Re-evaluate on change: the callback fires whenever the cell's
    /// value is written.
    pub fn subscribe<F>(&self, notify: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.cell.subscribe(notify)
    }

    /// The underlying cell, for identity-based interop.
    pub fn cell(&self) -> &Cell {
        &self.cell
    }
}

struct FieldAccessor {
    cell: Cell,
    writable: bool,
}

/// Per-field accessor bundle resolved against one instance.
///
/// Built by a single keyed loop over the instance's fields; every entry
/// delegates to that instance's cell.
pub struct Accessors {
    instance: Arc<StoreInstance>,
    fields: IndexMap<String, FieldAccessor>,
}

impl Accessors {
    fn bind(instance: Arc<StoreInstance>) -> Self {
        let fields = instance
            .cells()
            .map(|(key, cell)| {
                (
                    key.to_owned(),
                    FieldAccessor {
                        cell: cell.clone(),
                        writable: cell.is_writable(),
                    },
                )
            })
            .collect();
        Self { instance, fields }
    }

    /// The resolved instance.
    pub fn store(&self) -> &Arc<StoreInstance> {
        &self.instance
    }

    /// Current value of `field`, available for every field.
    pub fn get(&self, field: &str) -> Option<Value> {
        self.fields.get(field).map(|accessor| accessor.cell.read())
    }

    /// Setter for `field`; absent for non-writable or unknown fields.
    pub fn setter(&self, field: &str) -> Option<Setter> {
        self.fields
            .get(field)
            .filter(|accessor| accessor.writable)
            .map(|accessor| Setter {
                cell: accessor.cell.clone(),
            })
    }

    /// Value/setter pair for `field`; absent for non-writable or unknown
    /// fields.
    pub fn use_field(&self, field: &str) -> Option<Binding> {
        self.fields
            .get(field)
            .filter(|accessor| accessor.writable)
            .map(|accessor| Binding {
                cell: accessor.cell.clone(),
            })
    }

    /// Current value of the field whose cell has identity `id`.
    pub fn get_atom(&self, id: CellId) -> Option<Value> {
        self.instance.cell_by_id(id).map(Cell::read)
    }

    /// Setter addressed by cell identity; absent for non-writable cells.
    pub fn setter_atom(&self, id: CellId) -> Option<Setter> {
        self.instance
            .cell_by_id(id)
            .filter(|cell| cell.is_writable())
            .map(|cell| Setter { cell: cell.clone() })
    }

    /// Value/setter pair addressed by cell identity.
    pub fn use_atom(&self, id: CellId) -> Option<Binding> {
        self.instance
            .cell_by_id(id)
            .filter(|cell| cell.is_writable())
            .map(|cell| Binding { cell: cell.clone() })
    }
}
