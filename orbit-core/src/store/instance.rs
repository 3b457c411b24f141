//! Store Instances
//!
//! A store instance is a named bundle of cells with per-field bookkeeping:
//! writability (fixed at construction), whether the field is a base field
//! or an extension field, and a hydration latch.
//!
//! Instances are identified by `Arc` allocation, not by name; the name is
//! only a registry key. Two providers of the same store name own two
//! independent instances.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::warn;

use super::cell::Cell;
use super::value::Value;
use crate::reactive::CellId;

/// Declares how one field obtains its cell.
///
/// The tag makes the "is this already a cell?" question explicit at the
/// call site; there is no shape probing and no way for a value to be
/// mistaken for a cell.
#[derive(Clone)]
pub enum FieldInit {
    /// A raw value; the store creates and owns a writable cell for it.
    Value(Value),
    /// A ready-made cell, referenced as-is and never re-wrapped.
    Cell(Cell),
}

/// Derivation hook producing extension cells from the base cell map.
///
/// Invoked once per instance with the base fields, before any extension
/// entries exist. Returned fields merge into the instance last-write-wins.
pub type ExtendFn =
    Arc<dyn Fn(&IndexMap<String, Cell>) -> IndexMap<String, Cell> + Send + Sync>;

/// Immutable declaration a store was created from: its name, field inits,
/// and optional extension hook. Every provider mount instantiates from
/// the same declaration.
pub struct StoreDef {
    name: String,
    fields: IndexMap<String, FieldInit>,
    extend: Option<ExtendFn>,
}

impl StoreDef {
    pub fn new(
        name: impl Into<String>,
        fields: IndexMap<String, FieldInit>,
        extend: Option<ExtendFn>,
    ) -> Self {
        Self {
            name: name.into(),
            fields,
            extend,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build a fresh instance from this declaration.
    pub fn instantiate(&self) -> Arc<StoreInstance> {
        StoreInstance::build(&self.name, &self.fields, self.extend.as_ref())
    }
}

struct FieldSlot {
    cell: Cell,
    /// Fixed at construction; never re-derived.
    writable: bool,
    /// Base fields hydrate and sync; extension fields do neither.
    base: bool,
    /// Set the first time the field is hydrated.
    hydrated: AtomicBool,
}

/// One live store: a set of cells plus bookkeeping.
pub struct StoreInstance {
    name: String,
    fields: IndexMap<String, FieldSlot>,
}

impl StoreInstance {
    /// Construct an instance from field declarations.
    ///
    /// `FieldInit::Cell` entries pass through as-is; `FieldInit::Value`
    /// entries get a fresh writable cell. The extension hook runs against
    /// the base cell map and its fields merge in afterward; a key
    /// collision keeps the extension's cell and emits a diagnostic.
    pub(crate) fn build(
        name: &str,
        inits: &IndexMap<String, FieldInit>,
        extend: Option<&ExtendFn>,
    ) -> Arc<Self> {
        let mut fields: IndexMap<String, FieldSlot> = IndexMap::with_capacity(inits.len());

        for (key, init) in inits {
            let cell = match init {
                FieldInit::Value(value) => Cell::new(value.clone()),
                FieldInit::Cell(cell) => cell.clone(),
            };
            let writable = cell.is_writable();
            fields.insert(
                key.clone(),
                FieldSlot {
                    cell,
                    writable,
                    base: true,
                    hydrated: AtomicBool::new(false),
                },
            );
        }

        if let Some(extend) = extend {
            let base: IndexMap<String, Cell> = fields
                .iter()
                .map(|(key, slot)| (key.clone(), slot.cell.clone()))
                .collect();
            for (key, cell) in extend(&base) {
                if fields.contains_key(&key) {
                    warn!(store = name, field = %key, "extension field overrides base field");
                }
                let writable = cell.is_writable();
                fields.insert(
                    key,
                    FieldSlot {
                        cell,
                        writable,
                        base: false,
                        hydrated: AtomicBool::new(false),
                    },
                );
            }
        }

        Arc::new(Self {
            name: name.to_owned(),
            fields,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the cell backing `field`.
    pub fn cell(&self, field: &str) -> Option<&Cell> {
        self.fields.get(field).map(|slot| &slot.cell)
    }

    /// Check whether `field` accepts writes. Unknown fields are not
    /// writable.
    pub fn writable(&self, field: &str) -> bool {
        self.fields.get(field).is_some_and(|slot| slot.writable)
    }

    /// Iterate the fields in declaration order.
    pub fn cells(&self) -> impl Iterator<Item = (&str, &Cell)> + '_ {
        self.fields.iter().map(|(key, slot)| (key.as_str(), &slot.cell))
    }

    /// Find a cell by identity rather than by field name.
    pub fn cell_by_id(&self, id: CellId) -> Option<&Cell> {
        self.fields
            .values()
            .map(|slot| &slot.cell)
            .find(|cell| cell.id() == id)
    }

    /// Number of fields, extension fields included.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Seed base cells from `values`, at most once per cell.
    ///
    /// Absent entries are skipped. A second hydration of an already-seeded
    /// field is a no-op: the latch guarantees once-per-instance semantics,
    /// so the first paint and later re-renders agree. Extension fields and
    /// read-only pass-through cells are never hydrated.
    pub fn hydrate(&self, values: &IndexMap<String, Value>) {
        for (key, slot) in &self.fields {
            if !slot.base || !slot.writable {
                continue;
            }
            let Some(value) = values.get(key) else {
                continue;
            };
            if slot.hydrated.swap(true, Ordering::SeqCst) {
                continue;
            }
            // Guarded by the writability flag above.
            let _ = slot.cell.write(value.clone());
        }
    }

    /// Push changed external values into writable base cells.
    ///
    /// Unlike hydration this runs on every update: each present entry that
    /// differs from the cell's current value overwrites it. Absent entries
    /// model "no external value" and leave the cell alone.
    pub fn sync(&self, values: &IndexMap<String, Value>) {
        for (key, slot) in &self.fields {
            if !slot.base || !slot.writable {
                continue;
            }
            let Some(value) = values.get(key) else {
                continue;
            };
            if slot.cell.read() != *value {
                let _ = slot.cell.write(value.clone());
            }
        }
    }
}

impl std::fmt::Debug for StoreInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreInstance")
            .field("name", &self.name)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}
