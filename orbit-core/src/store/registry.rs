//! Store Registry
//!
//! Maps qualified scope keys to live store instances. A snapshot is
//! immutable for the duration of a render: providers extend the snapshot
//! they inherited and hand the extension to their descendants, so an
//! ancestor never observes a descendant's entries and nested providers
//! shadow without deleting.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::warn;

use super::instance::StoreInstance;

/// Reserved wildcard scope: "the nearest provider of this store name,
/// whatever its explicit scope".
pub const PROVIDER_SCOPE: &str = "provider";

/// Registry key: a store name qualified by a scope label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeKey {
    pub name: String,
    pub scope: String,
}

impl ScopeKey {
    pub fn new(name: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: scope.into(),
        }
    }

    /// Key for the wildcard bucket of `name`.
    pub fn provider(name: impl Into<String>) -> Self {
        Self::new(name, PROVIDER_SCOPE)
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.scope)
    }
}

/// Immutable-per-render mapping from [`ScopeKey`] to a store instance.
///
/// Cheap to clone; instances are shared by `Arc`, and [`Snapshot::register`]
/// copies only the key table.
#[derive(Clone, Default)]
pub struct Snapshot {
    entries: Arc<IndexMap<ScopeKey, Arc<StoreInstance>>>,
}

impl Snapshot {
    /// An empty snapshot, the root of every provider tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce a new snapshot equal to this one plus the given entry.
    ///
    /// `self` is untouched; siblings holding it keep their view.
    #[must_use]
    pub fn register(&self, key: ScopeKey, instance: Arc<StoreInstance>) -> Snapshot {
        let mut entries = (*self.entries).clone();
        entries.insert(key, instance);
        Snapshot {
            entries: Arc::new(entries),
        }
    }

    /// Look up the instance for `(name, scope)`.
    ///
    /// Resolution is two-level: the exact key first, then the wildcard
    /// bucket `(name, "provider")`. No further inheritance.
    pub fn resolve(&self, name: &str, scope: &str) -> Option<Arc<StoreInstance>> {
        if let Some(instance) = self.entries.get(&ScopeKey::new(name, scope)) {
            return Some(instance.clone());
        }
        if scope != PROVIDER_SCOPE {
            if let Some(instance) = self.entries.get(&ScopeKey::provider(name)) {
                return Some(instance.clone());
            }
        }
        None
    }

    /// Like [`Snapshot::resolve`], emitting an advisory diagnostic on a
    /// miss when `warn_on_miss` is set. A miss is never an error; callers
    /// may operate store-less against a default instance.
    pub fn resolve_or_warn(
        &self,
        name: &str,
        scope: &str,
        warn_on_miss: bool,
    ) -> Option<Arc<StoreInstance>> {
        let found = self.resolve(name, scope);
        if found.is_none() && warn_on_miss {
            warn!(store = name, scope, "no provider registered for store");
        }
        found
    }

    /// Check whether an exact key is present.
    pub fn contains(&self, key: &ScopeKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.entries.keys().map(|key| key.to_string()))
            .finish()
    }
}
