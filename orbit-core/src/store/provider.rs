//! Scope Providers
//!
//! A provider is the tree node that owns one store instance and exposes
//! it to its subtree. Rendering is split into two phases:
//!
//! 1. **Render (pure)**: decide the instance lifecycle (mount, keep, or
//!    reset), register it into the inherited snapshot, hydrate on mount,
//!    and queue all side-effecting writes.
//!
//! 2. **Commit**: [`RenderPass::commit`] applies the queued writes (prop
//!    sync, the one-shot init callback) strictly after the render that
//!    produced them, so writes never interleave with reads of the same
//!    pass.
//!
//! Hydration is the exception: it runs inside the mounting render, before
//! anything downstream can read the instance, so the first paint already
//! sees the seeded values.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use super::instance::{StoreDef, StoreInstance};
use super::registry::{ScopeKey, Snapshot};
use super::value::Value;

/// One-shot callback run after the mounting render commits.
pub type InitFn = Arc<dyn Fn(&Arc<StoreInstance>) + Send + Sync>;

/// Per-render inputs to a provider node.
#[derive(Clone, Default)]
pub struct ProviderProps {
    /// Explicit scope label. When set, the instance registers under this
    /// key in addition to the wildcard bucket.
    pub scope: Option<String>,

    /// Adopt this instance instead of building one from the declaration.
    pub store: Option<Arc<StoreInstance>>,

    /// Reset trigger. An identity change discards the current instance
    /// and re-seeds a fresh one from the props of that render.
    pub reset_key: Option<Value>,

    /// Externally supplied initial values, hydrated once per instance.
    pub initial_values: IndexMap<String, Value>,

    /// Per-field overrides. They win over `initial_values` and feed the
    /// sync pass on every render.
    pub overrides: IndexMap<String, Value>,

    /// One-shot side-effect callback, run once per provider after the
    /// mounting render commits.
    pub on_init: Option<InitFn>,
}

impl ProviderProps {
    /// The external value bundle: `initial_values` with `overrides`
    /// layered on top.
    fn merged_values(&self) -> IndexMap<String, Value> {
        let mut merged = self.initial_values.clone();
        for (key, value) in &self.overrides {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }
}

enum ProviderState {
    Uninitialized,
    Active {
        instance: Arc<StoreInstance>,
        reset_key: Option<Value>,
    },
    Retired,
}

/// A tree node owning one store instance.
pub struct Provider {
    def: Arc<StoreDef>,
    state: ProviderState,
}

/// Output of the pure render phase.
///
/// The snapshot goes to descendants; the queued writes apply at
/// [`RenderPass::commit`].
pub struct RenderPass {
    pub snapshot: Snapshot,
    pending: Vec<Box<dyn FnOnce() + Send>>,
}

impl RenderPass {
    /// Apply all queued writes, in the order they were queued.
    pub fn commit(self) {
        for op in self.pending {
            op();
        }
    }

    /// Number of queued commit-phase operations.
    pub fn pending_ops(&self) -> usize {
        self.pending.len()
    }
}

impl Provider {
    pub(crate) fn new(def: Arc<StoreDef>) -> Self {
        Self {
            def,
            state: ProviderState::Uninitialized,
        }
    }

    /// The instance this provider currently owns, if mounted.
    pub fn instance(&self) -> Option<&Arc<StoreInstance>> {
        match &self.state {
            ProviderState::Active { instance, .. } => Some(instance),
            _ => None,
        }
    }

    /// Run one render pass against the inherited snapshot.
    ///
    /// Mounts on first call (or after [`Provider::unmount`]), resets when
    /// the reset key's identity changes, and otherwise keeps the current
    /// instance. Every pass re-registers the instance and queues a prop
    /// sync for the commit phase.
    pub fn render(&mut self, inherited: &Snapshot, props: &ProviderProps) -> RenderPass {
        let mut pending: Vec<Box<dyn FnOnce() + Send>> = Vec::new();
        let values = props.merged_values();

        let kept = match &self.state {
            ProviderState::Active {
                instance,
                reset_key,
            } if *reset_key == props.reset_key => Some(instance.clone()),
            _ => None,
        };

        let instance = match kept {
            Some(instance) => instance,
            None => {
                let first_mount = !matches!(self.state, ProviderState::Active { .. });
                let instance = match &props.store {
                    Some(adopted) => adopted.clone(),
                    None => self.def.instantiate(),
                };

                if first_mount {
                    debug!(store = self.def.name(), "provider mount");
                } else {
                    debug!(store = self.def.name(), "provider reset");
                }

                // Seed before anything downstream reads the instance.
                instance.hydrate(&values);

                if first_mount {
                    if let Some(on_init) = &props.on_init {
                        let on_init = on_init.clone();
                        let instance = instance.clone();
                        pending.push(Box::new(move || on_init(&instance)));
                    }
                }

                self.state = ProviderState::Active {
                    instance: instance.clone(),
                    reset_key: props.reset_key.clone(),
                };
                instance
            }
        };

        {
            let instance = instance.clone();
            pending.push(Box::new(move || instance.sync(&values)));
        }

        let mut snapshot = inherited.register(ScopeKey::provider(self.def.name()), instance.clone());
        if let Some(scope) = &props.scope {
            snapshot = snapshot.register(ScopeKey::new(self.def.name(), scope.clone()), instance);
        }

        RenderPass { snapshot, pending }
    }

    /// Retire the node. The instance becomes unreachable once no snapshot
    /// references it; a later render mounts a fresh one.
    pub fn unmount(&mut self) {
        if matches!(self.state, ProviderState::Active { .. }) {
            debug!(store = self.def.name(), "provider unmount");
        }
        self.state = ProviderState::Retired;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::instance::FieldInit;
    use crate::store::registry::PROVIDER_SCOPE;
    use std::sync::atomic::{AtomicI32, Ordering};

    fn def() -> Arc<StoreDef> {
        let mut fields = IndexMap::new();
        fields.insert("count".to_owned(), FieldInit::Value(Value::from(0)));
        fields.insert("say".to_owned(), FieldInit::Value(Value::from("hi")));
        Arc::new(StoreDef::new("app", fields, None))
    }

    fn props_with(entries: &[(&str, Value)]) -> ProviderProps {
        ProviderProps {
            overrides: entries
                .iter()
                .map(|(key, value)| ((*key).to_owned(), value.clone()))
                .collect(),
            ..ProviderProps::default()
        }
    }

    #[test]
    fn mount_registers_under_wildcard() {
        let mut provider = Provider::new(def());
        let pass = provider.render(&Snapshot::new(), &ProviderProps::default());

        assert!(pass.snapshot.resolve("app", PROVIDER_SCOPE).is_some());
        assert_eq!(pass.snapshot.len(), 1);
        pass.commit();
    }

    #[test]
    fn explicit_scope_registers_both_keys() {
        let mut provider = Provider::new(def());
        let props = ProviderProps {
            scope: Some("left".to_owned()),
            ..ProviderProps::default()
        };
        let pass = provider.render(&Snapshot::new(), &props);

        let by_scope = pass.snapshot.resolve("app", "left").unwrap();
        let by_wildcard = pass.snapshot.resolve("app", PROVIDER_SCOPE).unwrap();
        assert!(Arc::ptr_eq(&by_scope, &by_wildcard));
        pass.commit();
    }

    #[test]
    fn hydration_is_visible_before_commit() {
        let mut provider = Provider::new(def());
        let pass = provider.render(&Snapshot::new(), &props_with(&[("count", Value::from(3))]));

        // First paint reads the hydrated value; sync has not run yet.
        let instance = pass.snapshot.resolve("app", PROVIDER_SCOPE).unwrap();
        assert_eq!(instance.cell("count").unwrap().read(), Value::from(3));
        pass.commit();
    }

    #[test]
    fn sync_applies_at_commit_not_during_render() {
        let mut provider = Provider::new(def());
        provider
            .render(&Snapshot::new(), &ProviderProps::default())
            .commit();
        let instance = provider.instance().unwrap().clone();

        let pass = provider.render(&Snapshot::new(), &props_with(&[("count", Value::from(5))]));
        // count was hydrated to 0 by the defaultless mount; the new prop
        // value lands only at commit.
        assert_eq!(instance.cell("count").unwrap().read(), Value::from(0));

        pass.commit();
        assert_eq!(instance.cell("count").unwrap().read(), Value::from(5));
    }

    #[test]
    fn rerender_keeps_the_instance() {
        let mut provider = Provider::new(def());
        provider
            .render(&Snapshot::new(), &ProviderProps::default())
            .commit();
        let first = provider.instance().unwrap().clone();

        provider
            .render(&Snapshot::new(), &ProviderProps::default())
            .commit();
        let second = provider.instance().unwrap().clone();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn reset_key_change_discards_writes() {
        let mut provider = Provider::new(def());
        let props = ProviderProps {
            reset_key: Some(Value::from(1)),
            ..props_with(&[("count", Value::from(1))])
        };
        provider.render(&Snapshot::new(), &props).commit();

        let instance = provider.instance().unwrap().clone();
        instance
            .cell("count")
            .unwrap()
            .write(Value::from(42))
            .unwrap();

        // Same key: no reset, the write survives.
        provider.render(&Snapshot::new(), &props).commit();
        assert!(Arc::ptr_eq(&instance, provider.instance().unwrap()));

        // Changed key: fresh instance re-seeded from current props.
        let reset = ProviderProps {
            reset_key: Some(Value::from(2)),
            ..props_with(&[("count", Value::from(7))])
        };
        provider.render(&Snapshot::new(), &reset).commit();

        let fresh = provider.instance().unwrap();
        assert!(!Arc::ptr_eq(&instance, fresh));
        assert_eq!(fresh.cell("count").unwrap().read(), Value::from(7));
    }

    #[test]
    fn on_init_runs_once_at_commit() {
        let calls = Arc::new(AtomicI32::new(0));
        let calls_clone = calls.clone();

        let mut provider = Provider::new(def());
        let props = ProviderProps {
            on_init: Some(Arc::new(move |_| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            })),
            ..ProviderProps::default()
        };

        let pass = provider.render(&Snapshot::new(), &props);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        pass.commit();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Re-renders do not re-run the callback.
        provider.render(&Snapshot::new(), &props).commit();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn adopted_store_is_used_verbatim() {
        let adopted = def().instantiate();
        let mut provider = Provider::new(def());
        let props = ProviderProps {
            store: Some(adopted.clone()),
            ..ProviderProps::default()
        };

        let pass = provider.render(&Snapshot::new(), &props);
        let registered = pass.snapshot.resolve("app", PROVIDER_SCOPE).unwrap();
        assert!(Arc::ptr_eq(&adopted, &registered));
        pass.commit();
    }

    #[test]
    fn unmount_then_render_mounts_fresh() {
        let mut provider = Provider::new(def());
        provider
            .render(&Snapshot::new(), &ProviderProps::default())
            .commit();
        let first = provider.instance().unwrap().clone();

        provider.unmount();
        assert!(provider.instance().is_none());

        provider
            .render(&Snapshot::new(), &ProviderProps::default())
            .commit();
        assert!(!Arc::ptr_eq(&first, provider.instance().unwrap()));
    }
}
