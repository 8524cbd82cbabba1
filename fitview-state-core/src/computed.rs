//! Memoized derived values and path-bound read/write pairs

use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::Location;
use std::rc::Rc;

use serde_json::Value;

use crate::registry::Subscription;
use crate::store::{ChangeOptions, PathStore};

struct ComputedCache<T> {
    value: RefCell<Option<T>>,
    generation: Cell<u64>,
}

impl<T> ComputedCache<T> {
    fn invalidate(&self) {
        self.generation.set(self.generation.get() + 1);
        self.value.borrow_mut().take();
    }
}

/// A cached value derived from the store.
///
/// The first [`get`](Computed::get) runs the compute function; later calls
/// return the cached value until one of the dependency paths changes. The
/// recompute happens lazily on the next `get`.
///
/// Dropping a `Computed` removes its dependency subscriptions.
pub struct Computed<T> {
    cache: Rc<ComputedCache<T>>,
    compute: Box<dyn Fn() -> T>,
    dependencies: Vec<String>,
    subscriptions: Vec<Subscription>,
}

impl<T> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("dependencies", &self.dependencies)
            .field("cached", &self.is_cached())
            .finish()
    }
}

impl<T: Clone + 'static> Computed<T> {
    /// Current value, recomputing if the cache was invalidated.
    pub fn get(&self) -> T {
        if let Some(value) = self.cache.value.borrow().as_ref() {
            return value.clone();
        }

        let generation = self.cache.generation.get();
        let value = (self.compute)();
        // A dependency changed while computing; do not cache a stale result.
        if self.cache.generation.get() == generation {
            *self.cache.value.borrow_mut() = Some(value.clone());
        }
        value
    }
}

impl<T> Computed<T> {
    pub fn is_cached(&self) -> bool {
        self.cache.value.borrow().is_some()
    }

    /// Drop the cached value so the next `get` recomputes.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Remove every dependency subscription. Safe to call more than once.
    ///
    /// After cleanup the cached value no longer reacts to store changes.
    pub fn cleanup(&self) {
        for subscription in &self.subscriptions {
            subscription.unsubscribe();
        }
    }
}

impl<T> Drop for Computed<T> {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Build a memoized value over `dependencies`.
///
/// # Example
///
/// ```
/// use fitview_state_core::{use_computed, PathStore};
/// use serde_json::json;
///
/// let store = PathStore::new();
/// store.set("fitFile.metrics.recordCount", json!(10));
///
/// let reader = store.clone();
/// let doubled = use_computed(
///     &store,
///     move || reader.get_state("fitFile.metrics.recordCount").and_then(|v| v.as_u64()).unwrap_or(0) * 2,
///     &["fitFile.metrics.recordCount"],
/// );
/// assert_eq!(doubled.get(), 20);
///
/// store.set("fitFile.metrics.recordCount", json!(21));
/// assert_eq!(doubled.get(), 42);
/// doubled.cleanup();
/// ```
pub fn use_computed<T, F>(store: &PathStore, compute: F, dependencies: &[&str]) -> Computed<T>
where
    T: 'static,
    F: Fn() -> T + 'static,
{
    let cache = Rc::new(ComputedCache {
        value: RefCell::new(None),
        generation: Cell::new(0),
    });

    let subscriptions = dependencies
        .iter()
        .map(|path| {
            let cache = Rc::downgrade(&cache);
            store.subscribe(path, move |_| {
                if let Some(cache) = cache.upgrade() {
                    cache.invalidate();
                }
                Ok(())
            })
        })
        .collect();

    Computed {
        cache,
        compute: Box::new(compute),
        dependencies: dependencies.iter().map(|d| (*d).to_string()).collect(),
        subscriptions,
    }
}

/// Writer bound to one path, returned by [`use_state`].
#[derive(Debug, Clone)]
pub struct StateSetter {
    store: PathStore,
    path: String,
    source: String,
}

impl StateSetter {
    pub fn set(&self, value: impl Into<Value>) {
        self.store
            .set_state(&self.path, value, ChangeOptions::source(self.source.as_str()));
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Source tag attached to every write (`useState@file:line`).
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Read the value at `path` (or `default` if absent) plus a setter for it.
///
/// Writes made through the setter are tagged with the caller's location.
#[track_caller]
pub fn use_state(store: &PathStore, path: &str, default: Value) -> (Value, StateSetter) {
    let caller = Location::caller();
    let current = store.get_state(path).unwrap_or(default);
    let setter = StateSetter {
        store: store.clone(),
        path: path.to_string(),
        source: format!("useState@{}:{}", caller.file(), caller.line()),
    };
    (current, setter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn counting_computed(store: &PathStore, deps: &[&str]) -> (Computed<u32>, Rc<Cell<u32>>) {
        let calls = Rc::new(Cell::new(0));
        let inner = calls.clone();
        let computed = use_computed(
            store,
            move || {
                inner.set(inner.get() + 1);
                inner.get()
            },
            deps,
        );
        (computed, calls)
    }

    #[test]
    fn test_computed_caches_until_dependency_changes() {
        let store = PathStore::new();
        let (computed, calls) = counting_computed(&store, &["a"]);

        computed.get();
        computed.get();
        assert_eq!(calls.get(), 1);

        store.set("a", json!(1));
        assert!(!computed.is_cached());
        assert_eq!(calls.get(), 1);

        computed.get();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_unrelated_paths_keep_cache() {
        let store = PathStore::new();
        let (computed, calls) = counting_computed(&store, &["a"]);
        computed.get();
        store.set("b", json!(1));
        computed.get();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_cleanup_removes_dependency_subscriptions() {
        let store = PathStore::new();
        let (computed, calls) = counting_computed(&store, &["a", "b"]);
        assert_eq!(store.subscriber_count("a"), 1);
        assert_eq!(store.subscriber_count("b"), 1);

        computed.get();
        computed.cleanup();
        computed.cleanup();
        assert_eq!(store.total_subscriptions(), 0);

        store.set("a", json!(2));
        computed.get();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_drop_cleans_up() {
        let store = PathStore::new();
        {
            let (_computed, _) = counting_computed(&store, &["a"]);
            assert_eq!(store.total_subscriptions(), 1);
        }
        assert_eq!(store.total_subscriptions(), 0);
    }

    #[test]
    fn test_computed_reads_store() {
        let store = PathStore::new();
        store.set("ui.theme", json!("dark"));
        let reader = store.clone();
        let label = use_computed(
            &store,
            move || format!("theme:{}", reader.get_state("ui.theme").unwrap_or(Value::Null)),
            &["ui.theme"],
        );
        assert_eq!(label.get(), "theme:\"dark\"");
        store.set("ui.theme", json!("light"));
        assert_eq!(label.get(), "theme:\"light\"");
    }

    #[test]
    fn test_use_state_defaults_and_sets() {
        let store = PathStore::new();
        let (value, setter) = use_state(&store, "ui.activeTab", json!("summary"));
        assert_eq!(value, json!("summary"));

        setter.set("map");
        assert_eq!(store.get_state("ui.activeTab"), Some(json!("map")));
        assert!(setter.source().starts_with("useState@"));
        assert!(setter.source().contains("computed.rs"));

        let (value, _) = use_state(&store, "ui.activeTab", json!("summary"));
        assert_eq!(value, json!("map"));
    }

    #[test]
    fn test_use_state_setter_tags_source() {
        let store = PathStore::new();
        let sources = Rc::new(RefCell::new(Vec::new()));
        let inner = sources.clone();
        let _sub = store.subscribe("x", move |change| {
            inner.borrow_mut().push(change.options.source.clone());
            Ok(())
        });
        let (_, setter) = use_state(&store, "x", Value::Null);
        setter.set(1);
        assert_eq!(sources.borrow()[0].as_deref(), Some(setter.source()));
    }
}
