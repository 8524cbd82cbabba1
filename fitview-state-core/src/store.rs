//! Path-addressed reactive store
//!
//! One tree of `serde_json::Value`, written only through
//! [`set_state`](PathStore::set_state) and [`update_state`](PathStore::update_state).
//! Every write runs the middleware chain, commits, then notifies subscribers
//! synchronously before returning.
//!
//! # Example
//!
//! ```
//! use fitview_state_core::{ChangeOptions, PathStore};
//! use serde_json::json;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let store = PathStore::new();
//! let hits = Rc::new(Cell::new(0));
//!
//! let counter = hits.clone();
//! let sub = store.subscribe("charts.isRendered", move |_change| {
//!     counter.set(counter.get() + 1);
//!     Ok(())
//! });
//!
//! store.set_state("charts.isRendered", json!(true), ChangeOptions::source("Example"));
//! store.set_state("charts.isRendered", json!(true), ChangeOptions::source("Example"));
//! assert_eq!(hits.get(), 2);
//! assert_eq!(store.get_state("charts"), Some(json!({"isRendered": true})));
//!
//! sub.unsubscribe();
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::config::{NotifyPolicy, StoreConfig};
use crate::error::CallbackResult;
use crate::middleware::{LoggingMiddleware, Middleware, MiddlewareChain};
use crate::path;
use crate::registry::{Change, SubscriberFn, Subscription, SubscriptionRegistry};

/// Diagnostic metadata attached to a write.
///
/// The store never interprets these; they are handed to middleware and
/// subscribers as-is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeOptions {
    /// Who issued the write (e.g. `"AppActions.switchTab"`).
    pub source: Option<String>,
    /// Free-form extra fields.
    pub extra: Map<String, Value>,
}

impl ChangeOptions {
    /// Options tagged with a source.
    pub fn source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            extra: Map::new(),
        }
    }

    /// Attach an extra field.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

impl From<&str> for ChangeOptions {
    fn from(source: &str) -> Self {
        Self::source(source)
    }
}

impl From<String> for ChangeOptions {
    fn from(source: String) -> Self {
        Self::source(source)
    }
}

struct StoreInner {
    config: StoreConfig,
    tree: RefCell<Value>,
    registry: Rc<RefCell<SubscriptionRegistry>>,
    middleware: RefCell<MiddlewareChain>,
}

/// Handle to a reactive state tree.
///
/// Cloning produces another handle to the same store. The store is
/// single-threaded: it is neither `Send` nor `Sync`.
#[derive(Clone)]
pub struct PathStore {
    inner: Rc<StoreInner>,
}

impl Default for PathStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PathStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathStore")
            .field("config", &self.inner.config)
            .field("subscriptions", &self.total_subscriptions())
            .field("middleware", &self.middleware_count())
            .finish()
    }
}

impl PathStore {
    /// Create an empty store with the default configuration.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        let store = Self {
            inner: Rc::new(StoreInner {
                config,
                tree: RefCell::new(Value::Object(Map::new())),
                registry: Rc::new(RefCell::new(SubscriptionRegistry::new())),
                middleware: RefCell::new(MiddlewareChain::new()),
            }),
        };
        store.install_configured_middleware();
        store
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    fn install_configured_middleware(&self) {
        if self.inner.config.log_changes {
            self.inner.middleware.borrow_mut().add(LoggingMiddleware);
        }
    }

    /// Current value at `path`, or `None` if any segment is absent.
    pub fn get_state(&self, path: &str) -> Option<Value> {
        path::resolve(&self.inner.tree.borrow(), path).cloned()
    }

    /// Borrow the value at `path` without cloning it.
    ///
    /// `f` must not write to the store.
    pub fn with_state<R>(&self, path: &str, f: impl FnOnce(Option<&Value>) -> R) -> R {
        let tree = self.inner.tree.borrow();
        f(path::resolve(&tree, path))
    }

    /// Clone of the whole tree.
    pub fn snapshot(&self) -> Value {
        self.inner.tree.borrow().clone()
    }

    /// Write `value` at `path` and notify subscribers.
    ///
    /// Writing the value that is already there still notifies. The write is
    /// dropped only when middleware explicitly replaces the candidate with
    /// the current value.
    pub fn set_state(&self, path: &str, value: impl Into<Value>, options: impl Into<ChangeOptions>) {
        let path = path::normalize(path);
        self.commit(&path, value.into(), &options.into());
    }

    /// [`set_state`](Self::set_state) with default options.
    pub fn set(&self, path: &str, value: impl Into<Value>) {
        self.set_state(path, value, ChangeOptions::default());
    }

    /// Shallow-merge `partial` into the object at `path`, creating it if absent.
    ///
    /// A non-object `partial` is written as-is, like `set_state`.
    pub fn update_state(&self, path: &str, partial: Value, options: impl Into<ChangeOptions>) {
        let path = path::normalize(path);
        let merged = match partial {
            Value::Object(fields) => {
                let mut base = match self.get_state(&path) {
                    Some(Value::Object(existing)) => existing,
                    _ => Map::new(),
                };
                base.extend(fields);
                Value::Object(base)
            }
            other => {
                tracing::warn!(path = %path, "update_state called with a non-object, replacing value");
                other
            }
        };
        self.commit(&path, merged, &options.into());
    }

    /// Several `set_state` calls in order, sharing one set of options.
    pub fn batch(&self, writes: &[(&str, Value)], options: impl Into<ChangeOptions>) {
        let options = options.into();
        for (path, value) in writes {
            self.commit(&path::normalize(path), value.clone(), &options);
        }
    }

    fn commit(&self, path: &str, value: Value, options: &ChangeOptions) {
        let old_value = self.get_state(path);

        // Snapshot the chain so middleware may read the store.
        let chain = self.inner.middleware.borrow().clone();
        let outcome = chain.apply(path, value, old_value.as_ref(), options);

        if outcome.replaced && old_value.as_ref() == Some(&outcome.value) {
            tracing::trace!(path = %path, "Middleware kept the current value, write dropped");
            return;
        }

        let related = match self.inner.config.notify_policy {
            NotifyPolicy::Exact => Vec::new(),
            NotifyPolicy::Hierarchical => self.related_old_values(path),
        };

        path::assign(&mut self.inner.tree.borrow_mut(), path, outcome.value.clone());

        self.notify(path, Some(&outcome.value), old_value.as_ref(), options);
        for (related_path, related_old) in related {
            let related_new = self.get_state(&related_path);
            self.notify(
                &related_path,
                related_new.as_ref(),
                related_old.as_ref(),
                options,
            );
        }
    }

    fn related_old_values(&self, path: &str) -> Vec<(String, Option<Value>)> {
        let paths = {
            let registry = self.inner.registry.borrow();
            let mut paths = registry.ancestors_of(path);
            paths.extend(registry.descendants_of(path));
            paths
        };
        paths
            .into_iter()
            .map(|related| {
                let old = self.get_state(&related);
                (related, old)
            })
            .collect()
    }

    fn notify(
        &self,
        path: &str,
        new_value: Option<&Value>,
        old_value: Option<&Value>,
        options: &ChangeOptions,
    ) {
        let subscribers = self.inner.registry.borrow().snapshot(path);
        let change = Change {
            path,
            new_value,
            old_value,
            options,
        };

        for (id, callback) in subscribers {
            // Skip callbacks removed by an earlier subscriber in this pass.
            let still_registered = self.inner.registry.borrow().contains(path, id);
            if !still_registered {
                continue;
            }
            if let Err(error) = callback(&change) {
                tracing::warn!(
                    path = %path,
                    subscription = %id,
                    error = %error,
                    "Subscriber failed"
                );
            }
        }
    }

    /// Run `callback` after every committed write to `path`.
    pub fn subscribe<F>(&self, path: &str, callback: F) -> Subscription
    where
        F: Fn(&Change<'_>) -> CallbackResult + 'static,
    {
        let path = path::normalize(path);
        let callback: Rc<SubscriberFn> = Rc::new(callback);
        let id = self.inner.registry.borrow_mut().insert(&path, callback);
        tracing::trace!(path = %path, subscription = %id, "Subscribed");
        Subscription::new(id, path, Rc::downgrade(&self.inner.registry))
    }

    /// Append a middleware to the chain.
    pub fn use_middleware<M: Middleware + 'static>(&self, middleware: M) {
        self.inner.middleware.borrow_mut().add(middleware);
    }

    /// Append a closure middleware.
    pub fn use_middleware_fn<F>(&self, middleware: F)
    where
        F: Fn(&str, &Value, Option<&Value>, &ChangeOptions) -> CallbackResult<Option<Value>>
            + 'static,
    {
        self.inner.middleware.borrow_mut().add_fn(middleware);
    }

    /// Run the middleware chain without committing anything.
    pub fn apply_middleware(
        &self,
        path: &str,
        value: Value,
        old_value: Option<&Value>,
        options: &ChangeOptions,
    ) -> Value {
        let chain = self.inner.middleware.borrow().clone();
        chain.apply(path, value, old_value, options).value
    }

    pub fn subscriber_count(&self, path: &str) -> usize {
        self.inner.registry.borrow().count(path)
    }

    pub fn total_subscriptions(&self) -> usize {
        self.inner.registry.borrow().total()
    }

    pub fn middleware_count(&self) -> usize {
        self.inner.middleware.borrow().len()
    }

    /// Clear the tree, every subscription and every middleware added since
    /// construction. Meant for test isolation.
    pub fn reset(&self) {
        *self.inner.tree.borrow_mut() = Value::Object(Map::new());
        self.inner.registry.borrow_mut().clear();
        self.inner.middleware.borrow_mut().clear();
        self.install_configured_middleware();
        tracing::debug!("State store reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    fn counter(store: &PathStore, path: &str) -> (Rc<Cell<usize>>, Subscription) {
        let hits = Rc::new(Cell::new(0));
        let inner = hits.clone();
        let sub = store.subscribe(path, move |_| {
            inner.set(inner.get() + 1);
            Ok(())
        });
        (hits, sub)
    }

    #[test]
    fn test_get_missing_path_is_none() {
        let store = PathStore::new();
        assert_eq!(store.get_state("fitFile.metrics"), None);
    }

    #[test]
    fn test_set_creates_intermediate_nodes() {
        let store = PathStore::new();
        store.set("performance.renderTimes.chart", json!(4));
        assert_eq!(
            store.get_state("performance"),
            Some(json!({"renderTimes": {"chart": 4}}))
        );
    }

    #[test]
    fn test_path_isolation() {
        let store = PathStore::new();
        store.set("a.x", json!(1));
        store.set("b.y", json!(2));
        store.set("a.z", json!(3));
        assert_eq!(store.get_state("b.y"), Some(json!(2)));
        assert_eq!(store.get_state("a.x"), Some(json!(1)));
    }

    #[test]
    fn test_same_value_write_notifies_again() {
        let store = PathStore::new();
        let (hits, _sub) = counter(&store, "x");
        store.set("x", json!(1));
        store.set("x", json!(1));
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_subscriber_receives_new_and_old_values() {
        let store = PathStore::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let inner = seen.clone();
        let _sub = store.subscribe("ui.theme", move |change| {
            inner.borrow_mut().push((
                change.new_value.cloned(),
                change.old_value.cloned(),
                change.options.source.clone(),
            ));
            Ok(())
        });

        store.set_state("ui.theme", json!("dark"), "Settings");
        store.set_state("ui.theme", json!("light"), "Settings");

        let seen = seen.borrow();
        assert_eq!(seen[0], (Some(json!("dark")), None, Some("Settings".into())));
        assert_eq!(
            seen[1],
            (Some(json!("light")), Some(json!("dark")), Some("Settings".into()))
        );
    }

    #[test]
    fn test_update_state_merges_shallowly() {
        let store = PathStore::new();
        store.set("charts", json!({"isRendered": false, "zoom": {"level": 2}}));
        store.update_state("charts", json!({"isRendered": true, "zoom": {"x": 1}}), "Test");
        assert_eq!(
            store.get_state("charts"),
            Some(json!({"isRendered": true, "zoom": {"x": 1}}))
        );
    }

    #[test]
    fn test_update_state_creates_missing_object() {
        let store = PathStore::new();
        let (hits, _sub) = counter(&store, "tables");
        store.update_state("tables", json!({"isRendered": true}), "Test");
        assert_eq!(store.get_state("tables.isRendered"), Some(json!(true)));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_unsubscribe_is_idempotent_and_targeted() {
        let store = PathStore::new();
        let (first, first_sub) = counter(&store, "x");
        let (second, _second_sub) = counter(&store, "x");

        assert!(first_sub.unsubscribe());
        assert!(!first_sub.unsubscribe());

        store.set("x", json!(1));
        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 1);
        assert_eq!(store.subscriber_count("x"), 1);
    }

    #[test]
    fn test_subscribers_run_in_registration_order() {
        let store = PathStore::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut subs = Vec::new();
        for n in 0..3 {
            let order = order.clone();
            subs.push(store.subscribe("x", move |_| {
                order.borrow_mut().push(n);
                Ok(())
            }));
        }
        store.set("x", json!(true));
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_failing_subscriber_does_not_stop_siblings() {
        let store = PathStore::new();
        let _failing = store.subscribe("x", |_| Err("listener exploded".into()));
        let (hits, _sub) = counter(&store, "x");
        store.set("x", json!(1));
        assert_eq!(hits.get(), 1);
        assert_eq!(store.get_state("x"), Some(json!(1)));
    }

    #[test]
    fn test_subscribe_during_dispatch_waits_for_next_change() {
        let store = PathStore::new();
        let late_hits = Rc::new(Cell::new(0));
        let late_subs = Rc::new(RefCell::new(Vec::new()));

        let handle = store.clone();
        let hits = late_hits.clone();
        let subs = late_subs.clone();
        let _sub = store.subscribe("x", move |_| {
            let hits = hits.clone();
            subs.borrow_mut().push(handle.subscribe("x", move |_| {
                hits.set(hits.get() + 1);
                Ok(())
            }));
            Ok(())
        });

        store.set("x", json!(1));
        assert_eq!(late_hits.get(), 0);

        store.set("x", json!(2));
        assert_eq!(late_hits.get(), 1);
    }

    #[test]
    fn test_unsubscribe_during_dispatch_skips_removed_callback() {
        let store = PathStore::new();
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let target = victim.clone();
        let _killer = store.subscribe("x", move |_| {
            if let Some(sub) = target.borrow().as_ref() {
                sub.unsubscribe();
            }
            Ok(())
        });
        let (hits, sub) = counter(&store, "x");
        *victim.borrow_mut() = Some(sub);

        store.set("x", json!(1));
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_nested_writes_are_depth_first() {
        let store = PathStore::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let handle = store.clone();
        let log = order.clone();
        let _a1 = store.subscribe("a", move |_| {
            log.borrow_mut().push("a1");
            handle.set("b", json!(1));
            Ok(())
        });
        let log = order.clone();
        let _b = store.subscribe("b", move |_| {
            log.borrow_mut().push("b");
            Ok(())
        });
        let log = order.clone();
        let _a2 = store.subscribe("a", move |_| {
            log.borrow_mut().push("a2");
            Ok(())
        });

        store.set("a", json!(1));
        assert_eq!(*order.borrow(), vec!["a1", "b", "a2"]);
    }

    #[test]
    fn test_middleware_runs_before_subscribers() {
        let store = PathStore::new();
        store.use_middleware_fn(|_, v, _, _| Ok(v.as_i64().map(|n| json!(n * 10))));
        let seen = Rc::new(RefCell::new(None));
        let inner = seen.clone();
        let _sub = store.subscribe("n", move |change| {
            *inner.borrow_mut() = change.new_value.cloned();
            Ok(())
        });

        store.set("n", json!(4));
        assert_eq!(*seen.borrow(), Some(json!(40)));
        assert_eq!(store.get_state("n"), Some(json!(40)));
    }

    #[test]
    fn test_middleware_returning_current_value_drops_write() {
        let store = PathStore::new();
        store.set("locked", json!("keep"));
        store.use_middleware_fn(|path, _, old, _| {
            Ok(if path == "locked" { old.cloned() } else { None })
        });
        let (hits, _sub) = counter(&store, "locked");

        store.set("locked", json!("other"));
        assert_eq!(store.get_state("locked"), Some(json!("keep")));
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_hierarchical_policy_notifies_ancestors_and_descendants() {
        let store = PathStore::with_config(StoreConfig::hierarchical());
        let (parent, _p) = counter(&store, "charts");
        let (child, _c) = counter(&store, "charts.isRendered");
        let (unrelated, _u) = counter(&store, "map");

        store.set("charts.isRendered", json!(true));
        assert_eq!(parent.get(), 1);
        assert_eq!(child.get(), 1);

        store.update_state("charts", json!({"isRendered": false}), "Test");
        assert_eq!(parent.get(), 2);
        assert_eq!(child.get(), 2);
        assert_eq!(unrelated.get(), 0);
    }

    #[test]
    fn test_exact_policy_ignores_related_paths() {
        let store = PathStore::new();
        let (parent, _p) = counter(&store, "charts");
        store.set("charts.isRendered", json!(true));
        assert_eq!(parent.get(), 0);
    }

    #[test]
    fn test_batch_writes_in_order() {
        let store = PathStore::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut subs = Vec::new();
        for path in ["globalData", "currentFile"] {
            let order = order.clone();
            subs.push(store.subscribe(path, move |change| {
                order.borrow_mut().push(change.path.to_string());
                Ok(())
            }));
        }
        store.batch(
            &[("globalData", Value::Null), ("currentFile", Value::Null)],
            "Test",
        );
        assert_eq!(*order.borrow(), vec!["globalData", "currentFile"]);
    }

    #[test]
    fn test_reset_clears_everything() {
        let store = PathStore::with_config(StoreConfig {
            log_changes: true,
            ..StoreConfig::default()
        });
        store.use_middleware_fn(|_, _, _, _| Ok(None));
        let (hits, sub) = counter(&store, "x");
        store.set("x", json!(1));
        assert_eq!(store.middleware_count(), 2);

        store.reset();
        assert_eq!(store.get_state("x"), None);
        assert_eq!(store.total_subscriptions(), 0);
        assert_eq!(store.middleware_count(), 1);
        assert!(!sub.is_active());

        store.set("x", json!(2));
        assert_eq!(hits.get(), 1);
    }
}
