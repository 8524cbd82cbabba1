//! Subscription registry: path -> ordered callbacks
//!
//! The registry only stores callbacks. Dispatch lives in the store, which
//! takes a [`snapshot`](SubscriptionRegistry::snapshot) before invoking
//! anything so callbacks are free to subscribe, unsubscribe or write state
//! while a notification is in flight. Registrations made during a dispatch
//! are not part of that dispatch's snapshot and only hear the next change.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::error::CallbackResult;
use crate::path;
use crate::store::ChangeOptions;

/// A committed change as seen by a subscriber.
#[derive(Debug, Clone, Copy)]
pub struct Change<'a> {
    /// The path the subscriber registered on.
    pub path: &'a str,
    /// Value now at `path` (`None` if absent).
    pub new_value: Option<&'a Value>,
    /// Value at `path` before the write (`None` if absent).
    pub old_value: Option<&'a Value>,
    /// Options passed by the writer.
    pub options: &'a ChangeOptions,
}

impl Change<'_> {
    /// The new value, treating JSON `null` as absent.
    pub fn value(&self) -> Option<&Value> {
        self.new_value.filter(|v| !v.is_null())
    }
}

/// Callback invoked for every committed change on a subscribed path.
pub type SubscriberFn = dyn Fn(&Change<'_>) -> CallbackResult;

/// Opaque identity of one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Ordered callbacks keyed by normalized path.
#[derive(Default)]
pub struct SubscriptionRegistry {
    next_id: u64,
    by_path: BTreeMap<String, Vec<(SubscriptionId, Rc<SubscriberFn>)>>,
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("paths", &self.by_path.len())
            .field("subscriptions", &self.total())
            .finish()
    }
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a callback for `path` and return its id.
    pub fn insert(&mut self, path: &str, callback: Rc<SubscriberFn>) -> SubscriptionId {
        // Ids are never reused, not even across `clear`.
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.by_path
            .entry(path::normalize(path))
            .or_default()
            .push((id, callback));
        id
    }

    /// Remove one registration. Returns false if it was already gone.
    pub fn remove(&mut self, path: &str, id: SubscriptionId) -> bool {
        let key = path::normalize(path);
        let Some(callbacks) = self.by_path.get_mut(&key) else {
            return false;
        };
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| *existing != id);
        let removed = callbacks.len() != before;
        if callbacks.is_empty() {
            self.by_path.remove(&key);
        }
        removed
    }

    pub fn contains(&self, path: &str, id: SubscriptionId) -> bool {
        self.by_path
            .get(path)
            .is_some_and(|callbacks| callbacks.iter().any(|(existing, _)| *existing == id))
    }

    /// Callbacks for a normalized path, in registration order.
    pub fn snapshot(&self, path: &str) -> Vec<(SubscriptionId, Rc<SubscriberFn>)> {
        self.by_path.get(path).cloned().unwrap_or_default()
    }

    /// Subscribed paths that are strict ancestors of `path`, nearest first.
    pub fn ancestors_of(&self, path: &str) -> Vec<String> {
        let mut found: Vec<String> = self
            .by_path
            .keys()
            .filter(|key| path::is_ancestor(key, path))
            .cloned()
            .collect();
        found.sort_by_key(|key| std::cmp::Reverse(key.len()));
        found
    }

    /// Subscribed paths that are strict descendants of `path`, in lexicographic order.
    pub fn descendants_of(&self, path: &str) -> Vec<String> {
        self.by_path
            .keys()
            .filter(|key| path::is_ancestor(path, key))
            .cloned()
            .collect()
    }

    pub fn count(&self, path: &str) -> usize {
        self.by_path
            .get(&path::normalize(path))
            .map_or(0, |callbacks| callbacks.len())
    }

    pub fn total(&self) -> usize {
        self.by_path.values().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        self.by_path.clear();
    }
}

/// Disposer for one registration.
///
/// [`unsubscribe`](Subscription::unsubscribe) removes exactly this
/// registration and is safe to call any number of times. Dropping the handle
/// does *not* unsubscribe; callers own the teardown.
#[must_use = "dropping a Subscription leaves the callback registered; keep it to unsubscribe later"]
#[derive(Debug, Clone)]
pub struct Subscription {
    id: SubscriptionId,
    path: String,
    registry: Weak<RefCell<SubscriptionRegistry>>,
}

impl Subscription {
    pub(crate) fn new(
        id: SubscriptionId,
        path: String,
        registry: Weak<RefCell<SubscriptionRegistry>>,
    ) -> Self {
        Self { id, path, registry }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Remove this registration. Returns true only on the call that removed it.
    pub fn unsubscribe(&self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let removed = registry.borrow_mut().remove(&self.path, self.id);
        if removed {
            tracing::trace!(path = %self.path, subscription = %self.id, "Unsubscribed");
        }
        removed
    }

    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.borrow().contains(&self.path, self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Rc<SubscriberFn> {
        Rc::new(|_: &Change<'_>| -> CallbackResult { Ok(()) })
    }

    #[test]
    fn test_insert_keeps_registration_order() {
        let mut registry = SubscriptionRegistry::new();
        let a = registry.insert("charts", noop());
        let b = registry.insert("charts", noop());
        let ids: Vec<_> = registry.snapshot("charts").into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn test_remove_only_that_registration() {
        let mut registry = SubscriptionRegistry::new();
        let a = registry.insert("x", noop());
        let b = registry.insert("x", noop());
        assert!(registry.remove("x", a));
        assert!(!registry.remove("x", a));
        assert!(registry.contains("x", b));
        assert_eq!(registry.count("x"), 1);
    }

    #[test]
    fn test_paths_are_normalized() {
        let mut registry = SubscriptionRegistry::new();
        registry.insert("fitFile..metrics.", noop());
        assert_eq!(registry.count("fitFile.metrics"), 1);
    }

    #[test]
    fn test_related_paths() {
        let mut registry = SubscriptionRegistry::new();
        registry.insert("fitFile", noop());
        registry.insert("fitFile.metrics", noop());
        registry.insert("fitFile.metrics.recordCount", noop());
        registry.insert("fitFileOther", noop());

        assert_eq!(
            registry.ancestors_of("fitFile.metrics.recordCount"),
            vec!["fitFile.metrics".to_string(), "fitFile".to_string()]
        );
        assert_eq!(
            registry.descendants_of("fitFile"),
            vec![
                "fitFile.metrics".to_string(),
                "fitFile.metrics.recordCount".to_string()
            ]
        );
    }

    #[test]
    fn test_ids_survive_clear() {
        let mut registry = SubscriptionRegistry::new();
        let a = registry.insert("x", noop());
        registry.clear();
        let b = registry.insert("x", noop());
        assert_ne!(a, b);
        assert!(!registry.remove("x", a));
        assert_eq!(registry.total(), 1);
    }
}
