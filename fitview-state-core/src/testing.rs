//! Test utilities for code built on the store
//!
//! - [`WriteRecorder`]: middleware that records every write handed to
//!   `set_state`/`update_state`, in order
//! - Assertion macros for verifying recorded writes
//!
//! # Example
//!
//! ```
//! use fitview_state_core::testing::WriteRecorder;
//! use fitview_state_core::{assert_not_written, assert_written, count_written, PathStore};
//! use serde_json::json;
//!
//! let store = PathStore::new();
//! let recorder = WriteRecorder::install(&store);
//!
//! store.set_state("ui.activeTab", json!("map"), "Tabs");
//! store.set_state("ui.activeTab", json!("map"), "Tabs");
//!
//! let writes = recorder.drain();
//! assert_written!(writes, "ui.activeTab", json!("map"));
//! assert_not_written!(writes, "ui.theme");
//! assert_eq!(count_written!(writes, "ui.activeTab"), 2);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use crate::error::CallbackResult;
use crate::middleware::Middleware;
use crate::store::{ChangeOptions, PathStore};

/// One write as seen by a [`WriteRecorder`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedWrite {
    pub path: String,
    /// Candidate value at the recorder's position in the chain. For
    /// `update_state` this is the merged object.
    pub value: Value,
    pub source: Option<String>,
}

/// Middleware that records writes without changing them.
///
/// Install it first to see values before any other middleware runs. Clones
/// share the same record.
#[derive(Debug, Clone, Default)]
pub struct WriteRecorder {
    writes: Rc<RefCell<Vec<RecordedWrite>>>,
}

impl WriteRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recorder and append it to `store`'s middleware chain.
    pub fn install(store: &PathStore) -> Self {
        let recorder = Self::new();
        store.use_middleware(recorder.clone());
        recorder
    }

    /// Copy of everything recorded so far.
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.borrow().clone()
    }

    /// Take everything recorded so far.
    pub fn drain(&self) -> Vec<RecordedWrite> {
        std::mem::take(&mut *self.writes.borrow_mut())
    }

    /// Paths written, in order.
    pub fn paths(&self) -> Vec<String> {
        self.writes.borrow().iter().map(|w| w.path.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.writes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.writes.borrow_mut().clear();
    }
}

impl Middleware for WriteRecorder {
    fn apply(
        &self,
        path: &str,
        value: &Value,
        _old_value: Option<&Value>,
        options: &ChangeOptions,
    ) -> CallbackResult<Option<Value>> {
        self.writes.borrow_mut().push(RecordedWrite {
            path: path.to_string(),
            value: value.clone(),
            source: options.source.clone(),
        });
        Ok(None)
    }

    fn name(&self) -> &str {
        "write-recorder"
    }
}

/// Assert that a path was written (optionally with a specific value).
///
/// # Example
///
/// ```ignore
/// let writes = recorder.drain();
/// assert_written!(writes, "fitFile.isLoading");
/// assert_written!(writes, "fitFile.isLoading", json!(false));
/// ```
#[macro_export]
macro_rules! assert_written {
    ($writes:expr, $path:expr) => {
        assert!(
            $writes.iter().any(|w| w.path == $path),
            "Expected a write to `{}`, but got: {:?}",
            $path,
            $writes.iter().map(|w| w.path.as_str()).collect::<Vec<_>>()
        );
    };
    ($writes:expr, $path:expr, $value:expr) => {
        assert!(
            $writes.iter().any(|w| w.path == $path && w.value == $value),
            "Expected `{}` to be written with {}, but got: {:?}",
            $path,
            $value,
            $writes
                .iter()
                .filter(|w| w.path == $path)
                .map(|w| &w.value)
                .collect::<Vec<_>>()
        );
    };
}

/// Assert that a path was NOT written.
///
/// # Example
///
/// ```ignore
/// let writes = recorder.drain();
/// assert_not_written!(writes, "ui.activeTab");
/// ```
#[macro_export]
macro_rules! assert_not_written {
    ($writes:expr, $path:expr) => {
        assert!(
            !$writes.iter().any(|w| w.path == $path),
            "Expected no write to `{}`, but it was written: {:?}",
            $path,
            $writes
                .iter()
                .filter(|w| w.path == $path)
                .map(|w| &w.value)
                .collect::<Vec<_>>()
        );
    };
}

/// Find the first write to a path.
///
/// # Example
///
/// ```ignore
/// let write = find_written!(writes, "fitFile.loadingError");
/// assert_eq!(write.map(|w| w.value.clone()), Some(json!("boom")));
/// ```
#[macro_export]
macro_rules! find_written {
    ($writes:expr, $path:expr) => {
        $writes.iter().find(|w| w.path == $path)
    };
}

/// Count writes to a path.
///
/// # Example
///
/// ```ignore
/// assert_eq!(count_written!(writes, "isLoading"), 2);
/// ```
#[macro_export]
macro_rules! count_written {
    ($writes:expr, $path:expr) => {
        $writes.iter().filter(|w| w.path == $path).count()
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recorder_captures_writes_in_order() {
        let store = PathStore::new();
        let recorder = WriteRecorder::install(&store);

        store.set_state("a", json!(1), "First");
        store.update_state("b", json!({"k": true}), "Second");

        let writes = recorder.drain();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].path, "a");
        assert_eq!(writes[0].source.as_deref(), Some("First"));
        assert_eq!(writes[1].value, json!({"k": true}));
        assert!(recorder.is_empty());
    }

    #[test]
    fn test_assert_macros() {
        let store = PathStore::new();
        let recorder = WriteRecorder::install(&store);
        store.set("isLoading", json!(true));
        store.set("isLoading", json!(false));

        let writes = recorder.writes();
        assert_written!(writes, "isLoading");
        assert_written!(writes, "isLoading", json!(false));
        assert_not_written!(writes, "globalData");
        assert_eq!(count_written!(writes, "isLoading"), 2);

        let first = find_written!(writes, "isLoading");
        assert_eq!(first.map(|w| w.value.clone()), Some(json!(true)));
        assert_eq!(recorder.paths(), vec!["isLoading", "isLoading"]);
    }
}
