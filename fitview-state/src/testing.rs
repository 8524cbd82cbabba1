//! Test doubles for the application layer
//!
//! Re-exports the store-level helpers from `fitview_state_core::testing`.

use std::cell::{Cell, RefCell};
use std::time::Duration;

use serde_json::Value;

use crate::backend::{FileLoadingBackend, LoadContext, LoadFuture};
use crate::clock::Clock;
use crate::error::LoadError;
use crate::notify::{NotificationLevel, Notifier};

pub use fitview_state_core::testing::*;

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
    pub duration: Option<Duration>,
}

/// Notifier that keeps every notification.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: RefCell<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.borrow().clone()
    }

    pub fn messages(&self) -> Vec<(String, NotificationLevel)> {
        self.notifications
            .borrow()
            .iter()
            .map(|n| (n.message.clone(), n.level))
            .collect()
    }

    pub fn levels(&self) -> Vec<NotificationLevel> {
        self.notifications.borrow().iter().map(|n| n.level).collect()
    }

    pub fn len(&self) -> usize {
        self.notifications.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.notifications.borrow_mut().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, level: NotificationLevel, duration: Option<Duration>) {
        self.notifications.borrow_mut().push(Notification {
            message: message.to_string(),
            level,
            duration,
        });
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: Cell<u64>,
}

impl ManualClock {
    pub fn new(now_ms: u64) -> Self {
        Self {
            now_ms: Cell::new(now_ms),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now_ms.set(now_ms);
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.set(self.now_ms.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }
}

/// One call received by a [`ScriptedBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    StartFileLoading(String),
    HandleFileLoaded { data: Value, context: LoadContext },
    HandleFileLoadingError(LoadError),
    IsLoading,
    ClearFileState,
}

/// [`FileLoadingBackend`] that records calls and touches no state.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    calls: RefCell<Vec<BackendCall>>,
    failure: RefCell<Option<LoadError>>,
    loading: Cell<bool>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `handle_file_loaded` fail with `error`.
    pub fn fail_with(self, error: LoadError) -> Self {
        *self.failure.borrow_mut() = Some(error);
        self
    }

    /// Value reported by `is_loading`.
    pub fn set_loading(&self, loading: bool) {
        self.loading.set(loading);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.borrow().clone()
    }

    /// Method names of recorded calls, in order.
    pub fn call_names(&self) -> Vec<&'static str> {
        self.calls
            .borrow()
            .iter()
            .map(|call| match call {
                BackendCall::StartFileLoading(_) => "start_file_loading",
                BackendCall::HandleFileLoaded { .. } => "handle_file_loaded",
                BackendCall::HandleFileLoadingError(_) => "handle_file_loading_error",
                BackendCall::IsLoading => "is_loading",
                BackendCall::ClearFileState => "clear_file_state",
            })
            .collect()
    }

    fn record(&self, call: BackendCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl FileLoadingBackend for ScriptedBackend {
    fn start_file_loading(&self, file_path: &str) {
        self.record(BackendCall::StartFileLoading(file_path.to_string()));
    }

    fn handle_file_loaded(&self, raw_data: Value, context: LoadContext) -> LoadFuture<'_> {
        self.record(BackendCall::HandleFileLoaded {
            data: raw_data,
            context,
        });
        let result = match self.failure.borrow().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        };
        Box::pin(async move {
            tokio::task::yield_now().await;
            result
        })
    }

    fn handle_file_loading_error(&self, error: &LoadError) {
        self.record(BackendCall::HandleFileLoadingError(error.clone()));
    }

    fn is_loading(&self) -> bool {
        self.record(BackendCall::IsLoading);
        self.loading.get()
    }

    fn clear_file_state(&self) {
        self.record(BackendCall::ClearFileState);
    }
}
