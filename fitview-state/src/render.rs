//! Debounced chart re-rendering
//!
//! Bursts of writes to chart-relevant paths collapse into one render call
//! once the paths have been quiet for the debounce period.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use tokio::sync::Notify;

use fitview_state_core::{PathStore, Subscription};

use crate::paths;

/// Paths watched by [`RenderScheduler::with_default_paths`].
pub const DEFAULT_RENDER_PATHS: [&str; 3] =
    [paths::CHARTS_SETTINGS, paths::UI_THEME, paths::GLOBAL_DATA];

struct SchedulerState {
    wake: Notify,
    pending: Cell<usize>,
    renders: Cell<usize>,
    disposed: Cell<bool>,
    subscriptions: RefCell<Vec<Subscription>>,
}

impl Drop for SchedulerState {
    fn drop(&mut self) {
        for subscription in self.subscriptions.get_mut().drain(..) {
            subscription.unsubscribe();
        }
    }
}

/// Clones share one scheduler. Dropping the last clone unsubscribes.
#[derive(Clone)]
pub struct RenderScheduler {
    state: Rc<SchedulerState>,
    debounce: Duration,
}

impl fmt::Debug for RenderScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderScheduler")
            .field("debounce", &self.debounce)
            .field("pending", &self.pending())
            .field("renders", &self.render_count())
            .finish()
    }
}

impl RenderScheduler {
    pub fn new(store: &PathStore, watched: &[&str], debounce: Duration) -> Self {
        let state = Rc::new(SchedulerState {
            wake: Notify::new(),
            pending: Cell::new(0),
            renders: Cell::new(0),
            disposed: Cell::new(false),
            subscriptions: RefCell::new(Vec::new()),
        });

        let subscriptions = watched
            .iter()
            .map(|path| {
                let state = Rc::downgrade(&state);
                store.subscribe(path, move |_| {
                    if let Some(state) = state.upgrade() {
                        state.pending.set(state.pending.get() + 1);
                        state.wake.notify_one();
                    }
                    Ok(())
                })
            })
            .collect();
        *state.subscriptions.borrow_mut() = subscriptions;

        Self { state, debounce }
    }

    pub fn with_default_paths(store: &PathStore, debounce: Duration) -> Self {
        Self::new(store, &DEFAULT_RENDER_PATHS, debounce)
    }

    /// Changes seen since the last render.
    pub fn pending(&self) -> usize {
        self.state.pending.get()
    }

    pub fn render_count(&self) -> usize {
        self.state.renders.get()
    }

    pub fn is_disposed(&self) -> bool {
        self.state.disposed.get()
    }

    /// Call `render` once per quiet period after one or more changes.
    ///
    /// Returns after [`dispose`](Self::dispose). Changes made before `run`
    /// starts are not lost.
    pub async fn run<F: FnMut()>(&self, mut render: F) {
        loop {
            self.state.wake.notified().await;
            if self.is_disposed() {
                return;
            }

            loop {
                tokio::select! {
                    _ = self.state.wake.notified() => {
                        if self.is_disposed() {
                            return;
                        }
                    }
                    _ = tokio::time::sleep(self.debounce) => break,
                }
            }

            let coalesced = self.state.pending.replace(0);
            self.state.renders.set(self.state.renders.get() + 1);
            tracing::debug!(coalesced, "Re-rendering charts");
            render();
        }
    }

    /// Remove the subscriptions and stop [`run`](Self::run).
    pub fn dispose(&self) {
        if self.state.disposed.replace(true) {
            return;
        }
        for subscription in self.state.subscriptions.borrow_mut().drain(..) {
            subscription.unsubscribe();
        }
        self.state.wake.notify_one();
    }
}
