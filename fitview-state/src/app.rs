//! Composition root
//!
//! One [`App`] owns one store and everything wired to it. Tests build a
//! fresh `App` instead of resetting shared state.

use std::rc::Rc;

use fitview_state_core::debug::{ChangeLogConfig, ChangeLogger};
use fitview_state_core::{PathStore, Result};

use crate::actions::AppActions;
use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::fit_file::{FitFileSelectors, FitFileStateManager};
use crate::notify::{Notifier, TracingNotifier};
use crate::render::RenderScheduler;
use crate::selectors::AppSelectors;

#[derive(Debug)]
pub struct App {
    store: PathStore,
    config: Rc<AppConfig>,
    actions: AppActions,
    selectors: AppSelectors,
    fit_file: FitFileStateManager,
    fit_file_selectors: FitFileSelectors,
    change_log: ChangeLogger,
}

impl App {
    /// Validate `config` and wire a fresh store, manager and actions.
    pub fn new(
        config: AppConfig,
        notifier: Rc<dyn Notifier>,
        clock: Rc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::wire(Rc::new(config), notifier, clock))
    }

    /// Default config, tracing notifications and the system clock.
    pub fn with_defaults() -> Self {
        Self::wire(
            Rc::new(AppConfig::default()),
            Rc::new(TracingNotifier),
            Rc::new(SystemClock),
        )
    }

    fn wire(config: Rc<AppConfig>, notifier: Rc<dyn Notifier>, clock: Rc<dyn Clock>) -> Self {
        let store = PathStore::with_config(config.store.clone());
        let change_log = ChangeLogger::with_log(ChangeLogConfig::default());
        store.use_middleware(change_log.clone());

        let base_actions = AppActions::new(store.clone(), notifier, clock, config.clone());
        let fit_file = FitFileStateManager::new(base_actions.clone());
        let actions = base_actions.with_backend(Rc::new(fit_file.clone()));

        tracing::debug!(
            middleware = store.middleware_count(),
            subscriptions = store.total_subscriptions(),
            "App state initialized"
        );

        Self {
            selectors: AppSelectors::new(store.clone()),
            fit_file_selectors: FitFileSelectors::new(store.clone()),
            store,
            config,
            actions,
            fit_file,
            change_log,
        }
    }

    pub fn store(&self) -> &PathStore {
        &self.store
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn actions(&self) -> &AppActions {
        &self.actions
    }

    pub fn selectors(&self) -> &AppSelectors {
        &self.selectors
    }

    pub fn fit_file(&self) -> &FitFileStateManager {
        &self.fit_file
    }

    pub fn fit_file_selectors(&self) -> &FitFileSelectors {
        &self.fit_file_selectors
    }

    /// Recent writes recorded by the change logger.
    pub fn change_log(&self) -> &ChangeLogger {
        &self.change_log
    }

    /// A scheduler over the default chart paths with the configured debounce.
    pub fn render_scheduler(&self) -> RenderScheduler {
        RenderScheduler::with_default_paths(&self.store, self.config.chart_render_debounce())
    }

    /// Remove the manager's subscriptions.
    pub fn dispose(&self) {
        self.fit_file.dispose();
    }
}
