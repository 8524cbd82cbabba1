//! Application actions
//!
//! Every action is a short sequence of store writes tagged with an
//! `AppActions.*` source. I/O and rendering live in collaborators: the
//! [`Notifier`], the [`Clock`] and an optional [`FileLoadingBackend`].

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use fitview_state_core::{ChangeOptions, PathStore};

use crate::backend::{FileLoadingBackend, LoadContext};
use crate::clock::Clock;
use crate::config::AppConfig;
use crate::error::LoadError;
use crate::notify::{NotificationLevel, Notifier};
use crate::paths;

/// The three render targets timed under `performance.renderTimes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderKind {
    Chart,
    Map,
    Table,
}

impl RenderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RenderKind::Chart => "chart",
            RenderKind::Map => "map",
            RenderKind::Table => "table",
        }
    }

    fn slice(self) -> &'static str {
        match self {
            RenderKind::Chart => "charts",
            RenderKind::Map => "map",
            RenderKind::Table => "tables",
        }
    }
}

fn source(action: &str) -> ChangeOptions {
    ChangeOptions::source(format!("AppActions.{action}"))
}

/// Write-side API of the application.
///
/// Cheap to clone; clones share the store and collaborators.
#[derive(Clone)]
pub struct AppActions {
    store: PathStore,
    notifier: Rc<dyn Notifier>,
    clock: Rc<dyn Clock>,
    config: Rc<AppConfig>,
    backend: Option<Rc<dyn FileLoadingBackend>>,
}

impl fmt::Debug for AppActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppActions")
            .field("store", &self.store)
            .field("has_backend", &self.backend.is_some())
            .finish()
    }
}

impl AppActions {
    pub fn new(
        store: PathStore,
        notifier: Rc<dyn Notifier>,
        clock: Rc<dyn Clock>,
        config: Rc<AppConfig>,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            config,
            backend: None,
        }
    }

    /// Route [`load_file`](Self::load_file) and [`clear_data`](Self::clear_data)
    /// through `backend`.
    pub fn with_backend(mut self, backend: Rc<dyn FileLoadingBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    pub fn store(&self) -> &PathStore {
        &self.store
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub(crate) fn notifier(&self) -> &Rc<dyn Notifier> {
        &self.notifier
    }

    pub(crate) fn clock(&self) -> &Rc<dyn Clock> {
        &self.clock
    }

    fn notify(&self, message: &str, level: NotificationLevel, duration: Option<Duration>) {
        self.notifier.notify(message, level, duration);
    }

    /// Drop the loaded file and mark every view as not rendered.
    pub fn clear_data(&self) {
        self.store.batch(
            &[
                (paths::GLOBAL_DATA, Value::Null),
                (paths::CURRENT_FILE, Value::Null),
                (paths::CHARTS_IS_RENDERED, json!(false)),
                (paths::MAP_IS_RENDERED, json!(false)),
                (paths::TABLES_IS_RENDERED, json!(false)),
            ],
            source("clearData"),
        );

        if let Some(backend) = &self.backend {
            backend.clear_file_state();
        }

        self.notify("Data cleared", NotificationLevel::Info, None);
    }

    /// Publish decoded file data.
    ///
    /// With a backend the whole lifecycle is delegated to it and a failure is
    /// returned after the backend has reset its loading flag. Without one the
    /// top-level slots are written directly.
    pub async fn load_file(&self, file_data: Value, file_path: &str) -> Result<(), LoadError> {
        let Some(backend) = &self.backend else {
            self.load_file_inline(file_data, file_path);
            return Ok(());
        };

        backend.start_file_loading(file_path);
        let context = LoadContext::for_path(file_path).with_source("AppActions.loadFile");
        if let Err(error) = backend.handle_file_loaded(file_data, context).await {
            tracing::error!(file = file_path, error = %error, "File load failed");
            backend.handle_file_loading_error(&error);
            return Err(error);
        }

        if backend.is_loading() {
            tracing::warn!(file = file_path, "Backend still reports a load in progress");
        }
        Ok(())
    }

    fn load_file_inline(&self, file_data: Value, file_path: &str) {
        let options = source("loadFile");
        self.store.set_state(paths::IS_LOADING, true, options.clone());
        self.commit_loaded_file(file_data, file_path);
        self.store.set_state(paths::IS_LOADING, false, options);

        self.notify(
            "File loaded successfully",
            NotificationLevel::Success,
            Some(self.config.success_duration()),
        );
    }

    /// The top-level writes for a freshly loaded file, without touching
    /// `isLoading`, the backend or the notifier.
    pub fn commit_loaded_file(&self, file_data: Value, file_path: &str) {
        self.store.batch(
            &[
                (paths::GLOBAL_DATA, file_data),
                (paths::CURRENT_FILE, json!(file_path)),
                (paths::CHARTS_IS_RENDERED, json!(false)),
                (paths::MAP_IS_RENDERED, json!(false)),
                (paths::TABLES_IS_RENDERED, json!(false)),
                (paths::PERFORMANCE_LAST_LOAD_TIME, json!(self.clock.now_ms())),
            ],
            source("loadFile"),
        );
    }

    pub fn render_chart(&self, chart_data: Value, options: Value) {
        self.render(
            RenderKind::Chart,
            json!({"isRendered": true, "data": chart_data, "options": options}),
            "renderChart",
        );
    }

    pub fn render_map(&self, center: [f64; 2], zoom: f64) {
        self.render(
            RenderKind::Map,
            json!({"isRendered": true, "center": center, "zoom": zoom}),
            "renderMap",
        );
    }

    pub fn render_table(&self, table_config: Value) {
        self.render(
            RenderKind::Table,
            json!({"isRendered": true, "config": table_config}),
            "renderTable",
        );
    }

    /// Merge `fields` into the kind's slice and time how long the slice's
    /// subscribers took.
    fn render(&self, kind: RenderKind, fields: Value, action: &str) {
        let started = self.clock.now_ms();
        let options = source(action);
        self.store.update_state(kind.slice(), fields, options.clone());

        let elapsed = self.clock.now_ms().saturating_sub(started);
        tracing::debug!(kind = kind.as_str(), elapsed_ms = elapsed, "Rendered");
        self.store.update_state(
            paths::PERFORMANCE_RENDER_TIMES,
            json!({ kind.as_str(): elapsed }),
            options,
        );
    }

    pub fn select_lap(&self, lap_index: Option<usize>) {
        self.store
            .set_state(paths::UI_SELECTED_LAP, json!(lap_index), source("selectLap"));
    }

    pub fn set_file_opening(&self, is_opening: bool) {
        self.store
            .set_state(paths::UI_IS_OPENING_FILE, is_opening, source("setFileOpening"));
    }

    pub fn set_initialized(&self, initialized: bool) {
        self.store
            .set_state(paths::APP_INITIALIZED, initialized, source("setInitialized"));
    }

    /// Merge `window_state` into `ui.windowState`.
    pub fn update_window_state(&self, window_state: Value) {
        self.store
            .update_state(paths::UI_WINDOW_STATE, window_state, source("updateWindowState"));
    }

    /// Returns `false`, writing nothing, when `tab` is not a configured tab.
    pub fn switch_tab(&self, tab: &str) -> bool {
        if !self.config.is_valid_tab(tab) {
            tracing::debug!(tab, "Ignoring unknown tab");
            return false;
        }
        self.store.set_state(paths::UI_ACTIVE_TAB, tab, source("switchTab"));
        true
    }

    /// Returns `false`, writing nothing, when `theme` is not a configured theme.
    pub fn switch_theme(&self, theme: &str) -> bool {
        if !self.config.is_valid_theme(theme) {
            tracing::debug!(theme, "Ignoring unknown theme");
            return false;
        }
        self.store.set_state(paths::UI_THEME, theme, source("switchTheme"));
        true
    }

    pub fn toggle_chart_controls(&self) -> bool {
        self.toggle(paths::CHARTS_CONTROLS_VISIBLE, "toggleChartControls")
    }

    pub fn toggle_measurement_mode(&self) -> bool {
        self.toggle(paths::MAP_MEASUREMENT_MODE, "toggleMeasurementMode")
    }

    /// Write the negation of the flag at `path`; returns the new value.
    fn toggle(&self, path: &str, action: &str) -> bool {
        let current = self
            .store
            .with_state(path, |value| value.and_then(Value::as_bool).unwrap_or(false));
        self.store.set_state(path, !current, source(action));
        !current
    }
}
