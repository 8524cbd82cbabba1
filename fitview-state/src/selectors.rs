//! Read-side API of the application
//!
//! Selectors never write. A missing or `null` slot reads as the selector's
//! default: `false` for flags, `{}` for objects.

use serde_json::{Map, Value};

use fitview_state_core::PathStore;

use crate::actions::RenderKind;
use crate::paths;

/// Value at `path`, treating `null` as absent.
pub(crate) fn present(store: &PathStore, path: &str) -> Option<Value> {
    store.get_state(path).filter(|value| !value.is_null())
}

pub(crate) fn flag(store: &PathStore, path: &str) -> bool {
    store.with_state(path, |value| value.and_then(Value::as_bool).unwrap_or(false))
}

pub(crate) fn object_or_empty(store: &PathStore, path: &str) -> Value {
    present(store, path).unwrap_or_else(|| Value::Object(Map::new()))
}

pub(crate) fn text(store: &PathStore, path: &str) -> Option<String> {
    store.with_state(path, |value| value.and_then(Value::as_str).map(String::from))
}

#[derive(Debug, Clone)]
pub struct AppSelectors {
    store: PathStore,
}

impl AppSelectors {
    pub fn new(store: PathStore) -> Self {
        Self { store }
    }

    pub fn active_tab(&self) -> String {
        text(&self.store, paths::UI_ACTIVE_TAB).unwrap_or_else(|| "summary".to_string())
    }

    pub fn current_theme(&self) -> String {
        text(&self.store, paths::UI_THEME).unwrap_or_else(|| "system".to_string())
    }

    pub fn has_data(&self) -> bool {
        present(&self.store, paths::GLOBAL_DATA).is_some()
    }

    pub fn global_data(&self) -> Option<Value> {
        present(&self.store, paths::GLOBAL_DATA)
    }

    pub fn is_loading(&self) -> bool {
        flag(&self.store, paths::IS_LOADING)
    }

    pub fn current_file(&self) -> Option<String> {
        text(&self.store, paths::CURRENT_FILE)
    }

    pub fn is_chart_rendered(&self) -> bool {
        flag(&self.store, paths::CHARTS_IS_RENDERED)
    }

    pub fn is_map_rendered(&self) -> bool {
        flag(&self.store, paths::MAP_IS_RENDERED)
    }

    pub fn is_table_rendered(&self) -> bool {
        flag(&self.store, paths::TABLES_IS_RENDERED)
    }

    pub fn are_chart_controls_visible(&self) -> bool {
        flag(&self.store, paths::CHARTS_CONTROLS_VISIBLE)
    }

    pub fn is_measurement_mode_active(&self) -> bool {
        flag(&self.store, paths::MAP_MEASUREMENT_MODE)
    }

    pub fn is_opening_file(&self) -> bool {
        flag(&self.store, paths::UI_IS_OPENING_FILE)
    }

    pub fn is_initialized(&self) -> bool {
        flag(&self.store, paths::APP_INITIALIZED)
    }

    pub fn selected_lap(&self) -> Option<u64> {
        self.store
            .with_state(paths::UI_SELECTED_LAP, |value| value.and_then(Value::as_u64))
    }

    pub fn window_state(&self) -> Value {
        object_or_empty(&self.store, paths::UI_WINDOW_STATE)
    }

    pub fn performance_metrics(&self) -> Value {
        object_or_empty(&self.store, paths::PERFORMANCE)
    }

    /// Last recorded render time in milliseconds.
    pub fn render_time(&self, kind: RenderKind) -> Option<u64> {
        let path = format!("{}.{}", paths::PERFORMANCE_RENDER_TIMES, kind.as_str());
        self.store.with_state(&path, |value| value.and_then(Value::as_u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_on_empty_store() {
        let selectors = AppSelectors::new(PathStore::new());
        assert_eq!(selectors.active_tab(), "summary");
        assert_eq!(selectors.current_theme(), "system");
        assert!(!selectors.has_data());
        assert!(!selectors.is_loading());
        assert!(!selectors.is_chart_rendered());
        assert_eq!(selectors.current_file(), None);
        assert_eq!(selectors.selected_lap(), None);
        assert_eq!(selectors.window_state(), json!({}));
        assert_eq!(selectors.performance_metrics(), json!({}));
        assert_eq!(selectors.render_time(RenderKind::Map), None);
    }

    #[test]
    fn test_null_reads_as_default() {
        let store = PathStore::new();
        store.set("ui.theme", Value::Null);
        store.set("globalData", Value::Null);
        store.set("ui.windowState", Value::Null);
        let selectors = AppSelectors::new(store);
        assert_eq!(selectors.current_theme(), "system");
        assert!(!selectors.has_data());
        assert_eq!(selectors.window_state(), json!({}));
    }

    #[test]
    fn test_reads_written_values() {
        let store = PathStore::new();
        store.set("ui.activeTab", json!("laps"));
        store.set("globalData", json!({"recordMesgs": []}));
        store.set("currentFile", json!("ride.fit"));
        store.set("ui.selectedLap", json!(2));
        store.set("performance.renderTimes.table", json!(7));
        let selectors = AppSelectors::new(store);
        assert_eq!(selectors.active_tab(), "laps");
        assert!(selectors.has_data());
        assert_eq!(selectors.current_file().as_deref(), Some("ride.fit"));
        assert_eq!(selectors.selected_lap(), Some(2));
        assert_eq!(selectors.render_time(RenderKind::Table), Some(7));
    }
}
