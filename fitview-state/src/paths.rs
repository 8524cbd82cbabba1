//! Well-known state paths

pub const GLOBAL_DATA: &str = "globalData";
pub const CURRENT_FILE: &str = "currentFile";
pub const IS_LOADING: &str = "isLoading";

pub const CHARTS_IS_RENDERED: &str = "charts.isRendered";
pub const CHARTS_CONTROLS_VISIBLE: &str = "charts.controlsVisible";
pub const CHARTS_SETTINGS: &str = "charts.settings";

pub const MAP_IS_RENDERED: &str = "map.isRendered";
pub const MAP_MEASUREMENT_MODE: &str = "map.measurementMode";

pub const TABLES_IS_RENDERED: &str = "tables.isRendered";

pub const PERFORMANCE: &str = "performance";
pub const PERFORMANCE_RENDER_TIMES: &str = "performance.renderTimes";
pub const PERFORMANCE_LAST_LOAD_TIME: &str = "performance.lastLoadTime";

pub const APP_INITIALIZED: &str = "app.initialized";

pub const UI_ACTIVE_TAB: &str = "ui.activeTab";
pub const UI_THEME: &str = "ui.theme";
pub const UI_SELECTED_LAP: &str = "ui.selectedLap";
pub const UI_IS_OPENING_FILE: &str = "ui.isOpeningFile";
pub const UI_WINDOW_STATE: &str = "ui.windowState";
pub const UI_LOADING_INDICATOR: &str = "ui.loadingIndicator";

/// Paths under `fitFile.*`, owned by the fit-file state manager.
pub mod fit_file {
    pub const IS_LOADING: &str = "fitFile.isLoading";
    pub const CURRENT_FILE: &str = "fitFile.currentFile";
    pub const LOADING_PROGRESS: &str = "fitFile.loadingProgress";
    pub const RAW_DATA: &str = "fitFile.rawData";
    pub const PROCESSED_DATA: &str = "fitFile.processedData";
    pub const VALIDATION: &str = "fitFile.validation";
    pub const METRICS: &str = "fitFile.metrics";
    pub const LOADING_ERROR: &str = "fitFile.loadingError";
    pub const PROCESSING_ERROR: &str = "fitFile.processingError";
    pub const LOADED: &str = "fitFile.loaded";
    pub const LAST_LOADED_AT: &str = "fitFile.lastLoadedAt";
}
