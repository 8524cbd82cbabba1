//! fitview-state: application state for a FIT activity viewer
//!
//! Builds on the path-addressed store from `fitview-state-core` (re-exported
//! here) and adds the application layer:
//!
//! - [`AppActions`] / [`AppSelectors`]: write and read APIs over well-known paths
//! - [`FitFileStateManager`]: load, process and validate a decoded FIT file
//! - [`RenderScheduler`]: debounced chart re-rendering
//! - [`App`]: wires one store to all of the above
//!
//! Collaborators the host supplies are traits: [`Notifier`], [`Clock`] and
//! [`FileLoadingBackend`].
//!
//! # Example
//!
//! ```
//! use fitview_state::prelude::*;
//! use serde_json::json;
//!
//! let app = App::with_defaults();
//! assert!(app.actions().switch_tab("map"));
//! assert!(!app.actions().switch_tab("not-a-tab"));
//! assert_eq!(app.selectors().active_tab(), "map");
//!
//! let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! let data = json!({"recordMesgs": [{"heart_rate": 130}], "sessionMesgs": [{}], "fileIdMesgs": [{}]});
//! runtime.block_on(app.actions().load_file(data, "ride.fit")).unwrap();
//!
//! assert_eq!(app.fit_file_selectors().phase(), FilePhase::Processed);
//! assert_eq!(app.fit_file_selectors().data_quality_score(), 100);
//! ```

// Re-export everything from core
pub use fitview_state_core::*;

pub mod actions;
pub mod app;
pub mod backend;
pub mod clock;
pub mod config;
pub mod error;
pub mod fit_file;
pub mod notify;
pub mod paths;
pub mod render;
pub mod selectors;
pub mod testing;

pub use actions::{AppActions, RenderKind};
pub use app::App;
pub use backend::{FileLoadingBackend, LoadContext, LoadFuture};
pub use clock::{Clock, SystemClock};
pub use config::AppConfig;
pub use error::{LoadError, ProcessingError};
pub use fit_file::{
    DataQuality, FilePhase, FitFileSelectors, FitFileStateManager, ProcessedData,
    ValidationResult,
};
pub use notify::{NotificationLevel, Notifier, TracingNotifier};
pub use render::RenderScheduler;
pub use selectors::AppSelectors;

/// Prelude for convenient imports
pub mod prelude {
    pub use fitview_state_core::prelude::*;

    pub use crate::actions::{AppActions, RenderKind};
    pub use crate::app::App;
    pub use crate::backend::{FileLoadingBackend, LoadContext};
    pub use crate::clock::{Clock, SystemClock};
    pub use crate::config::AppConfig;
    pub use crate::error::LoadError;
    pub use crate::fit_file::{FilePhase, FitFileSelectors, FitFileStateManager};
    pub use crate::notify::{NotificationLevel, Notifier, TracingNotifier};
    pub use crate::render::RenderScheduler;
    pub use crate::selectors::AppSelectors;
}
