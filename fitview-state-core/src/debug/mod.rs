//! Debug and inspection utilities for the state store
//!
//! - **Change logging**: glob-filtered tracing and an in-memory ring buffer
//!   of recent writes ([`ChangeLogger`])
//! - **State inspection**: flatten the tree into titled sections
//!   ([`DebugState`])
//!
//! # Quick Start
//!
//! ```
//! use fitview_state_core::debug::{ChangeLogConfig, ChangeLogger, DebugState};
//! use fitview_state_core::PathStore;
//! use serde_json::json;
//!
//! let store = PathStore::new();
//! let logger = ChangeLogger::with_log(ChangeLogConfig::default());
//! store.use_middleware(logger.clone());
//!
//! store.set_state("fitFile.isLoading", json!(true), "Loader");
//!
//! for entry in logger.recent(5) {
//!     println!("{} {} <- {:?}", entry.elapsed_display(), entry.path, entry.source);
//! }
//! print!("{}", store.debug_text());
//! ```

mod change_logger;
mod state;

pub use change_logger::{
    summarize, ChangeFilter, ChangeLog, ChangeLogConfig, ChangeLogEntry, ChangeLogger,
};
pub use state::{DebugEntry, DebugSection, DebugState};
