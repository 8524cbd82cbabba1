//! Pluggable file-loading lifecycle
//!
//! [`AppActions::load_file`](crate::AppActions::load_file) hands the loading
//! lifecycle to a [`FileLoadingBackend`] when one is configured, and falls
//! back to writing the top-level slots itself when none is.

use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use serde_json::Value;

use crate::error::LoadError;

/// Future returned by [`FileLoadingBackend::handle_file_loaded`].
pub type LoadFuture<'a> = Pin<Box<dyn Future<Output = Result<(), LoadError>> + 'a>>;

/// Where a loaded file came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadContext {
    pub file_path: Option<String>,
    pub source: Option<String>,
}

impl LoadContext {
    pub fn for_path(file_path: impl Into<String>) -> Self {
        Self {
            file_path: Some(file_path.into()),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

pub trait FileLoadingBackend {
    fn start_file_loading(&self, file_path: &str);

    /// Publish freshly decoded data. Resolves once every state write is done.
    fn handle_file_loaded(&self, raw_data: Value, context: LoadContext) -> LoadFuture<'_>;

    /// Reset the loading flag and tell the user the load failed.
    fn handle_file_loading_error(&self, error: &LoadError);

    fn is_loading(&self) -> bool;

    fn clear_file_state(&self);
}
