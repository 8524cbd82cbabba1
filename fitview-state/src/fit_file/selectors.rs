//! Read-side API for the `fitFile.*` slots

use serde::Serialize;
use serde_json::Value;

use fitview_state_core::PathStore;

use crate::paths::fit_file as paths;
use crate::selectors::{flag, object_or_empty, present, text};

/// Where the current file is in its lifecycle, derived from `fitFile.*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FilePhase {
    Idle,
    Loading,
    Loaded,
    LoadError,
    Processed,
    ProcessingError,
}

#[derive(Debug, Clone)]
pub struct FitFileSelectors {
    store: PathStore,
}

impl FitFileSelectors {
    pub fn new(store: PathStore) -> Self {
        Self { store }
    }

    pub fn is_loading(&self) -> bool {
        flag(&self.store, paths::IS_LOADING)
    }

    pub fn is_loaded(&self) -> bool {
        flag(&self.store, paths::LOADED)
    }

    pub fn current_file(&self) -> Option<String> {
        text(&self.store, paths::CURRENT_FILE)
    }

    pub fn raw_data(&self) -> Option<Value> {
        present(&self.store, paths::RAW_DATA)
    }

    pub fn processed_data(&self) -> Option<Value> {
        present(&self.store, paths::PROCESSED_DATA)
    }

    pub fn validation(&self) -> Option<Value> {
        present(&self.store, paths::VALIDATION)
    }

    pub fn metrics(&self) -> Value {
        object_or_empty(&self.store, paths::METRICS)
    }

    pub fn loading_progress(&self) -> u32 {
        self.store.with_state(paths::LOADING_PROGRESS, |value| {
            value
                .and_then(Value::as_f64)
                .map_or(0, |progress| progress.clamp(0.0, 100.0).round() as u32)
        })
    }

    pub fn loading_error(&self) -> Option<String> {
        text(&self.store, paths::LOADING_ERROR)
    }

    pub fn processing_error(&self) -> Option<String> {
        text(&self.store, paths::PROCESSING_ERROR)
    }

    /// Raw data is present and validation passed.
    pub fn has_valid_data(&self) -> bool {
        let valid = self.store.with_state(paths::VALIDATION, |value| {
            value
                .and_then(|validation| validation.get("isValid"))
                .and_then(Value::as_bool)
                .unwrap_or(false)
        });
        valid && self.raw_data().is_some()
    }

    pub fn data_quality_score(&self) -> u32 {
        let path = format!("{}.dataQualityScore", paths::METRICS);
        self.store
            .with_state(&path, |value| value.and_then(Value::as_u64))
            .map_or(0, |score| score.min(100) as u32)
    }

    pub fn phase(&self) -> FilePhase {
        if self.is_loading() {
            FilePhase::Loading
        } else if self.loading_error().is_some() {
            FilePhase::LoadError
        } else if self.processing_error().is_some() {
            FilePhase::ProcessingError
        } else if self.processed_data().is_some() {
            FilePhase::Processed
        } else if self.is_loaded() || self.raw_data().is_some() {
            FilePhase::Loaded
        } else {
            FilePhase::Idle
        }
    }
}
