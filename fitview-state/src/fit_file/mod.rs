//! Fit-file lifecycle controller
//!
//! [`FitFileStateManager`] owns the `fitFile.*` slots. It drives a file
//! through `Idle -> Loading -> Loaded -> Processed` (or one of the error
//! phases), and reacts to store changes through subscriptions wired at
//! construction:
//!
//! | path                     | reaction                                     |
//! |--------------------------|----------------------------------------------|
//! | `globalData`             | process and validate the new data            |
//! | `fitFile.processedData`  | merge a summary into `fitFile.metrics`       |
//! | `fitFile.loadingProgress`| show progress in `ui.loadingIndicator`       |
//! | `fitFile.loaded`         | hide the indicator, stamp `lastLoadedAt`     |
//! | `fitFile.loadingError`   | hide the indicator                           |

mod extract;
mod quality;
mod selectors;

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use fitview_state_core::{CallbackResult, Change, ChangeOptions, PathStore, Subscription};

use crate::actions::AppActions;
use crate::backend::{FileLoadingBackend, LoadContext, LoadFuture};
use crate::error::{LoadError, ProcessingError};
use crate::notify::NotificationLevel;
use crate::paths;
use crate::paths::fit_file as slots;
use crate::selectors::{flag, text};

pub use extract::{
    extract_activity_info, extract_device_info, extract_session_info, get_record_count,
    ActivityInfo, DeviceInfo, SessionInfo,
};
pub use quality::{assess_data_quality, Coverage, DataQuality};
pub use selectors::{FilePhase, FitFileSelectors};

/// What `fitFile.processedData` holds after a successful pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedData {
    pub record_count: usize,
    pub data_quality: DataQuality,
    pub activity_info: Option<ActivityInfo>,
    pub device_info: Option<DeviceInfo>,
    pub session_info: Option<SessionInfo>,
}

/// What `fitFile.validation` holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

fn source(operation: &str) -> ChangeOptions {
    ChangeOptions::source(format!("FitFileStateManager.{operation}"))
}

struct ManagerInner {
    store: PathStore,
    actions: AppActions,
    subscriptions: RefCell<Vec<Subscription>>,
}

impl Drop for ManagerInner {
    fn drop(&mut self) {
        for subscription in self.subscriptions.get_mut().drain(..) {
            subscription.unsubscribe();
        }
    }
}

/// Handle to the fit-file controller. Clones share one controller.
///
/// Dropping the last handle removes the store subscriptions, as does
/// [`dispose`](Self::dispose).
#[derive(Clone)]
pub struct FitFileStateManager {
    inner: Rc<ManagerInner>,
}

impl fmt::Debug for FitFileStateManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FitFileStateManager")
            .field("subscriptions", &self.inner.subscriptions.borrow().len())
            .finish()
    }
}

impl FitFileStateManager {
    /// Create the controller and wire its store subscriptions.
    ///
    /// `actions` is used for the cross-cutting writes of a load; its backend,
    /// if any, is never called.
    pub fn new(actions: AppActions) -> Self {
        let manager = Self {
            inner: Rc::new(ManagerInner {
                store: actions.store().clone(),
                actions,
                subscriptions: RefCell::new(Vec::new()),
            }),
        };
        manager.wire_subscriptions();
        manager
    }

    pub fn store(&self) -> &PathStore {
        &self.inner.store
    }

    fn wire_subscriptions(&self) {
        let subscriptions = vec![
            self.watch(paths::GLOBAL_DATA, |manager, change| {
                if let Some(data) = change.value() {
                    // Failures are recorded in fitFile.processingError.
                    let _ = manager.process_file_data(data);
                    manager.validate_file_data(Some(data));
                }
                Ok(())
            }),
            self.watch(slots::PROCESSED_DATA, |manager, change| {
                if let Some(value) = change.value() {
                    let processed: ProcessedData = serde_json::from_value(value.clone())?;
                    manager.update_file_metrics(&processed);
                }
                Ok(())
            }),
            self.watch(slots::LOADING_PROGRESS, |manager, change| {
                if let Some(progress) = change.value().and_then(Value::as_f64) {
                    manager.update_loading_progress(progress.clamp(0.0, 100.0).round() as u32);
                }
                Ok(())
            }),
            self.watch(slots::LOADED, |manager, change| {
                if change.value().and_then(Value::as_bool) == Some(true) {
                    let options = source("onLoaded");
                    let store = manager.store();
                    store.update_state(
                        paths::UI_LOADING_INDICATOR,
                        json!({"active": false}),
                        options.clone(),
                    );
                    let now = manager.inner.actions.clock().now_ms();
                    store.set_state(slots::LAST_LOADED_AT, now, options);
                }
                Ok(())
            }),
            self.watch(slots::LOADING_ERROR, |manager, change| {
                if change.value().is_some() {
                    manager.store().update_state(
                        paths::UI_LOADING_INDICATOR,
                        json!({"active": false}),
                        source("onLoadingError"),
                    );
                }
                Ok(())
            }),
        ];
        self.inner.subscriptions.borrow_mut().extend(subscriptions);
    }

    fn watch<F>(&self, path: &str, on_change: F) -> Subscription
    where
        F: Fn(&FitFileStateManager, &Change<'_>) -> CallbackResult + 'static,
    {
        let inner: Weak<ManagerInner> = Rc::downgrade(&self.inner);
        self.inner.store.subscribe(path, move |change| match inner.upgrade() {
            Some(inner) => on_change(&FitFileStateManager { inner }, change),
            None => Ok(()),
        })
    }

    /// Remove every subscription wired by [`new`](Self::new).
    pub fn dispose(&self) {
        let subscriptions = std::mem::take(&mut *self.inner.subscriptions.borrow_mut());
        for subscription in &subscriptions {
            subscription.unsubscribe();
        }
        tracing::debug!(count = subscriptions.len(), "Fit-file manager disposed");
    }

    fn notify(&self, message: &str, level: NotificationLevel) {
        let config = self.inner.actions.config();
        let duration = match level {
            NotificationLevel::Success => Some(config.success_duration()),
            NotificationLevel::Error => Some(config.error_duration()),
            NotificationLevel::Info | NotificationLevel::Warning => None,
        };
        self.inner.actions.notifier().notify(message, level, duration);
    }

    pub fn start_file_loading(&self, file_path: &str) {
        tracing::info!(file = file_path, "Loading file");
        let options = source("startFileLoading");
        let store = self.store();
        store.set_state(slots::IS_LOADING, true, options.clone());
        store.set_state(slots::CURRENT_FILE, file_path, options.clone());
        store.set_state(slots::LOADING_PROGRESS, 0, options);
    }

    /// Publish decoded data and let the subscriptions derive the rest.
    ///
    /// `raw_data` must be a JSON object.
    pub async fn handle_file_loaded(
        &self,
        raw_data: Value,
        context: LoadContext,
    ) -> Result<(), LoadError> {
        if !raw_data.is_object() {
            return Err(LoadError::InvalidData(
                "decoded file data must be a JSON object".to_string(),
            ));
        }

        let store = self.store();
        let file_path = context
            .file_path
            .clone()
            .or_else(|| text(store, slots::CURRENT_FILE))
            .unwrap_or_default();
        let options = match &context.source {
            Some(origin) => source("handleFileLoaded").with("origin", origin.as_str()),
            None => source("handleFileLoaded"),
        };

        store.set_state(slots::IS_LOADING, false, options.clone());
        store.set_state(slots::LOADING_PROGRESS, 100, options.clone());
        store.set_state(slots::LOADING_ERROR, Value::Null, options.clone());
        store.set_state(slots::RAW_DATA, raw_data.clone(), options.clone());

        let record_count = get_record_count(Some(&raw_data));
        self.inner.actions.commit_loaded_file(raw_data, &file_path);
        store.set_state(slots::LOADED, true, options);

        tracing::info!(file = %file_path, record_count, "File loaded");
        self.notify("File loaded successfully", NotificationLevel::Success);
        Ok(())
    }

    pub fn handle_file_loading_error(&self, error: &LoadError) {
        tracing::error!(error = %error, "File loading failed");
        let options = source("handleFileLoadingError");
        self.store()
            .set_state(slots::IS_LOADING, false, options.clone());
        self.store()
            .set_state(slots::LOADING_ERROR, error.to_string(), options);
        self.notify(
            &format!("Failed to load file: {error}"),
            NotificationLevel::Error,
        );
    }

    pub fn is_loading(&self) -> bool {
        flag(self.store(), slots::IS_LOADING)
    }

    /// Reset every `fitFile.*` slot.
    pub fn clear_file_state(&self) {
        self.store().batch(
            &[
                (slots::IS_LOADING, json!(false)),
                (slots::CURRENT_FILE, Value::Null),
                (slots::RAW_DATA, Value::Null),
                (slots::PROCESSED_DATA, Value::Null),
                (slots::VALIDATION, Value::Null),
                (slots::METRICS, json!({})),
                (slots::LOADING_ERROR, Value::Null),
                (slots::PROCESSING_ERROR, Value::Null),
                (slots::LOADED, json!(false)),
            ],
            source("clearFileState"),
        );
        tracing::info!("File state cleared");
    }

    /// Derive [`ProcessedData`] and write it to `fitFile.processedData`.
    ///
    /// On failure the message goes to `fitFile.processingError` instead; the
    /// error is also returned for callers that want it.
    pub fn process_file_data(&self, raw_data: &Value) -> Result<ProcessedData, ProcessingError> {
        let processed = self.build_processed(raw_data).and_then(|processed| {
            serde_json::to_value(&processed)
                .map(|value| (processed, value))
                .map_err(|error| ProcessingError::Serialize(error.to_string()))
        });

        let options = source("processFileData");
        match processed {
            Ok((processed, value)) => {
                self.store()
                    .set_state(slots::PROCESSING_ERROR, Value::Null, options.clone());
                self.store().set_state(slots::PROCESSED_DATA, value, options);
                tracing::debug!(
                    record_count = processed.record_count,
                    completeness = processed.data_quality.completeness,
                    "File processed"
                );
                Ok(processed)
            }
            Err(error) => {
                tracing::warn!(error = %error, "File processing failed");
                self.store()
                    .set_state(slots::PROCESSING_ERROR, error.to_string(), options);
                Err(error)
            }
        }
    }

    fn build_processed(&self, raw_data: &Value) -> Result<ProcessedData, ProcessingError> {
        extract::check_shape(raw_data)?;
        Ok(ProcessedData {
            record_count: get_record_count(Some(raw_data)),
            data_quality: self.assess_data_quality(Some(raw_data)),
            activity_info: extract_activity_info(raw_data),
            device_info: extract_device_info(raw_data),
            session_info: extract_session_info(raw_data),
        })
    }

    /// [`assess_data_quality`] with the configured short-activity threshold.
    pub fn assess_data_quality(&self, data: Option<&Value>) -> DataQuality {
        assess_data_quality(data, self.inner.actions.config().short_activity_threshold)
    }

    /// Merge a summary of `processed` into `fitFile.metrics`.
    pub fn update_file_metrics(&self, processed: &ProcessedData) {
        let quality = &processed.data_quality;
        self.store().update_state(
            slots::METRICS,
            json!({
                "recordCount": processed.record_count,
                "hasActivity": processed.activity_info.is_some(),
                "hasDevice": processed.device_info.is_some(),
                "hasSession": processed.session_info.is_some(),
                "dataQualityScore": quality.completeness,
                "quality": {
                    "hasGPS": quality.has_gps,
                    "hasHeartRate": quality.has_heart_rate,
                    "hasPower": quality.has_power,
                    "hasCadence": quality.has_cadence,
                    "hasAltitude": quality.has_altitude,
                    "issueCount": quality.issues.len(),
                },
            }),
            source("updateFileMetrics"),
        );
    }

    /// Show `progress` (capped at 100) in `ui.loadingIndicator`.
    pub fn update_loading_progress(&self, progress: u32) {
        self.store().update_state(
            paths::UI_LOADING_INDICATOR,
            json!({"active": true, "progress": progress.min(100)}),
            source("updateLoadingProgress"),
        );
    }

    /// Check `data` for the message lists a complete file carries.
    ///
    /// Missing session or file-id messages are warnings; the data stays
    /// valid. The result is also written to `fitFile.validation`.
    pub fn validate_file_data(&self, data: Option<&Value>) -> ValidationResult {
        let result = match data.filter(|data| !data.is_null()) {
            None => ValidationResult {
                is_valid: false,
                errors: vec!["No data provided".to_string()],
                warnings: Vec::new(),
            },
            Some(data) if !data.is_object() => ValidationResult {
                is_valid: false,
                errors: vec!["File data is not an object".to_string()],
                warnings: Vec::new(),
            },
            Some(data) => {
                let mut warnings = Vec::new();
                if !has_messages(data, "sessionMesgs") {
                    warnings.push("No session data found".to_string());
                }
                if !has_messages(data, "fileIdMesgs") {
                    warnings.push("No file ID information".to_string());
                }
                ValidationResult {
                    is_valid: true,
                    errors: Vec::new(),
                    warnings,
                }
            }
        };

        if !result.errors.is_empty() {
            self.notify(
                &format!("File validation failed: {}", result.errors.join(", ")),
                NotificationLevel::Error,
            );
        } else if !result.warnings.is_empty() {
            self.notify(
                &format!("File validation warnings: {}", result.warnings.join(", ")),
                NotificationLevel::Warning,
            );
        }

        match serde_json::to_value(&result) {
            Ok(value) => self
                .store()
                .set_state(slots::VALIDATION, value, source("validateFileData")),
            Err(error) => tracing::warn!(error = %error, "Could not store validation result"),
        }
        result
    }
}

fn has_messages(data: &Value, field: &str) -> bool {
    data.get(field)
        .and_then(Value::as_array)
        .is_some_and(|messages| !messages.is_empty())
}

impl FileLoadingBackend for FitFileStateManager {
    fn start_file_loading(&self, file_path: &str) {
        FitFileStateManager::start_file_loading(self, file_path);
    }

    fn handle_file_loaded(&self, raw_data: Value, context: LoadContext) -> LoadFuture<'_> {
        Box::pin(FitFileStateManager::handle_file_loaded(self, raw_data, context))
    }

    fn handle_file_loading_error(&self, error: &LoadError) {
        FitFileStateManager::handle_file_loading_error(self, error);
    }

    fn is_loading(&self) -> bool {
        FitFileStateManager::is_loading(self)
    }

    fn clear_file_state(&self) {
        FitFileStateManager::clear_file_state(self);
    }
}
