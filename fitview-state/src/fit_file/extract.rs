//! Summaries pulled from the first message of each FIT message list
//!
//! Decoded files use the FIT profile's snake_case field names; the
//! summaries are camelCase so they can be written straight into state.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ProcessingError;

/// Message lists the processing pipeline reads.
pub(crate) const MESSAGE_FIELDS: [&str; 5] = [
    "recordMesgs",
    "activityMesgs",
    "deviceInfoMesgs",
    "sessionMesgs",
    "fileIdMesgs",
];

/// Check that `data` is an object and that every known message list is an array.
pub(crate) fn check_shape(data: &Value) -> Result<(), ProcessingError> {
    let fields = data.as_object().ok_or(ProcessingError::NotAnObject)?;
    for field in MESSAGE_FIELDS {
        match fields.get(field) {
            None | Some(Value::Null) | Some(Value::Array(_)) => {}
            Some(_) => return Err(ProcessingError::NotAnArray { field }),
        }
    }
    Ok(())
}

fn first_message<'a>(data: &'a Value, field: &str) -> Option<&'a Map<String, Value>> {
    data.get(field)?.as_array()?.first()?.as_object()
}

fn number(message: &Map<String, Value>, field: &str) -> Option<f64> {
    message.get(field).and_then(Value::as_f64)
}

fn integer(message: &Map<String, Value>, field: &str) -> Option<u64> {
    message.get(field).and_then(Value::as_u64)
}

/// Strings as-is; numbers (unresolved enum values) in decimal form.
fn label(message: &Map<String, Value>, field: &str) -> Option<String> {
    match message.get(field)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn raw(message: &Map<String, Value>, field: &str) -> Option<Value> {
    message.get(field).filter(|value| !value.is_null()).cloned()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_timestamp: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_timer_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_sessions: Option<u64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub software_version: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware_version: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sport: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_sport: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_elapsed_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_timer_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_calories: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_ascent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_descent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_heart_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_heart_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_power: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_power: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_cadence: Option<f64>,
}

/// `None` when `activityMesgs` is absent or empty.
pub fn extract_activity_info(data: &Value) -> Option<ActivityInfo> {
    let message = first_message(data, "activityMesgs")?;
    Some(ActivityInfo {
        timestamp: raw(message, "timestamp"),
        local_timestamp: raw(message, "local_timestamp"),
        total_timer_time: number(message, "total_timer_time"),
        num_sessions: integer(message, "num_sessions"),
        activity_type: label(message, "type"),
        event: label(message, "event"),
        event_type: label(message, "event_type"),
    })
}

/// `None` when `deviceInfoMesgs` is absent or empty.
pub fn extract_device_info(data: &Value) -> Option<DeviceInfo> {
    let message = first_message(data, "deviceInfoMesgs")?;
    Some(DeviceInfo {
        manufacturer: label(message, "manufacturer"),
        product: label(message, "product"),
        product_name: label(message, "product_name"),
        serial_number: integer(message, "serial_number"),
        software_version: number(message, "software_version"),
        hardware_version: number(message, "hardware_version"),
    })
}

/// `None` when `sessionMesgs` is absent or empty.
pub fn extract_session_info(data: &Value) -> Option<SessionInfo> {
    let message = first_message(data, "sessionMesgs")?;
    Some(SessionInfo {
        sport: label(message, "sport"),
        sub_sport: label(message, "sub_sport"),
        start_time: raw(message, "start_time"),
        total_elapsed_time: number(message, "total_elapsed_time"),
        total_timer_time: number(message, "total_timer_time"),
        total_distance: number(message, "total_distance"),
        total_calories: number(message, "total_calories"),
        total_ascent: number(message, "total_ascent"),
        total_descent: number(message, "total_descent"),
        avg_speed: number(message, "avg_speed"),
        max_speed: number(message, "max_speed"),
        avg_heart_rate: number(message, "avg_heart_rate"),
        max_heart_rate: number(message, "max_heart_rate"),
        avg_power: number(message, "avg_power"),
        max_power: number(message, "max_power"),
        avg_cadence: number(message, "avg_cadence"),
    })
}

/// Length of `recordMesgs`, or 0 when missing.
pub fn get_record_count(data: Option<&Value>) -> usize {
    data.and_then(|data| data.get("recordMesgs"))
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}
