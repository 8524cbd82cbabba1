//! Data-quality scoring for decoded FIT files

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Share of records (0..=100) carrying each metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coverage {
    pub gps: u32,
    pub heart_rate: u32,
    pub power: u32,
    pub cadence: u32,
    pub altitude: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuality {
    #[serde(rename = "hasGPS")]
    pub has_gps: bool,
    pub has_heart_rate: bool,
    pub has_power: bool,
    pub has_cadence: bool,
    pub has_altitude: bool,
    /// Rounded percentage of records with a position fix or a heart rate.
    pub completeness: u32,
    pub coverage: Coverage,
    pub issues: Vec<String>,
}

impl DataQuality {
    fn with_issue(issue: &str) -> Self {
        Self {
            issues: vec![issue.to_string()],
            ..Self::default()
        }
    }
}

#[derive(Default)]
struct Counts {
    gps: usize,
    heart_rate: usize,
    power: usize,
    cadence: usize,
    altitude: usize,
    basic: usize,
}

fn has(record: &Value, field: &str) -> bool {
    record.get(field).is_some_and(|value| !value.is_null())
}

fn percent(count: usize, total: usize) -> u32 {
    (100.0 * count as f64 / total as f64).round() as u32
}

/// Score `data` by scanning every entry of its `recordMesgs` once.
///
/// # Example
///
/// ```
/// use fitview_state::fit_file::assess_data_quality;
/// use serde_json::json;
///
/// let data = json!({"recordMesgs": [
///     {"position_lat": 1, "position_long": 2, "heart_rate": 120},
///     {"cadence": 80},
///     {"power": 200, "altitude": 300},
/// ]});
/// let quality = assess_data_quality(Some(&data), 10);
/// assert!(quality.has_gps && quality.has_power);
/// assert_eq!(quality.completeness, 33);
/// assert_eq!(quality.coverage.heart_rate, 33);
/// ```
pub fn assess_data_quality(data: Option<&Value>, short_activity_threshold: usize) -> DataQuality {
    let Some(records) = data
        .and_then(|data| data.get("recordMesgs"))
        .and_then(Value::as_array)
    else {
        return DataQuality::with_issue("No record data found");
    };
    if records.is_empty() {
        return DataQuality::with_issue("No records in file");
    }

    let mut counts = Counts::default();
    for record in records {
        let gps = has(record, "position_lat") && has(record, "position_long");
        let heart_rate = has(record, "heart_rate");
        counts.gps += usize::from(gps);
        counts.heart_rate += usize::from(heart_rate);
        counts.power += usize::from(has(record, "power"));
        counts.cadence += usize::from(has(record, "cadence"));
        counts.altitude += usize::from(has(record, "altitude") || has(record, "enhanced_altitude"));
        counts.basic += usize::from(gps || heart_rate);
    }

    let total = records.len();
    let mut issues = Vec::new();
    if total < short_activity_threshold {
        issues.push("Very short activity".to_string());
    }
    if counts.gps == 0 {
        issues.push("No GPS data".to_string());
    }
    if counts.heart_rate == 0 {
        issues.push("No heart rate data".to_string());
    }

    DataQuality {
        has_gps: counts.gps > 0,
        has_heart_rate: counts.heart_rate > 0,
        has_power: counts.power > 0,
        has_cadence: counts.cadence > 0,
        has_altitude: counts.altitude > 0,
        completeness: percent(counts.basic, total),
        coverage: Coverage {
            gps: percent(counts.gps, total),
            heart_rate: percent(counts.heart_rate, total),
            power: percent(counts.power, total),
            cadence: percent(counts.cadence, total),
            altitude: percent(counts.altitude, total),
        },
        issues,
    }
}
