//! Application configuration
//!
//! Everything has a default, so an empty JSON object is a valid config file.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use fitview_state_core::{Result, StateError, StoreConfig};

fn default_tabs() -> Vec<String> {
    ["summary", "chart", "map", "table", "data", "zones", "laps", "settings"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_themes() -> Vec<String> {
    ["light", "dark", "system"].into_iter().map(String::from).collect()
}

/// # Example
///
/// ```
/// use fitview_state::AppConfig;
///
/// let config = AppConfig::from_json_str(r#"{"chart_render_debounce_ms": 100}"#).unwrap();
/// assert_eq!(config.chart_render_debounce().as_millis(), 100);
/// assert!(config.is_valid_tab("map"));
/// assert!(!config.is_valid_theme("sepia"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Accepted values for `ui.activeTab`.
    pub valid_tabs: Vec<String>,
    /// Accepted values for `ui.theme`.
    pub valid_themes: Vec<String>,
    /// Files with fewer records than this are flagged "Very short activity".
    pub short_activity_threshold: usize,
    pub success_notification_ms: u64,
    pub error_notification_ms: u64,
    pub chart_render_debounce_ms: u64,
    pub store: StoreConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            valid_tabs: default_tabs(),
            valid_themes: default_themes(),
            short_activity_threshold: 10,
            success_notification_ms: 3000,
            error_notification_ms: 5000,
            chart_render_debounce_ms: 250,
            store: StoreConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        check_set("valid_tabs", &self.valid_tabs)?;
        check_set("valid_themes", &self.valid_themes)
    }

    pub fn is_valid_tab(&self, tab: &str) -> bool {
        self.valid_tabs.iter().any(|t| t == tab)
    }

    pub fn is_valid_theme(&self, theme: &str) -> bool {
        self.valid_themes.iter().any(|t| t == theme)
    }

    pub fn success_duration(&self) -> Duration {
        Duration::from_millis(self.success_notification_ms)
    }

    pub fn error_duration(&self) -> Duration {
        Duration::from_millis(self.error_notification_ms)
    }

    pub fn chart_render_debounce(&self) -> Duration {
        Duration::from_millis(self.chart_render_debounce_ms)
    }
}

fn check_set(field: &str, values: &[String]) -> Result<()> {
    if values.is_empty() {
        return Err(StateError::InvalidConfig(format!("`{field}` must not be empty")));
    }
    let mut seen = HashSet::new();
    for value in values {
        if !seen.insert(value.as_str()) {
            return Err(StateError::InvalidConfig(format!(
                "`{field}` lists `{value}` more than once"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitview_state_core::NotifyPolicy;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.valid_tabs.len(), 8);
        assert_eq!(config.valid_themes, vec!["light", "dark", "system"]);
        assert_eq!(config.short_activity_threshold, 10);
        assert_eq!(config.success_duration(), Duration::from_secs(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = AppConfig::from_json_str(
            r#"{"valid_themes": ["light", "dark"], "store": {"notify_policy": "hierarchical"}}"#,
        )
        .unwrap();
        assert_eq!(config.valid_themes, vec!["light", "dark"]);
        assert!(config.is_valid_tab("laps"));
        assert_eq!(config.store.notify_policy, NotifyPolicy::Hierarchical);
    }

    #[test]
    fn test_rejects_empty_and_duplicate_sets() {
        let err = AppConfig::from_json_str(r#"{"valid_tabs": []}"#).unwrap_err();
        assert!(matches!(err, StateError::InvalidConfig(_)));

        let err = AppConfig::from_json_str(r#"{"valid_themes": ["dark", "dark"]}"#).unwrap_err();
        assert!(err.to_string().contains("`dark`"));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = AppConfig::from_json_str("{").unwrap_err();
        assert!(matches!(err, StateError::ConfigParse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, StateError::Io(_)));
    }
}
