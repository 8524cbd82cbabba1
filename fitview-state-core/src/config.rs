//! Store configuration

use serde::{Deserialize, Serialize};

/// Which subscribers hear about a write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyPolicy {
    /// Only subscribers registered on exactly the written path.
    #[default]
    Exact,
    /// Exact subscribers, then ancestors (nearest first), then descendants.
    Hierarchical,
}

/// Configuration for a [`PathStore`](crate::PathStore).
///
/// # Example
///
/// ```
/// use fitview_state_core::{NotifyPolicy, StoreConfig};
///
/// let config: StoreConfig = serde_json::from_str(r#"{"notify_policy": "hierarchical"}"#).unwrap();
/// assert_eq!(config.notify_policy, NotifyPolicy::Hierarchical);
/// assert!(!config.log_changes);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub notify_policy: NotifyPolicy,
    /// Install a [`LoggingMiddleware`](crate::LoggingMiddleware) that traces every commit.
    pub log_changes: bool,
}

impl StoreConfig {
    pub fn hierarchical() -> Self {
        Self {
            notify_policy: NotifyPolicy::Hierarchical,
            ..Self::default()
        }
    }
}
