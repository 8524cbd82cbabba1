//! User-facing notifications

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationLevel::Info => "info",
            NotificationLevel::Success => "success",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Error => "error",
        }
    }
}

/// Host-supplied sink for messages shown to the user.
///
/// Closures with the matching signature implement this trait.
pub trait Notifier {
    fn notify(&self, message: &str, level: NotificationLevel, duration: Option<Duration>);
}

impl<F> Notifier for F
where
    F: Fn(&str, NotificationLevel, Option<Duration>),
{
    fn notify(&self, message: &str, level: NotificationLevel, duration: Option<Duration>) {
        self(message, level, duration)
    }
}

/// Notifier that only writes to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, level: NotificationLevel, duration: Option<Duration>) {
        let duration_ms = duration.map(|d| d.as_millis() as u64);
        match level {
            NotificationLevel::Error => tracing::error!(?duration_ms, "{message}"),
            NotificationLevel::Warning => tracing::warn!(?duration_ms, "{message}"),
            NotificationLevel::Info | NotificationLevel::Success => {
                tracing::info!(level = level.as_str(), ?duration_ms, "{message}")
            }
        }
    }
}
