//! Change logging with pattern-based filtering and in-memory storage
//!
//! [`ChangeLogger`] is a middleware that records every write whose path
//! passes a glob filter. It can trace only, or also keep a ring buffer of
//! recent changes for inspection.
//!
//! # Example
//!
//! ```
//! use fitview_state_core::debug::{ChangeLogConfig, ChangeLogger};
//! use fitview_state_core::PathStore;
//! use serde_json::json;
//!
//! let store = PathStore::new();
//! let logger = ChangeLogger::with_log(ChangeLogConfig::default());
//! store.use_middleware(logger.clone());
//!
//! store.set_state("ui.activeTab", json!("map"), "Tabs");
//! store.set_state("performance.lastLoadTime", json!(1), "Loader");
//!
//! let recent = logger.recent(10);
//! assert_eq!(recent.len(), 1);
//! assert_eq!(recent[0].path, "ui.activeTab");
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Instant;

use serde_json::Value;

use crate::error::CallbackResult;
use crate::middleware::Middleware;
use crate::store::ChangeOptions;

/// Paths excluded by default: high-frequency bookkeeping writes.
const DEFAULT_EXCLUDES: &[&str] = &["performance.*", "ui.loadingIndicator"];

/// Longest value summary kept per entry.
const SUMMARY_MAX_CHARS: usize = 80;

/// Glob filter over state paths.
///
/// Patterns support:
/// - `*` matches any sequence of characters
/// - `?` matches any single character
/// - Literal text matches exactly
///
/// # Examples
///
/// - `fitFile.*` matches fitFile.isLoading, fitFile.metrics, etc.
/// - `*.isRendered` matches charts.isRendered, map.isRendered, ...
/// - `globalData` matches only globalData
#[derive(Debug, Clone)]
pub struct ChangeFilter {
    /// If non-empty, only log paths matching these patterns
    pub include_patterns: Vec<String>,
    /// Exclude paths matching these patterns (applied after include)
    pub exclude_patterns: Vec<String>,
}

impl Default for ChangeFilter {
    fn default() -> Self {
        Self {
            include_patterns: Vec::new(),
            exclude_patterns: DEFAULT_EXCLUDES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl ChangeFilter {
    /// Create a filter from comma-separated pattern strings
    ///
    /// # Example
    /// ```
    /// use fitview_state_core::debug::ChangeFilter;
    ///
    /// let filter = ChangeFilter::new(Some("fitFile.*,globalData"), Some("fitFile.loadingProgress"));
    /// assert!(filter.should_log("fitFile.metrics"));
    /// assert!(filter.should_log("globalData"));
    /// assert!(!filter.should_log("fitFile.loadingProgress"));
    /// assert!(!filter.should_log("ui.theme"));
    /// ```
    pub fn new(include: Option<&str>, exclude: Option<&str>) -> Self {
        let include_patterns = include.map(split_patterns).unwrap_or_default();
        let exclude_patterns = exclude
            .map(split_patterns)
            .unwrap_or_else(|| Self::default().exclude_patterns);

        Self {
            include_patterns,
            exclude_patterns,
        }
    }

    /// A filter that logs every path.
    pub fn all() -> Self {
        Self {
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
        }
    }

    pub fn should_log(&self, path: &str) -> bool {
        if !self.include_patterns.is_empty()
            && !self.include_patterns.iter().any(|p| glob_match(p, path))
        {
            return false;
        }

        !self.exclude_patterns.iter().any(|p| glob_match(p, path))
    }
}

fn split_patterns(list: &str) -> Vec<String> {
    list.split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Simple glob pattern matching supporting `*` and `?`
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    glob_match_impl(&pattern, &text)
}

fn glob_match_impl(pattern: &[char], text: &[char]) -> bool {
    let mut pi = 0;
    let mut ti = 0;
    let mut star_pi = None;
    let mut star_ti = 0;

    while ti < text.len() {
        if pi < pattern.len() && (pattern[pi] == '?' || pattern[pi] == text[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < pattern.len() && pattern[pi] == '*' {
            star_pi = Some(pi);
            star_ti = ti;
            pi += 1;
        } else if let Some(spi) = star_pi {
            pi = spi + 1;
            star_ti += 1;
            ti = star_ti;
        } else {
            return false;
        }
    }

    while pi < pattern.len() && pattern[pi] == '*' {
        pi += 1;
    }

    pi == pattern.len()
}

/// An entry in the change log
#[derive(Debug, Clone)]
pub struct ChangeLogEntry {
    pub path: String,
    /// `source` from the write's options, if any
    pub source: Option<String>,
    /// Compact JSON of the candidate value as it reached the logger, truncated.
    /// Middleware registered later may still replace it or drop the write.
    pub summary: String,
    /// Whether the path held a value before the write
    pub had_value: bool,
    pub timestamp: Instant,
    /// Sequence number for ordering
    pub sequence: u64,
}

impl ChangeLogEntry {
    pub fn elapsed(&self) -> std::time::Duration {
        self.timestamp.elapsed()
    }

    /// Format the elapsed time for display (e.g., "2.3s", "150ms")
    pub fn elapsed_display(&self) -> String {
        let elapsed = self.elapsed();
        if elapsed.as_secs() >= 1 {
            format!("{:.1}s", elapsed.as_secs_f64())
        } else {
            format!("{}ms", elapsed.as_millis())
        }
    }
}

/// Configuration for the change log ring buffer
#[derive(Debug, Clone)]
pub struct ChangeLogConfig {
    /// Maximum number of entries to keep
    pub capacity: usize,
    pub filter: ChangeFilter,
}

impl Default for ChangeLogConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            filter: ChangeFilter::default(),
        }
    }
}

impl ChangeLogConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }
}

/// In-memory ring buffer of recent changes
#[derive(Debug, Clone)]
pub struct ChangeLog {
    entries: VecDeque<ChangeLogEntry>,
    capacity: usize,
    next_sequence: u64,
}

impl ChangeLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_sequence: 0,
        }
    }

    fn push(&mut self, path: &str, value: &Value, had_value: bool, options: &ChangeOptions) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(ChangeLogEntry {
            path: path.to_string(),
            source: options.source.clone(),
            summary: summarize(value, SUMMARY_MAX_CHARS),
            had_value,
            timestamp: Instant::now(),
            sequence: self.next_sequence,
        });
        self.next_sequence += 1;
    }

    /// All entries, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &ChangeLogEntry> {
        self.entries.iter()
    }

    /// The most recent N entries, newest first
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &ChangeLogEntry> {
        self.entries.iter().rev().take(count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Compact JSON for `value`, cut to `max_chars` with a trailing ellipsis.
pub fn summarize(value: &Value, max_chars: usize) -> String {
    let text = value.to_string();
    if text.chars().count() <= max_chars {
        return text;
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Middleware that logs writes with configurable path filtering.
///
/// Supports two modes:
/// - **Tracing only**: logs via `tracing::debug!()`
/// - **With storage**: also keeps a [`ChangeLog`] ring buffer
///
/// Clones share the same log, so keep one clone to read it back after
/// handing the other to the store.
///
/// Entries record attempted writes. Register the logger last to see values
/// after every other middleware has run.
#[derive(Debug, Clone)]
pub struct ChangeLogger {
    filter: ChangeFilter,
    log: Option<Rc<RefCell<ChangeLog>>>,
    active: bool,
}

impl ChangeLogger {
    /// Tracing only, no in-memory storage
    pub fn new(filter: ChangeFilter) -> Self {
        Self {
            filter,
            log: None,
            active: true,
        }
    }

    pub fn with_log(config: ChangeLogConfig) -> Self {
        Self {
            filter: config.filter,
            log: Some(Rc::new(RefCell::new(ChangeLog::new(config.capacity)))),
            active: true,
        }
    }

    /// When inactive, every write passes through untouched and unlogged.
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn filter(&self) -> &ChangeFilter {
        &self.filter
    }

    /// Snapshot of the most recent `count` entries, newest first.
    pub fn recent(&self, count: usize) -> Vec<ChangeLogEntry> {
        self.log
            .as_ref()
            .map(|log| log.borrow().recent(count).cloned().collect())
            .unwrap_or_default()
    }

    /// Number of stored entries (0 without storage).
    pub fn len(&self) -> usize {
        self.log.as_ref().map_or(0, |log| log.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Some(log) = &self.log {
            log.borrow_mut().clear();
        }
    }
}

impl Middleware for ChangeLogger {
    fn apply(
        &self,
        path: &str,
        value: &Value,
        old_value: Option<&Value>,
        options: &ChangeOptions,
    ) -> CallbackResult<Option<Value>> {
        if !self.active || !self.filter.should_log(path) {
            return Ok(None);
        }

        tracing::debug!(
            path = %path,
            source = ?options.source,
            value = %summarize(value, SUMMARY_MAX_CHARS),
            "State change"
        );

        if let Some(log) = &self.log {
            log.borrow_mut()
                .push(path, value, old_value.is_some(), options);
        }
        Ok(None)
    }

    fn name(&self) -> &str {
        "change-logger"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PathStore;
    use serde_json::json;

    #[test]
    fn test_glob_match() {
        assert!(glob_match("fitFile.*", "fitFile.metrics"));
        assert!(glob_match("*.isRendered", "charts.isRendered"));
        assert!(glob_match("ui.?heme", "ui.theme"));
        assert!(glob_match("globalData", "globalData"));
        assert!(!glob_match("globalData", "globalDataX"));
        assert!(!glob_match("fitFile.*", "charts.isRendered"));
    }

    #[test]
    fn test_default_filter_excludes_bookkeeping() {
        let filter = ChangeFilter::default();
        assert!(!filter.should_log("performance.renderTimes"));
        assert!(!filter.should_log("ui.loadingIndicator"));
        assert!(filter.should_log("ui.activeTab"));
    }

    #[test]
    fn test_all_filter() {
        let filter = ChangeFilter::all();
        assert!(filter.should_log("performance.lastLoadTime"));
    }

    #[test]
    fn test_ring_buffer_capacity() {
        let store = PathStore::new();
        let logger = ChangeLogger::with_log(ChangeLogConfig::with_capacity(2));
        store.use_middleware(logger.clone());

        store.set_state("a", json!(1), "T");
        store.set_state("b", json!(2), "T");
        store.set_state("c", json!(3), "T");

        let recent = logger.recent(10);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].path, "c");
        assert_eq!(recent[1].path, "b");
        assert_eq!(recent[0].sequence, 2);
        assert_eq!(recent[0].source.as_deref(), Some("T"));
    }

    #[test]
    fn test_logger_never_changes_values() {
        let store = PathStore::new();
        let logger = ChangeLogger::with_log(ChangeLogConfig::default());
        store.use_middleware(logger.clone());
        store.set("x", json!({"k": [1, 2]}));
        assert_eq!(store.get_state("x"), Some(json!({"k": [1, 2]})));
        assert!(!logger.recent(1)[0].had_value);
    }

    #[test]
    fn test_logger_records_value_at_its_position() {
        let store = PathStore::new();
        let first = ChangeLogger::with_log(ChangeLogConfig::default());
        let last = ChangeLogger::with_log(ChangeLogConfig::default());
        store.use_middleware(first.clone());
        store.use_middleware_fn(|_, v, _, _| Ok(v.as_i64().map(|n| json!(n * 10))));
        store.use_middleware(last.clone());

        store.set("x", json!(4));
        assert_eq!(store.get_state("x"), Some(json!(40)));
        assert_eq!(first.recent(1)[0].summary, "4");
        assert_eq!(last.recent(1)[0].summary, "40");
    }

    #[test]
    fn test_inactive_logger_records_nothing() {
        let store = PathStore::new();
        let logger = ChangeLogger::with_log(ChangeLogConfig::default()).active(false);
        store.use_middleware(logger.clone());
        store.set("x", json!(1));
        assert!(logger.is_empty());
    }

    #[test]
    fn test_summarize_truncates() {
        let long = json!("x".repeat(200));
        let summary = summarize(&long, 10);
        assert_eq!(summary.chars().count(), 10);
        assert!(summary.ends_with('…'));
        assert_eq!(summarize(&json!(1), 10), "1");
    }
}
