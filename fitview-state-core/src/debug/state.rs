//! Debug state introspection trait
//!
//! Flattens a state tree into titled sections of `path = value` entries for
//! logging or display.

use serde_json::Value;

use super::change_logger::summarize;
use crate::store::PathStore;

const VALUE_MAX_CHARS: usize = 80;

/// A debug entry (key-value pair)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugEntry {
    pub key: String,
    pub value: String,
}

impl DebugEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A debug section with a title and entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugSection {
    pub title: String,
    pub entries: Vec<DebugEntry>,
}

impl DebugSection {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            entries: Vec::new(),
        }
    }

    /// Add an entry to the section
    pub fn entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.push(DebugEntry::new(key, value));
        self
    }

    pub fn push_entry(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push(DebugEntry::new(key, value));
    }
}

/// Trait for types that can provide debug state information
///
/// # Example
///
/// ```
/// use fitview_state_core::debug::DebugState;
/// use fitview_state_core::PathStore;
/// use serde_json::json;
///
/// let store = PathStore::new();
/// store.set("ui.theme", json!("dark"));
/// store.set("charts.isRendered", json!(false));
///
/// let sections = store.debug_sections();
/// assert_eq!(sections[0].title, "charts");
/// assert_eq!(sections[0].entries[0].key, "charts.isRendered");
/// assert_eq!(sections[1].entries[0].value, "\"dark\"");
/// ```
pub trait DebugState {
    /// Return state as sections with key-value pairs
    fn debug_sections(&self) -> Vec<DebugSection>;

    /// Render all sections as indented plain text.
    fn debug_text(&self) -> String {
        let mut out = String::new();
        for section in self.debug_sections() {
            out.push_str(&section.title);
            out.push('\n');
            for entry in section.entries {
                out.push_str(&format!("  {} = {}\n", entry.key, entry.value));
            }
        }
        out
    }
}

/// One section per top-level key; leaves become `dotted.path = json` entries.
///
/// Arrays are summarized rather than expanded.
impl DebugState for Value {
    fn debug_sections(&self) -> Vec<DebugSection> {
        let Value::Object(slices) = self else {
            return vec![DebugSection::new("state").entry("", summarize(self, VALUE_MAX_CHARS))];
        };

        let mut keys: Vec<&String> = slices.keys().collect();
        keys.sort();
        keys.into_iter()
            .map(|key| {
                let mut section = DebugSection::new(key.as_str());
                flatten_into(&mut section, key, &slices[key.as_str()]);
                section
            })
            .collect()
    }
}

impl DebugState for PathStore {
    fn debug_sections(&self) -> Vec<DebugSection> {
        self.snapshot().debug_sections()
    }
}

fn flatten_into(section: &mut DebugSection, prefix: &str, value: &Value) {
    match value {
        Value::Object(fields) if !fields.is_empty() => {
            let mut keys: Vec<&String> = fields.keys().collect();
            keys.sort();
            for key in keys {
                flatten_into(section, &format!("{prefix}.{key}"), &fields[key.as_str()]);
            }
        }
        Value::Array(items) if items.len() > 3 => {
            section.push_entry(prefix, format!("[{} items]", items.len()));
        }
        other => section.push_entry(prefix, summarize(other, VALUE_MAX_CHARS)),
    }
}
