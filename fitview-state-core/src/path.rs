//! Dot-delimited path addressing over a `serde_json::Value` tree
//!
//! Every read and write the store performs goes through [`resolve`] and
//! [`assign`]. Missing intermediate nodes read as absent and are created as
//! objects on write.

use serde_json::{Map, Value};

/// Split a path into its non-empty segments.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|segment| !segment.is_empty())
}

/// Canonical form of a path (`"a..b."` becomes `"a.b"`).
pub fn normalize(path: &str) -> String {
    segments(path).collect::<Vec<_>>().join(".")
}

/// Returns true if `ancestor` is a strict ancestor of `path`.
///
/// Both paths must already be normalized. The empty path is the root and is
/// an ancestor of every non-empty path.
pub fn is_ancestor(ancestor: &str, path: &str) -> bool {
    if ancestor.is_empty() {
        return !path.is_empty();
    }
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'.'
}

/// Look up the value at `path`, or `None` if any segment is absent.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path).try_fold(root, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Write `value` at `path`, creating intermediate objects as needed.
///
/// A primitive sitting where an intermediate node is needed is replaced by an
/// object. Numeric segments index into existing arrays when in range, and an
/// index equal to the length appends. Any other segment turns the array into
/// an object.
pub fn assign(root: &mut Value, path: &str, value: Value) {
    let parts: Vec<&str> = segments(path).collect();
    let Some((last, parents)) = parts.split_last() else {
        *root = value;
        return;
    };

    let parent = parents
        .iter()
        .fold(root, |node, segment| child_mut(node, segment));

    let index = array_index(parent, last);
    match (parent, index) {
        (Value::Array(items), Some(i)) => *array_slot(items, i) = value,
        (parent, _) => {
            ensure_object(parent).insert((*last).to_string(), value);
        }
    }
}

fn array_index(node: &Value, segment: &str) -> Option<usize> {
    match node {
        Value::Array(items) => segment.parse::<usize>().ok().filter(|i| *i <= items.len()),
        _ => None,
    }
}

fn array_slot(items: &mut Vec<Value>, index: usize) -> &mut Value {
    if index == items.len() {
        items.push(Value::Null);
    }
    &mut items[index]
}

fn child_mut<'a>(node: &'a mut Value, segment: &str) -> &'a mut Value {
    let index = array_index(node, segment);
    match (node, index) {
        (Value::Array(items), Some(i)) => array_slot(items, i),
        (node, _) => ensure_object(node)
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new())),
    }
}

fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced by an object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_nested() {
        let root = json!({"charts": {"isRendered": true}, "laps": [10, 20]});
        assert_eq!(resolve(&root, "charts.isRendered"), Some(&json!(true)));
        assert_eq!(resolve(&root, "laps.1"), Some(&json!(20)));
        assert_eq!(resolve(&root, "charts.missing.deeper"), None);
        assert_eq!(resolve(&root, "laps.7"), None);
        assert_eq!(resolve(&root, ""), Some(&root));
    }

    #[test]
    fn test_resolve_through_primitive_is_absent() {
        let root = json!({"a": 5});
        assert_eq!(resolve(&root, "a.b"), None);
    }

    #[test]
    fn test_assign_creates_intermediate_objects() {
        let mut root = json!({});
        assign(&mut root, "performance.renderTimes.chart", json!(12));
        assert_eq!(root, json!({"performance": {"renderTimes": {"chart": 12}}}));
    }

    #[test]
    fn test_assign_replaces_primitive_parent() {
        let mut root = json!({"ui": "dark"});
        assign(&mut root, "ui.theme", json!("light"));
        assert_eq!(root, json!({"ui": {"theme": "light"}}));
    }

    #[test]
    fn test_assign_array_index() {
        let mut root = json!({"laps": [{"n": 1}, {"n": 2}]});
        assign(&mut root, "laps.1.n", json!(9));
        assert_eq!(root, json!({"laps": [{"n": 1}, {"n": 9}]}));
    }

    #[test]
    fn test_assign_appends_at_array_length() {
        let mut root = json!({"laps": [1]});
        assign(&mut root, "laps.1", json!(2));
        assert_eq!(root, json!({"laps": [1, 2]}));
    }

    #[test]
    fn test_assign_out_of_range_index_becomes_object_key() {
        let mut root = json!({"laps": [1]});
        assign(&mut root, "laps.4", json!(2));
        assert_eq!(root, json!({"laps": {"4": 2}}));
    }

    #[test]
    fn test_normalize_and_ancestry() {
        assert_eq!(normalize("a..b."), "a.b");
        assert!(is_ancestor("fitFile", "fitFile.metrics"));
        assert!(!is_ancestor("fitFile", "fitFileX.metrics"));
        assert!(!is_ancestor("fitFile.metrics", "fitFile.metrics"));
        assert!(is_ancestor("", "anything"));
    }
}
