//! Dotted-path access over JSON trees
//!
//! Pure get/set helpers used by the context store. `set_by_path` never
//! mutates its input; it returns a new tree so callers can apply the whole
//! update as a single transform.

use serde_json::{Map, Value};

/// Walk `root` along a dotted path, returning the addressed value.
///
/// Returns `None` as soon as any intermediate is missing or not an
/// object. An empty path yields `None`.
pub fn get_by_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    let mut current = root;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Return a copy of `root` with `value` written at the dotted path.
///
/// Intermediate objects are created as needed; non-object intermediates on
/// the written branch are replaced by objects. An empty path is a no-op
/// and returns the root unchanged.
pub fn set_by_path(root: &Value, path: &str, value: Value) -> Value {
    if path.is_empty() {
        return root.clone();
    }
    let segments: Vec<&str> = path.split('.').collect();
    write_segments(root, &segments, value)
}

fn write_segments(current: &Value, segments: &[&str], value: Value) -> Value {
    let mut map = match current.as_object() {
        Some(obj) => obj.clone(),
        None => Map::new(),
    };

    let head = segments[0].to_string();
    if segments.len() == 1 {
        map.insert(head, value);
    } else {
        let child = map.get(&head).cloned().unwrap_or(Value::Null);
        map.insert(head, write_segments(&child, &segments[1..], value));
    }

    Value::Object(map)
}
