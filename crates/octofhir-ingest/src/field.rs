//! Optional-field accessors over raw FHIR JSON.
//!
//! Paths are dot separated; numeric segments index into arrays
//! (`name.0.given`). Any missing key, out-of-range index or type mismatch along
//! the way yields `None` instead of an error, so absent data surfaces as an
//! explicit `None` / `Value::Null` at the field level.

use serde_json::Value;

/// Look up a nested value.
pub fn at<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// Look up a nested scalar (string, number or boolean).
///
/// Objects, arrays and JSON `null` count as absent.
pub fn scalar(value: &Value, path: &str) -> Option<Value> {
    at(value, path).filter(|v| is_scalar(v)).cloned()
}

/// Look up a nested string.
pub fn text<'a>(value: &'a Value, path: &str) -> Option<&'a str> {
    at(value, path).and_then(Value::as_str)
}

/// Join the strings found at `item_path` inside every element of the array at
/// `array_path`.
///
/// An element without a string at `item_path` contributes an empty part.
/// Returns `None` when the array is absent or empty.
pub fn join_text(
    value: &Value,
    array_path: &str,
    item_path: &str,
    separator: &str,
) -> Option<String> {
    let items = at(value, array_path)?.as_array()?;
    if items.is_empty() {
        return None;
    }
    let parts: Vec<&str> = items
        .iter()
        .map(|item| {
            let part = if item_path.is_empty() {
                item.as_str()
            } else {
                text(item, item_path)
            };
            part.unwrap_or_default()
        })
        .collect();
    Some(parts.join(separator))
}

/// Id portion of a reference string: the text after the last `/`.
///
/// `"Patient/123"` yields `"123"`; a reference without `/` is returned unchanged.
pub fn reference_id(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}
