//! Human-readable dumps of request and response objects for diagnostics.

use serde_json::Value;

/// Nesting depth rendered in block style. Deeper containers collapse to
/// inline JSON text.
pub const MAX_DEPTH: usize = 100;

/// Render `value` as block-style YAML.
pub fn dump(value: &Value) -> String {
    let capped = cap_depth(value, MAX_DEPTH);
    serde_yaml::to_string(&capped).unwrap_or_else(|_| capped.to_string())
}

fn cap_depth(value: &Value, remaining: usize) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) if remaining == 0 => Value::String(value.to_string()),
        Value::Array(items) => Value::Array(items.iter().map(|v| cap_depth(v, remaining - 1)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), cap_depth(v, remaining - 1)))
                .collect(),
        ),
        scalar => scalar.clone(),
    }
}
