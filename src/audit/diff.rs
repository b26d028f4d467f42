//! Human-readable diffs between entity snapshots

use serde_json::Value;

const MAX_STRING_LEN: usize = 50;

/// Summarize top-level field changes between two JSON snapshots
///
/// Nested objects such as money amounts are compared as a whole and shown
/// in compact form. Returns `None` when nothing changed.
pub fn generate_diff(before: &Value, after: &Value) -> Option<String> {
    let changes = match (before, after) {
        (Value::Object(before_obj), Value::Object(after_obj)) => {
            let mut changes = Vec::new();
            for (key, before_val) in before_obj {
                match after_obj.get(key) {
                    Some(after_val) if after_val == before_val => {}
                    Some(after_val) => changes.push(format!(
                        "{}: {} -> {}",
                        key,
                        format_value(before_val),
                        format_value(after_val)
                    )),
                    None => changes.push(format!("{}: {} -> (removed)", key, format_value(before_val))),
                }
            }
            for (key, after_val) in after_obj {
                if !before_obj.contains_key(key) {
                    changes.push(format!("{}: (added) -> {}", key, format_value(after_val)));
                }
            }
            changes
        }
        _ if before != after => vec![format!("{} -> {}", format_value(before), format_value(after))],
        _ => Vec::new(),
    };

    if changes.is_empty() {
        None
    } else {
        Some(changes.join(", "))
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if s.chars().count() > MAX_STRING_LEN => {
            let head: String = s.chars().take(MAX_STRING_LEN - 3).collect();
            format!("\"{}...\"", head)
        }
        Value::String(s) => format!("\"{}\"", s),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => {
            let fields: Vec<String> = obj
                .iter()
                .map(|(k, v)| match v {
                    Value::Object(_) | Value::Array(_) => format!("{}: ..", k),
                    _ => format!("{}: {}", k, format_value(v)),
                })
                .collect();
            format!("{{{}}}", fields.join(", "))
        }
    }
}
