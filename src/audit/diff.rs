//! Change summaries for audit entries

use serde_json::Value;

/// Fields that change on every write and carry no information
const IGNORED_FIELDS: &[&str] = &["updated_at"];

const MAX_STRING_LEN: usize = 40;

/// Summarize the differences between two entity snapshots
///
/// Nested objects are walked and reported with dotted paths, e.g.
/// `frequency.day: 5 -> 10`. Returns `None` when nothing relevant changed.
pub fn generate_diff(before: &Value, after: &Value) -> Option<String> {
    let mut changes = Vec::new();
    collect_changes("", before, after, &mut changes);
    if changes.is_empty() {
        None
    } else {
        Some(changes.join(", "))
    }
}

fn collect_changes(path: &str, before: &Value, after: &Value, changes: &mut Vec<String>) {
    match (before, after) {
        (Value::Object(before_obj), Value::Object(after_obj)) => {
            for (key, before_val) in before_obj {
                if path.is_empty() && IGNORED_FIELDS.contains(&key.as_str()) {
                    continue;
                }
                let field = join_path(path, key);
                match after_obj.get(key) {
                    Some(after_val) => collect_changes(&field, before_val, after_val, changes),
                    None => changes.push(format!("{}: {} -> (removed)", field, render(before_val))),
                }
            }
            for (key, after_val) in after_obj {
                if !before_obj.contains_key(key) {
                    let field = join_path(path, key);
                    changes.push(format!("{}: (added) -> {}", field, render(after_val)));
                }
            }
        }
        _ if before != after => {
            let label = if path.is_empty() { "value" } else { path };
            changes.push(format!("{}: {} -> {}", label, render(before), render(after)));
        }
        _ => {}
    }
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) if s.chars().count() > MAX_STRING_LEN => {
            let head: String = s.chars().take(MAX_STRING_LEN - 3).collect();
            format!("\"{}...\"", head)
        }
        Value::String(s) => format!("\"{}\"", s),
        Value::Array(items) => format!("[{} items]", items.len()),
        Value::Object(fields) => format!("{{{} fields}}", fields.len()),
        other => other.to_string(),
    }
}
