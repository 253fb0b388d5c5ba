//! Dot-separated field paths into raw provider responses.
//!
//! `choices.0.message.content` walks key `choices`, index `0`, key `message`,
//! key `content`. A segment that parses as an integer indexes an array; any
//! other segment indexes an object key. A path that cannot be followed yields
//! `None` instead of an error.

use serde_json::Value;

/// Follow `path` through `value`. The empty path addresses `value` itself.
pub fn extract<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        Value::Object(map) => map.get(segment),
        _ => None,
    })
}

/// Extract a field as text. Non-string scalars and objects are rendered as JSON.
pub fn extract_string(value: &Value, path: &str) -> Option<String> {
    match extract(value, path)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Extract a field as an owned value, `Null` when the path does not resolve.
pub fn extract_or_null(value: &Value, path: &str) -> Value {
    extract(value, path).cloned().unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn walks_arrays_and_objects() {
        let response = json!({"choices": [{"message": {"content": "hi"}}]});
        assert_eq!(
            extract_string(&response, "choices.0.message.content").as_deref(),
            Some("hi")
        );
    }

    #[test]
    fn anthropic_style_content() {
        let response = json!({"content": [{"type": "text", "text": "hello"}], "model": "claude"});
        assert_eq!(extract_string(&response, "content.0.text").as_deref(), Some("hello"));
        assert_eq!(extract_string(&response, "model").as_deref(), Some("claude"));
    }

    #[test]
    fn missing_path_is_null() {
        let empty = json!({});
        assert_eq!(extract(&empty, "a.b.c"), None);
        assert_eq!(extract_or_null(&empty, "a.b.c"), Value::Null);
        assert_eq!(extract_string(&empty, "a.b.c"), None);
    }

    #[test]
    fn invalid_segments_are_null() {
        let response = json!({"choices": [{"text": "x"}], "n": 3});
        assert_eq!(extract(&response, "choices.first.text"), None);
        assert_eq!(extract(&response, "choices.5.text"), None);
        assert_eq!(extract(&response, "n.value"), None);
    }

    #[test]
    fn non_string_fields_are_rendered() {
        let response = json!({"usage": {"total_tokens": 12}});
        assert_eq!(
            extract_string(&response, "usage.total_tokens").as_deref(),
            Some("12")
        );
        assert_eq!(extract_or_null(&response, "usage"), json!({"total_tokens": 12}));
    }

    #[test]
    fn empty_path_is_the_root() {
        let response = json!("plain");
        assert_eq!(extract_string(&response, "").as_deref(), Some("plain"));
    }
}
