//! Content extraction: resolves a display string from a decoded relay response.

use serde_json::{Map, Value};

use crate::core::relay::RelayResponse;

use super::normalize::normalize;

/// Shown when the relay answers with an empty list.
pub const EMPTY_RESPONSE: &str = "The assistant returned an empty response.";

/// Shown when the relay answers with a bare sentinel (`true`, `null`, `[]`, ...) or nothing.
pub const NO_CONTENT: &str = "No content was returned. Please try again.";

/// Field names checked, in order, for the human-readable part of an object reply.
const PRIORITY_FIELDS: &[&str] = &[
    "message", "response", "content", "text", "data", "result", "output",
];

/// String fields longer than this are concatenated when no priority field matches.
const MIN_LOOSE_FIELD_CHARS: usize = 10;

/// Nesting depth followed through priority fields that hold objects.
const MAX_NESTING: usize = 4;

const SENTINEL_TEXTS: &[&str] = &["true", "false", "null", "[]"];

/// Extracted chat reply plus whether it should be charged against the user's quota.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedReply {
    pub content: String,
    pub counts_against_quota: bool,
}

/// Extract and normalize the display text of a relay response. Never returns an empty string.
pub fn extract_content(response: &RelayResponse) -> String {
    let raw = match response {
        RelayResponse::Text(s) => s.clone(),
        RelayResponse::List(items) if items.is_empty() => return EMPTY_RESPONSE.to_string(),
        RelayResponse::List(items) => list_text(items),
        RelayResponse::Object(map) => object_text(map),
        RelayResponse::Sentinel(_) => return NO_CONTENT.to_string(),
    };
    let normalized = normalize(&raw);
    if normalized.is_empty() || SENTINEL_TEXTS.contains(&normalized.as_str()) {
        log::debug!("relay reply collapsed to placeholder: {:?}", raw);
        return NO_CONTENT.to_string();
    }
    normalized
}

/// Extract content and the quota flag in one step.
pub fn extract_reply(response: &RelayResponse) -> ExtractedReply {
    ExtractedReply {
        content: extract_content(response),
        counts_against_quota: response.should_process(),
    }
}

fn list_text(items: &[Value]) -> String {
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => s.clone(),
            Value::Object(map) => object_text(map),
            other => other.to_string(),
        })
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn object_text(map: &Map<String, Value>) -> String {
    if let Some(text) = direct_priority_text(map) {
        return text.to_string();
    }
    let loose: Vec<&str> = map
        .values()
        .filter_map(Value::as_str)
        .filter(|s| s.chars().count() > MIN_LOOSE_FIELD_CHARS)
        .collect();
    if !loose.is_empty() {
        return loose.join("\n\n");
    }
    if let Some(text) = nested_priority_text(map, 0) {
        return text.to_string();
    }
    format!("{:#}", Value::Object(map.clone()))
}

/// First string-typed priority field, blank or not.
fn direct_priority_text(map: &Map<String, Value>) -> Option<&str> {
    PRIORITY_FIELDS
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
}

/// Priority-field search inside priority fields that hold objects.
fn nested_priority_text(map: &Map<String, Value>, depth: usize) -> Option<&str> {
    if depth >= MAX_NESTING {
        return None;
    }
    PRIORITY_FIELDS
        .iter()
        .filter_map(|key| map.get(*key).and_then(Value::as_object))
        .find_map(|inner| {
            direct_priority_text(inner).or_else(|| nested_priority_text(inner, depth + 1))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract(value: Value) -> String {
        extract_content(&RelayResponse::from_value(value))
    }

    #[test]
    fn object_uses_priority_order() {
        assert_eq!(extract(json!({"success": true, "message": "Hello"})), "Hello");
        assert_eq!(
            extract(json!({"output": "last", "text": "earlier"})),
            "earlier"
        );
    }

    #[test]
    fn object_takes_first_string_priority_field_even_when_blank() {
        assert_eq!(
            extract(json!({"message": "", "response": "second"})),
            NO_CONTENT
        );
    }

    #[test]
    fn object_follows_nested_priority_objects() {
        assert_eq!(extract(json!({"data": {"output": "deep"}})), "deep");
        assert_eq!(
            extract(json!({"result": {"data": {"text": "deeper"}}})),
            "deeper"
        );
    }

    #[test]
    fn long_top_level_strings_win_over_nested_priority_objects() {
        let value = json!({"data": {"output": "deep"}, "summary": "a long top-level summary"});
        assert_eq!(extract(value), "a long top-level summary");
    }

    #[test]
    fn object_concatenates_long_string_fields_in_order() {
        let value = json!({
            "id": "short",
            "summary": "first long string",
            "count": 3,
            "details": "second long string"
        });
        assert_eq!(extract(value), "first long string\n\nsecond long string");
    }

    #[test]
    fn object_falls_back_to_pretty_json() {
        let out = extract(json!({"id": 7, "ok": "yes"}));
        assert!(out.contains("\"id\": 7"), "got {}", out);
        assert!(out.contains('\n'));
    }

    #[test]
    fn list_maps_and_joins_elements() {
        let value = json!(["first", {"response": "second"}, 3, ""]);
        assert_eq!(extract(value), "first\n\nsecond\n\n3");
    }

    #[test]
    fn empty_list_uses_empty_placeholder() {
        assert_eq!(extract(json!([])), EMPTY_RESPONSE);
    }

    #[test]
    fn sentinels_use_no_content_placeholder() {
        assert_eq!(extract(json!(true)), NO_CONTENT);
        assert_eq!(extract(json!(null)), NO_CONTENT);
        assert_eq!(extract(json!("[]")), NO_CONTENT);
        assert_eq!(extract(json!("")), NO_CONTENT);
        assert_eq!(extract(json!([true])), NO_CONTENT);
        assert_eq!(
            extract_content(&RelayResponse::from_body("\"null\"")),
            NO_CONTENT
        );
    }

    #[test]
    fn text_is_normalized() {
        assert_eq!(
            extract_content(&RelayResponse::from_body(r#""line\\nnext""#)),
            "line\nnext"
        );
        assert_eq!(
            extract_content(&RelayResponse::from_body("not json at all")),
            "not json at all"
        );
    }

    #[test]
    fn never_returns_empty() {
        let bodies = ["", " ", "{}", "[]", "[[]]", "[{}]", "0", "\"\\n\"", "{\"a\":null}", "😀"];
        for body in bodies {
            let out = extract_content(&RelayResponse::from_body(body));
            assert!(!out.is_empty(), "empty output for {:?}", body);
        }
    }

    #[test]
    fn reply_not_counted_when_should_process_false() {
        let reply = extract_reply(&RelayResponse::from_value(json!([
            {"shouldProcess": false, "response": "wait"}
        ])));
        assert_eq!(reply.content, "wait");
        assert!(!reply.counts_against_quota);
    }

    #[test]
    fn reply_counted_by_default() {
        let reply = extract_reply(&RelayResponse::from_value(json!({"message": "Hi"})));
        assert!(reply.counts_against_quota);
    }
}
