//! Boundary decoding of relay response bodies into a tagged union.

use serde_json::{Map, Value};

/// Bare JSON literals the relay returns instead of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    Bool(bool),
    Null,
}

/// A relay reply body, decoded once at the HTTP boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayResponse {
    /// A JSON string, a bare number, or a body that is not JSON at all.
    Text(String),
    List(Vec<Value>),
    Object(Map<String, Value>),
    Sentinel(Sentinel),
}

impl RelayResponse {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(s) => RelayResponse::Text(s),
            Value::Number(n) => RelayResponse::Text(n.to_string()),
            Value::Array(items) => RelayResponse::List(items),
            Value::Object(map) => RelayResponse::Object(map),
            Value::Bool(b) => RelayResponse::Sentinel(Sentinel::Bool(b)),
            Value::Null => RelayResponse::Sentinel(Sentinel::Null),
        }
    }

    /// Decode a raw body. Bodies that are not valid JSON become `Text` unchanged.
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<Value>(body.trim()) {
            Ok(value) => Self::from_value(value),
            Err(_) => RelayResponse::Text(body.to_string()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RelayResponse::Text(_) => "text",
            RelayResponse::List(_) => "list",
            RelayResponse::Object(_) => "object",
            RelayResponse::Sentinel(_) => "sentinel",
        }
    }

    /// False when the relay marks the reply as not processed (`shouldProcess: false`),
    /// either on the top-level object or on any list element.
    pub fn should_process(&self) -> bool {
        fn flagged_off(map: &Map<String, Value>) -> bool {
            map.get("shouldProcess") == Some(&Value::Bool(false))
        }
        match self {
            RelayResponse::Object(map) => !flagged_off(map),
            RelayResponse::List(items) => !items
                .iter()
                .filter_map(Value::as_object)
                .any(flagged_off),
            RelayResponse::Text(_) | RelayResponse::Sentinel(_) => true,
        }
    }
}
