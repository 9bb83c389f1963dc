//! Relay transport and contract errors.

use crate::core::util;

/// Longest error body kept for display.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Errors from calls to the relay webhooks.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Invalid relay endpoint: {0}")]
    Endpoint(String),
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Relay error ({status}): {message}")]
    Status { status: u16, message: String },
    /// The relay answered but refused the request (wrong credentials, unknown email, ...).
    #[error("{0}")]
    Rejected(String),
    #[error("Unexpected relay response: {0}")]
    Decode(String),
}

impl RelayError {
    /// Build a status error from a non-2xx body, preferring a JSON `message`/`error` field.
    pub fn from_status(status: u16, body: &str) -> Self {
        let from_json = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                let field = |key: &str| {
                    v.get(key)
                        .and_then(|m| m.as_str().map(str::to_string).or_else(|| {
                            m.get("message").and_then(|s| s.as_str()).map(str::to_string)
                        }))
                };
                field("message").or_else(|| field("error"))
            });
        let message = match from_json {
            Some(m) => m,
            None if body.trim().is_empty() => "empty response body".to_string(),
            None => util::truncate_chars(body.trim(), MAX_ERROR_BODY_CHARS),
        };
        RelayError::Status { status, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_status_prefers_json_message() {
        let err = RelayError::from_status(500, r#"{"message":"Workflow failed"}"#);
        assert_eq!(err.to_string(), "Relay error (500): Workflow failed");
    }

    #[test]
    fn from_status_reads_nested_error_message() {
        let err = RelayError::from_status(429, r#"{"error":{"message":"Rate limit exceeded"}}"#);
        match err {
            RelayError::Status { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "Rate limit exceeded");
            }
            other => panic!("expected Status, got {:?}", other),
        }
    }

    #[test]
    fn from_status_truncates_plain_bodies() {
        let body = "x".repeat(500);
        let RelayError::Status { message, .. } = RelayError::from_status(502, &body) else {
            panic!("expected Status");
        };
        assert_eq!(message.chars().count(), MAX_ERROR_BODY_CHARS);
    }

    #[test]
    fn from_status_empty_body() {
        let err = RelayError::from_status(404, "  ");
        assert_eq!(err.to_string(), "Relay error (404): empty response body");
    }
}
