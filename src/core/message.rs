//! Chat transcript messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::util;

/// A single transcript entry. Immutable once created. `content` holds the user's input
/// as typed, or the extracted reply, which extraction has already normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Millisecond timestamp prefix keeps ids roughly ordered; the suffix keeps them unique.
fn new_id(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", now.timestamp_millis(), &suffix[..8])
}

impl Message {
    fn new(content: String, is_user: bool, category: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(now),
            content,
            is_user,
            timestamp: now,
            category,
        }
    }

    pub fn user(content: impl Into<String>, category: Option<String>) -> Self {
        Self::new(content.into(), true, category)
    }

    pub fn assistant(content: impl Into<String>, category: Option<String>) -> Self {
        Self::new(content.into(), false, category)
    }
}

/// Generate a title from the first user message. Truncates to max_len chars with ellipsis.
pub fn first_message_preview(messages: &[Message], max_len: usize) -> String {
    let Some(first) = messages.iter().find(|m| m.is_user) else {
        return "(No title)".to_string();
    };
    let s = first.content.trim().replace('\n', " ");
    if s.is_empty() {
        return "(No title)".to_string();
    }
    util::truncate_chars(&s, max_len)
}
