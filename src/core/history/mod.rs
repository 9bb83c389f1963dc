//! Saved conversations: archived transcripts, capped and most-recent-first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::message::{self, Message};
use crate::core::util;

/// Oldest entries beyond this are dropped when a conversation is archived.
pub const MAX_SAVED: usize = 10;

const TITLE_MAX_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedConversation {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    pub messages: Vec<Message>,
    pub saved_at: DateTime<Utc>,
}

/// Archive `messages` at the front of `saved`, dropping the oldest entries past
/// [`MAX_SAVED`]. Empty transcripts are not archived.
pub fn archive(
    saved: &mut Vec<SavedConversation>,
    messages: Vec<Message>,
    category: Option<String>,
) -> Option<String> {
    if messages.is_empty() {
        return None;
    }
    let id = Uuid::new_v4().to_string();
    let conversation = SavedConversation {
        id: id.clone(),
        title: message::first_message_preview(&messages, TITLE_MAX_CHARS),
        category,
        messages,
        saved_at: Utc::now(),
    };
    saved.insert(0, conversation);
    if saved.len() > MAX_SAVED {
        for dropped in saved.drain(MAX_SAVED..) {
            log::debug!("Dropping oldest saved conversation {}", dropped.id);
        }
    }
    Some(id)
}

/// Resolve a selector: a 1-based list position, a full id, or a unique id prefix.
pub fn resolve<'a>(saved: &'a [SavedConversation], selector: &str) -> Option<&'a SavedConversation> {
    let selector = selector.trim();
    if selector.is_empty() {
        return None;
    }
    if let Ok(position) = selector.parse::<usize>()
        && (1..=saved.len()).contains(&position)
    {
        return saved.get(position - 1);
    }
    if let Some(exact) = saved.iter().find(|c| c.id == selector) {
        return Some(exact);
    }
    let mut by_prefix = saved.iter().filter(|c| c.id.starts_with(selector));
    match (by_prefix.next(), by_prefix.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}

/// Remove a conversation by id. Returns it when it existed.
pub fn remove(saved: &mut Vec<SavedConversation>, id: &str) -> Option<SavedConversation> {
    let position = saved.iter().position(|c| c.id == id)?;
    Some(saved.remove(position))
}

/// Filter by title, id, category, or message content (case-insensitive).
pub fn filter<'a>(saved: &'a [SavedConversation], query: &str) -> Vec<&'a SavedConversation> {
    util::filter_by_query(saved, query, |c| {
        let mut fields = vec![c.title.as_str(), c.id.as_str()];
        if let Some(category) = &c.category {
            fields.push(category.as_str());
        }
        fields.extend(c.messages.iter().map(|m| m.content.as_str()));
        fields
    })
}

#[cfg(test)]
mod tests;
