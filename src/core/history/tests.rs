//! History module tests.

use crate::core::history::{MAX_SAVED, SavedConversation, archive, filter, remove, resolve};
use crate::core::message::Message;

fn transcript(text: &str) -> Vec<Message> {
    vec![
        Message::user(text, Some("code".to_string())),
        Message::assistant("ok", Some("code".to_string())),
    ]
}

fn saved_with(titles: &[&str]) -> Vec<SavedConversation> {
    let mut saved = Vec::new();
    for title in titles.iter().rev() {
        archive(&mut saved, transcript(title), Some("code".to_string()));
    }
    saved
}

#[test]
fn archive_skips_empty_transcripts() {
    let mut saved = Vec::new();
    assert!(archive(&mut saved, Vec::new(), None).is_none());
    assert!(saved.is_empty());
}

#[test]
fn archive_puts_most_recent_first_with_title() {
    let mut saved = Vec::new();
    archive(&mut saved, transcript("first question"), None);
    let id = archive(&mut saved, transcript("second question"), Some("sql".to_string()))
        .expect("archived");
    assert_eq!(saved[0].id, id);
    assert_eq!(saved[0].title, "second question");
    assert_eq!(saved[0].category.as_deref(), Some("sql"));
    assert_eq!(saved[1].title, "first question");
}

#[test]
fn archive_never_exceeds_cap() {
    let mut saved = Vec::new();
    for i in 0..(MAX_SAVED + 5) {
        archive(&mut saved, transcript(&format!("chat {}", i)), None);
        assert!(saved.len() <= MAX_SAVED);
    }
    assert_eq!(saved.len(), MAX_SAVED);
    assert_eq!(saved[0].title, format!("chat {}", MAX_SAVED + 4));
    assert_eq!(saved[MAX_SAVED - 1].title, "chat 5");
}

#[test]
fn resolve_by_position_id_and_prefix() {
    let saved = saved_with(&["alpha", "beta"]);
    assert_eq!(resolve(&saved, "1").map(|c| c.title.as_str()), Some("alpha"));
    assert_eq!(resolve(&saved, "2").map(|c| c.title.as_str()), Some("beta"));
    assert!(resolve(&saved, "3").is_none());

    let id = saved[1].id.clone();
    assert_eq!(resolve(&saved, &id).map(|c| c.title.as_str()), Some("beta"));
    assert_eq!(
        resolve(&saved, &id[..12]).map(|c| c.title.as_str()),
        Some("beta")
    );
    assert!(resolve(&saved, "").is_none());
}

#[test]
fn remove_by_id() {
    let mut saved = saved_with(&["alpha", "beta"]);
    let id = saved[0].id.clone();
    assert_eq!(remove(&mut saved, &id).map(|c| c.title), Some("alpha".to_string()));
    assert!(remove(&mut saved, &id).is_none());
    assert_eq!(saved.len(), 1);
}

#[test]
fn filter_matches_title_and_content() {
    let mut saved = saved_with(&["Hello world", "Other chat"]);
    saved[1]
        .messages
        .push(Message::assistant("Detailed discussion about Rust ownership", None));

    assert_eq!(filter(&saved, "").len(), 2);
    let by_title = filter(&saved, "hello");
    assert_eq!(by_title.len(), 1);
    assert_eq!(by_title[0].title, "Hello world");
    let by_content = filter(&saved, "rust");
    assert_eq!(by_content.len(), 1);
    assert_eq!(by_content[0].title, "Other chat");
    assert_eq!(filter(&saved, "OWNERSHIP").len(), 1);
}
