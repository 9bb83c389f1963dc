//! One chat turn: gating, quota, relay call, extraction, and usage accounting.
//!
//! [`prepare`] and [`complete`] run against the session on the caller's thread; the
//! relay call in between can run elsewhere (the TUI runs it on a worker thread).

use crate::core::content;
use crate::core::message::Message;
use crate::core::quota::QuotaDecision;
use crate::core::relay::{Attachment, ChatRequest, RelayClient, RelayError, RelayResponse};
use crate::core::state::{Action, Session};
use crate::core::store::{Store, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Sign in to start chatting")]
    NotSignedIn,
    #[error("Choose a category before chatting")]
    NoCategory,
    #[error("Message is empty")]
    EmptyMessage,
    #[error(transparent)]
    Relay(#[from] RelayError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of gating a message before it is sent.
#[derive(Debug)]
pub enum Prepared {
    Ready(ChatRequest),
    /// Quota exhausted. Nothing was appended or sent.
    UpgradeRequired { used: u32, limit: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    Replied(Message),
    UpgradeRequired { used: u32, limit: u32 },
}

/// Check sign-in, category, and quota, then append the user's message and build the
/// relay request.
pub fn prepare<S: Store>(
    session: &mut Session<S>,
    text: &str,
    attachments: Vec<Attachment>,
) -> Result<Prepared, ChatError> {
    let state = session.state();
    let user = state.user.as_ref().ok_or(ChatError::NotSignedIn)?;
    let category = state
        .category
        .as_deref()
        .and_then(|id| state.settings.category(id))
        .map(|c| c.id.clone())
        .ok_or(ChatError::NoCategory)?;
    let text = text.trim();
    if text.is_empty() {
        return Err(ChatError::EmptyMessage);
    }
    if let QuotaDecision::UpgradeRequired { used, limit } = user.check_quota() {
        log::info!("Quota reached ({}/{}), upgrade required", used, limit);
        return Ok(Prepared::UpgradeRequired { used, limit });
    }

    let request = ChatRequest {
        message: text.to_string(),
        category: category.clone(),
        session_id: state.session_id.clone(),
        user_id: user.id.clone(),
        user_email: user.email.clone(),
        attachments,
    };
    session.dispatch(Action::MessageAppended(Message::user(text, Some(category))))?;
    Ok(Prepared::Ready(request))
}

/// Turn a relay reply into an assistant message, append it, and count it against the
/// quota unless the relay marked it as not processed.
pub fn complete<S: Store>(
    session: &mut Session<S>,
    response: &RelayResponse,
) -> Result<Message, ChatError> {
    let reply = content::extract_reply(response);
    let message = Message::assistant(reply.content, session.state().category.clone());
    session.dispatch(Action::MessageAppended(message.clone()))?;
    if reply.counts_against_quota {
        session.dispatch(Action::UsageRecorded)?;
    } else {
        log::debug!("Reply not counted against quota");
    }
    Ok(message)
}

pub async fn send<S: Store>(
    session: &mut Session<S>,
    client: &RelayClient,
    text: &str,
    attachments: Vec<Attachment>,
) -> Result<SendOutcome, ChatError> {
    let request = match prepare(session, text, attachments)? {
        Prepared::Ready(request) => request,
        Prepared::UpgradeRequired { used, limit } => {
            return Ok(SendOutcome::UpgradeRequired { used, limit });
        }
    };
    let response = client.send_chat(&request).await?;
    Ok(SendOutcome::Replied(complete(session, &response)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{self, Config};
    use crate::core::quota::User;
    use crate::core::store::MemoryStore;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn signed_in(used: u32, limit: u32) -> Session<MemoryStore> {
        let mut session = Session::open(MemoryStore::default()).unwrap();
        session
            .dispatch(Action::SignedIn(User {
                id: "u1".to_string(),
                email: "a@example.com".to_string(),
                name: "A".to_string(),
                plan: "free".to_string(),
                messages_used: used,
                message_limit: limit,
            }))
            .unwrap();
        session
            .dispatch(Action::CategorySelected("code".to_string()))
            .unwrap();
        session
    }

    #[test]
    fn prepare_is_gated() {
        let mut session = Session::open(MemoryStore::default()).unwrap();
        assert!(matches!(
            prepare(&mut session, "hi", Vec::new()),
            Err(ChatError::NotSignedIn)
        ));

        let mut session = signed_in(0, 10);
        session
            .dispatch(Action::CategorySelected("ghost".to_string()))
            .unwrap();
        assert!(matches!(
            prepare(&mut session, "hi", Vec::new()),
            Err(ChatError::NoCategory)
        ));

        let mut session = signed_in(0, 10);
        assert!(matches!(
            prepare(&mut session, "   ", Vec::new()),
            Err(ChatError::EmptyMessage)
        ));
        assert!(session.state().transcript.is_empty());
    }

    #[test]
    fn quota_boundary() {
        let mut session = signed_in(10, 10);
        assert!(matches!(
            prepare(&mut session, "hi", Vec::new()),
            Ok(Prepared::UpgradeRequired { used: 10, limit: 10 })
        ));
        assert!(session.state().transcript.is_empty());

        let mut session = signed_in(9, 10);
        let Ok(Prepared::Ready(request)) = prepare(&mut session, " hi ", Vec::new()) else {
            panic!("expected a request");
        };
        assert_eq!(request.message, "hi");
        assert_eq!(request.category, "code");
        assert_eq!(request.session_id, session.state().session_id);
        assert_eq!(session.state().transcript.len(), 1);
        assert!(session.state().transcript[0].is_user);
    }

    #[test]
    fn complete_counts_processed_replies_only() {
        let mut session = signed_in(0, 10);
        let reply = complete(
            &mut session,
            &RelayResponse::from_value(json!({ "success": true, "message": "Hello" })),
        )
        .unwrap();
        assert_eq!(reply.content, "Hello");
        assert!(!reply.is_user);
        assert_eq!(session.state().user.as_ref().unwrap().messages_used, 1);

        let reply = complete(
            &mut session,
            &RelayResponse::from_value(json!([{ "shouldProcess": false, "response": "wait" }])),
        )
        .unwrap();
        assert_eq!(reply.content, "wait");
        assert_eq!(session.state().user.as_ref().unwrap().messages_used, 1);
        assert_eq!(session.state().transcript.len(), 2);
    }

    #[test]
    fn complete_stores_normalized_reply() {
        let mut session = signed_in(0, 10);
        let reply = complete(
            &mut session,
            &RelayResponse::from_value(json!({ "message": "### Title\\nbody 🚀" })),
        )
        .unwrap();
        assert_eq!(reply.content, "Title\nbody");
        assert_eq!(
            session.state().transcript.last().map(|m| m.content.as_str()),
            Some("Title\nbody")
        );
    }

    #[tokio::test]
    async fn send_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"[{"output":"```sql\nSELECT 1;\n```"}]"#),
            )
            .expect(1)
            .mount(&server)
            .await;
        let client =
            RelayClient::new(&Config::with_base(config::parse_base(&server.uri()).unwrap()))
                .unwrap();

        let mut session = signed_in(0, 10);
        let outcome = send(&mut session, &client, "query?", Vec::new()).await.unwrap();
        let SendOutcome::Replied(message) = outcome else {
            panic!("expected a reply");
        };
        assert_eq!(message.content, "```sql\nSELECT 1;\n```");
        assert_eq!(session.state().transcript.len(), 2);
        assert_eq!(session.state().user.as_ref().unwrap().usage_label(), "1/10");
    }

    #[tokio::test]
    async fn send_relay_failure_keeps_user_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;
        let client =
            RelayClient::new(&Config::with_base(config::parse_base(&server.uri()).unwrap()))
                .unwrap();

        let mut session = signed_in(0, 10);
        let err = send(&mut session, &client, "hi", Vec::new()).await.unwrap_err();
        assert!(matches!(err, ChatError::Relay(RelayError::Status { status: 502, .. })));
        assert_eq!(session.state().transcript.len(), 1);
        assert_eq!(session.state().user.as_ref().unwrap().messages_used, 0);
    }
}
