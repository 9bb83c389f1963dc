//! Plan upgrades: payment sessions, provider transaction messages, and status polling.

mod poller;

pub use poller::{PaymentPoller, PollOutcome, PollState};

use serde::Deserialize;

/// `type` carried by provider transaction messages.
pub const TRANSACTION_MESSAGE_TYPE: &str = "TransactionResponse";

/// Payment page opened for the user, as returned by the initiate endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSession {
    #[serde(alias = "paymentUrl", alias = "iframeUrl")]
    pub url: String,
    #[serde(alias = "sessionId", alias = "id")]
    pub transaction_id: String,
}

/// Transaction status reported by the provider or the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Success,
    Approved,
    Failed,
    Error,
    Pending,
}

impl TransactionStatus {
    /// Parse a status string. Unknown values are treated as still pending.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" => TransactionStatus::Success,
            "approved" => TransactionStatus::Approved,
            "failed" => TransactionStatus::Failed,
            "error" => TransactionStatus::Error,
            _ => TransactionStatus::Pending,
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, TransactionStatus::Success | TransactionStatus::Approved)
    }

    pub fn is_failure(self) -> bool {
        matches!(self, TransactionStatus::Failed | TransactionStatus::Error)
    }
}

/// `{type, status, message?}` payload posted by the payment iframe and echoed by the
/// status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransactionPayload {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl TransactionPayload {
    pub fn status(&self) -> TransactionStatus {
        TransactionStatus::parse(&self.status)
    }
}

fn normalize_origin(origin: &str) -> String {
    origin.trim().trim_end_matches('/').to_ascii_lowercase()
}

/// Accept a cross-document transaction message only from an allowed origin and only
/// when it is a `TransactionResponse`. Everything else is ignored.
pub fn accept_transaction_message(
    origin: &str,
    data: &str,
    allowed_origins: &[String],
) -> Option<TransactionPayload> {
    let origin = normalize_origin(origin);
    if !allowed_origins
        .iter()
        .any(|allowed| normalize_origin(allowed) == origin)
    {
        log::warn!("Ignoring transaction message from untrusted origin {}", origin);
        return None;
    }
    let payload: TransactionPayload = match serde_json::from_str(data) {
        Ok(p) => p,
        Err(e) => {
            log::debug!("Ignoring malformed transaction message: {}", e);
            return None;
        }
    };
    (payload.kind == TRANSACTION_MESSAGE_TYPE).then_some(payload)
}
