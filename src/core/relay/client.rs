//! Typed HTTP client for the relay webhooks.

use std::fs;
use std::io;
use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::core::app;
use crate::core::config::Config;
use crate::core::payment::{PaymentSession, TransactionPayload, TransactionStatus};
use crate::core::quota::User;
use crate::core::settings::PricingPlan;

use super::{RelayError, RelayResponse};

/// Absolute URL of every webhook, joined once onto the configured base.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub login: Url,
    pub register: Url,
    pub chat: Url,
    pub payment_initiate: Url,
    pub payment_status: Url,
    pub password_reset: Url,
}

impl Endpoints {
    pub fn from_base(base: &Url) -> Result<Self, RelayError> {
        let join = |path: &str| {
            base.join(path)
                .map_err(|e| RelayError::Endpoint(format!("{}: {}", path, e)))
        };
        Ok(Self {
            login: join("login")?,
            register: join("register")?,
            chat: join("chat")?,
            payment_initiate: join("payment/initiate")?,
            payment_status: join("payment/status")?,
            password_reset: join("password-reset")?,
        })
    }
}

/// File sent alongside a chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        let mime = mime_for(&file_name).to_string();
        Ok(Self {
            file_name,
            mime,
            bytes,
        })
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" | "md" | "log" => "text/plain",
        "csv" => "text/csv",
        "json" => "application/json",
        "sql" => "application/sql",
        "html" | "htm" => "text/html",
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

/// One chat turn forwarded to the relay.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub category: String,
    pub session_id: String,
    pub user_id: String,
    pub user_email: String,
    #[serde(skip)]
    pub attachments: Vec<Attachment>,
}

/// User record as the auth webhooks return it. Missing usage fields are filled from
/// settings by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireUser {
    #[serde(alias = "_id", alias = "userId")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub messages_used: Option<u32>,
    #[serde(default)]
    pub message_limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct AuthReply {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    user: Option<WireUser>,
}

fn default_success() -> bool {
    true
}

/// Decode a webhook body into `T`. Workflow engines often wrap a single item in an
/// array; that wrapper is removed first.
fn decode<T: DeserializeOwned>(body: &str) -> Result<T, RelayError> {
    let value: Value = serde_json::from_str(body.trim())
        .map_err(|e| RelayError::Decode(format!("{} (body: {:?})", e, body.trim())))?;
    let value = match value {
        Value::Array(mut items) if items.len() == 1 => items.remove(0),
        other => other,
    };
    serde_json::from_value(value).map_err(|e| RelayError::Decode(e.to_string()))
}

/// Client for every outbound relay call.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: Client,
    endpoints: Endpoints,
}

impl RelayClient {
    pub fn new(config: &Config) -> Result<Self, RelayError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(format!("{}/{}", app::NAME, app::VERSION))
            .build()?;
        Ok(Self {
            http,
            endpoints: Endpoints::from_base(&config.webhook_base)?,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    async fn read_body(response: Response) -> Result<String, RelayError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RelayError::from_status(status.as_u16(), &body));
        }
        Ok(body)
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &Url,
        payload: &T,
    ) -> Result<String, RelayError> {
        log::debug!("POST {}", url);
        let response = self.http.post(url.clone()).json(payload).send().await?;
        Self::read_body(response).await
    }

    /// Forward a chat message. Attachments switch the request to multipart with one
    /// `files` part per attachment.
    pub async fn send_chat(&self, request: &ChatRequest) -> Result<RelayResponse, RelayError> {
        let body = if request.attachments.is_empty() {
            self.post_json(&self.endpoints.chat, request).await?
        } else {
            let mut form = Form::new()
                .text("message", request.message.clone())
                .text("category", request.category.clone())
                .text("sessionId", request.session_id.clone())
                .text("userId", request.user_id.clone())
                .text("userEmail", request.user_email.clone());
            for attachment in &request.attachments {
                let part = Part::bytes(attachment.bytes.clone())
                    .file_name(attachment.file_name.clone())
                    .mime_str(&attachment.mime)?;
                form = form.part("files", part);
            }
            log::debug!(
                "POST {} (multipart, {} file(s))",
                self.endpoints.chat,
                request.attachments.len()
            );
            let response = self
                .http
                .post(self.endpoints.chat.clone())
                .multipart(form)
                .send()
                .await?;
            Self::read_body(response).await?
        };
        Ok(RelayResponse::from_body(&body))
    }

    async fn authenticate(&self, url: &Url, payload: Value) -> Result<WireUser, RelayError> {
        let body = self.post_json(url, &payload).await?;
        let reply: AuthReply = decode(&body)?;
        if !reply.success {
            return Err(RelayError::Rejected(
                reply
                    .message
                    .unwrap_or_else(|| "Request was rejected".to_string()),
            ));
        }
        reply
            .user
            .ok_or_else(|| RelayError::Decode("reply has no user".to_string()))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<WireUser, RelayError> {
        self.authenticate(
            &self.endpoints.login,
            json!({ "email": email, "password": password }),
        )
        .await
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<WireUser, RelayError> {
        self.authenticate(
            &self.endpoints.register,
            json!({ "name": name, "email": email, "password": password }),
        )
        .await
    }

    /// Request a password reset email. Returns the relay's confirmation text.
    pub async fn reset_password(&self, email: &str) -> Result<String, RelayError> {
        let body = self
            .post_json(&self.endpoints.password_reset, &json!({ "email": email }))
            .await?;
        let reply: AuthReply = decode(&body)?;
        if !reply.success {
            return Err(RelayError::Rejected(
                reply
                    .message
                    .unwrap_or_else(|| "Password reset was rejected".to_string()),
            ));
        }
        Ok(reply
            .message
            .unwrap_or_else(|| "Check your inbox for a reset link.".to_string()))
    }

    pub async fn initiate_payment(
        &self,
        user: &User,
        plan: &PricingPlan,
    ) -> Result<PaymentSession, RelayError> {
        let payload = json!({
            "userId": user.id,
            "email": user.email,
            "planId": plan.id,
            "amount": plan.price,
        });
        let body = self
            .post_json(&self.endpoints.payment_initiate, &payload)
            .await?;
        decode(&body)
    }

    pub async fn payment_status(
        &self,
        transaction_id: &str,
    ) -> Result<(TransactionStatus, Option<String>), RelayError> {
        let body = self
            .post_json(
                &self.endpoints.payment_status,
                &json!({ "transactionId": transaction_id }),
            )
            .await?;
        let payload: TransactionPayload = decode(&body)?;
        Ok((payload.status(), payload.message))
    }
}
