//! Spawns relay requests on background threads; results come back over channels.

use std::sync::Arc;
use std::sync::mpsc;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use crate::core::auth::{self, LoginForm, RegisterForm};
use crate::core::config::Config;
use crate::core::payment::PaymentPoller;
use crate::core::quota::User;
use crate::core::relay::{ChatRequest, RelayClient};
use crate::core::settings::{PricingPlan, Settings};

use super::{AuthOutcome, PaymentEvent, PendingAuth, PendingChat, PendingPayment};

/// Spawn a chat request. Cancelling the token drops the request without a result.
pub fn spawn_chat(rt: &Arc<Runtime>, client: RelayClient, request: ChatRequest) -> PendingChat {
    let (result_tx, result_rx) = mpsc::channel();
    let cancel_token = CancellationToken::new();
    let cancel_token_clone = cancel_token.clone();
    let rt_clone = Arc::clone(rt);

    std::thread::spawn(move || {
        rt_clone.block_on(async move {
            tokio::select! {
                biased;
                _ = cancel_token_clone.cancelled() => log::debug!("Chat request cancelled"),
                result = client.send_chat(&request) => {
                    let _ = result_tx.send(result);
                }
            }
        });
    });

    PendingChat {
        result_rx,
        cancel_token,
    }
}

/// A form submission, already validated on the UI thread.
pub enum AuthRequest {
    Login(LoginForm),
    Register(RegisterForm),
    ResetPassword(String),
}

pub fn spawn_auth(
    rt: &Arc<Runtime>,
    client: RelayClient,
    request: AuthRequest,
    settings: Settings,
) -> PendingAuth {
    let (result_tx, result_rx) = mpsc::channel();
    let rt_clone = Arc::clone(rt);

    std::thread::spawn(move || {
        let result = rt_clone.block_on(async move {
            match request {
                AuthRequest::Login(form) => auth::login(&client, &form, &settings)
                    .await
                    .map(AuthOutcome::SignedIn),
                AuthRequest::Register(form) => auth::register(&client, &form, &settings)
                    .await
                    .map(AuthOutcome::SignedIn),
                AuthRequest::ResetPassword(email) => auth::reset_password(&client, &email)
                    .await
                    .map(AuthOutcome::ResetSent),
            }
        });
        let _ = result_tx.send(result);
    });

    PendingAuth { result_rx }
}

/// Initiate a payment, report the payment page, then poll until it settles or is cancelled.
pub fn spawn_payment(
    rt: &Arc<Runtime>,
    client: RelayClient,
    config: &Config,
    user: User,
    plan: PricingPlan,
) -> PendingPayment {
    let (events_tx, events_rx) = mpsc::channel();
    let cancel_token = CancellationToken::new();
    let cancel_token_clone = cancel_token.clone();
    let rt_clone = Arc::clone(rt);
    let interval = config.payment_poll_interval;
    let attempts = config.payment_poll_attempts;
    let plan_clone = plan.clone();

    std::thread::spawn(move || {
        rt_clone.block_on(async move {
            let session = match client.initiate_payment(&user, &plan_clone).await {
                Ok(session) => session,
                Err(e) => {
                    let _ = events_tx.send(PaymentEvent::InitiateFailed(e.to_string()));
                    return;
                }
            };
            let transaction_id = session.transaction_id.clone();
            let _ = events_tx.send(PaymentEvent::Opened(session));
            let client = &client;
            let transaction_id = transaction_id.as_str();
            let outcome = PaymentPoller::new(attempts)
                .run(interval, cancel_token_clone, move || {
                    client.payment_status(transaction_id)
                })
                .await;
            let _ = events_tx.send(PaymentEvent::Finished(outcome));
        });
    });

    PendingPayment {
        events_rx,
        cancel_token,
        plan,
        url: None,
    }
}
