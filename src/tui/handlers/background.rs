//! Applies results from background workers to the app (called once per loop tick).

use std::sync::mpsc::TryRecvError;

use crate::core::chat;
use crate::core::payment::PollOutcome;
use crate::core::state::Action;

use super::super::app::{App, ListPopupState, Popup, ScrollPosition, UpgradeStage};
use super::{AuthOutcome, Pending, PaymentEvent};

pub(crate) fn poll_background(app: &mut App, pending: &mut Pending) {
    poll_chat(app, pending);
    poll_auth(app, pending);
    poll_payment(app, pending);
}

fn poll_chat(app: &mut App, pending: &mut Pending) {
    let Some(chat_pending) = &pending.chat else {
        return;
    };
    let result = match chat_pending.result_rx.try_recv() {
        Ok(result) => result,
        Err(TryRecvError::Empty) => return,
        Err(TryRecvError::Disconnected) => {
            pending.chat = None;
            app.thinking = false;
            return;
        }
    };
    pending.chat = None;
    app.thinking = false;
    match result {
        Ok(response) => match chat::complete(&mut app.session, &response) {
            Ok(_) => app.scroll = ScrollPosition::Bottom,
            Err(e) => app.show_error(e.to_string()),
        },
        Err(e) => {
            log::warn!("Chat request failed: {}", e);
            app.show_error(e.to_string());
        }
    }
}

fn poll_auth(app: &mut App, pending: &mut Pending) {
    let Some(auth_pending) = &pending.auth else {
        return;
    };
    let result = match auth_pending.result_rx.try_recv() {
        Ok(result) => result,
        Err(TryRecvError::Empty) => return,
        Err(TryRecvError::Disconnected) => {
            pending.auth = None;
            return;
        }
    };
    pending.auth = None;
    match result {
        Ok(AuthOutcome::SignedIn(user)) => {
            let greeting = format!("Signed in as {}", user.name);
            app.dispatch(Action::SignedIn(user));
            app.popup = if app.state().selected_category_name().is_none() {
                Some(Popup::Category(ListPopupState::default()))
            } else {
                None
            };
            app.show_toast(greeting);
        }
        Ok(AuthOutcome::ResetSent(notice)) => {
            if let Some(Popup::Auth(form)) = &mut app.popup {
                form.busy = false;
                form.notice = Some(notice);
            } else {
                app.show_toast(notice);
            }
        }
        Err(e) => {
            if let Some(Popup::Auth(form)) = &mut app.popup {
                form.busy = false;
                form.error = Some(e.to_string());
            } else {
                app.show_error(e.to_string());
            }
        }
    }
}

fn set_upgrade_stage(app: &mut App, stage: UpgradeStage) {
    if let Some(Popup::Upgrade(upgrade)) = &mut app.popup {
        upgrade.stage = stage;
    }
}

fn poll_payment(app: &mut App, pending: &mut Pending) {
    let Some(payment) = &mut pending.payment else {
        return;
    };
    let event = match payment.events_rx.try_recv() {
        Ok(event) => event,
        Err(TryRecvError::Empty) => return,
        Err(TryRecvError::Disconnected) => {
            pending.payment = None;
            return;
        }
    };
    match event {
        PaymentEvent::Opened(session) => {
            if let Err(e) = opener::open(&session.url) {
                log::warn!("Could not open browser: {}", e);
            }
            payment.url = Some(session.url.clone());
            let plan_name = payment.plan.name.clone();
            set_upgrade_stage(
                app,
                UpgradeStage::Waiting {
                    plan_name,
                    url: Some(session.url),
                },
            );
        }
        PaymentEvent::InitiateFailed(message) => {
            pending.payment = None;
            set_upgrade_stage(
                app,
                UpgradeStage::Finished {
                    message: format!("Could not start the payment: {}", message),
                    is_error: true,
                },
            );
        }
        PaymentEvent::Finished(outcome) => {
            let plan = payment.plan.clone();
            pending.payment = None;
            let (message, is_error) = match outcome {
                PollOutcome::Succeeded => {
                    app.dispatch(Action::PlanUpgraded(plan.clone()));
                    app.show_toast(format!("Upgraded to {}", plan.name));
                    (
                        format!(
                            "Payment confirmed. You are now on {} ({} messages).",
                            plan.name, plan.message_limit
                        ),
                        false,
                    )
                }
                PollOutcome::Failed(reason) => (
                    format!(
                        "Payment failed: {}",
                        reason.unwrap_or_else(|| "no reason given".to_string())
                    ),
                    true,
                ),
                PollOutcome::TimedOut => (
                    "Payment was not confirmed in time. Check your plan later or try again."
                        .to_string(),
                    true,
                ),
                PollOutcome::Cancelled => return,
            };
            set_upgrade_stage(app, UpgradeStage::Finished { message, is_error });
        }
    }
}
