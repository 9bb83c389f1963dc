//! Event handlers for the TUI: keyboard, mouse, and background results.

mod background;
mod input;
mod popups;
mod shortcuts;
mod workers;

use crossterm::event::{KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use std::sync::Arc;
use std::sync::mpsc;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use crate::core::auth::AuthError;
use crate::core::config::Config;
use crate::core::payment::{PaymentSession, PollOutcome};
use crate::core::quota::User;
use crate::core::relay::{RelayClient, RelayError, RelayResponse};
use crate::core::settings::PricingPlan;

use super::app::App;
use super::constants;
use super::shortcuts::Shortcut;

pub(crate) use background::poll_background;

/// Receiver for a chat request in progress.
pub struct PendingChat {
    pub result_rx: mpsc::Receiver<Result<RelayResponse, RelayError>>,
    /// Token to cancel the in-flight request.
    pub cancel_token: CancellationToken,
}

pub enum AuthOutcome {
    SignedIn(User),
    /// Confirmation text for a reset request.
    ResetSent(String),
}

pub struct PendingAuth {
    pub result_rx: mpsc::Receiver<Result<AuthOutcome, AuthError>>,
}

/// Progress of a payment running on a worker thread.
pub enum PaymentEvent {
    Opened(PaymentSession),
    InitiateFailed(String),
    Finished(PollOutcome),
}

pub struct PendingPayment {
    pub events_rx: mpsc::Receiver<PaymentEvent>,
    pub cancel_token: CancellationToken,
    pub plan: PricingPlan,
    /// Payment page, once the relay returned it.
    pub url: Option<String>,
}

/// Work running off the UI thread.
#[derive(Default)]
pub struct Pending {
    pub chat: Option<PendingChat>,
    pub auth: Option<PendingAuth>,
    pub payment: Option<PendingPayment>,
}

impl Pending {
    /// Cancel everything that supports it (on exit).
    pub fn cancel_all(&mut self) {
        if let Some(chat) = self.chat.take() {
            chat.cancel_token.cancel();
        }
        if let Some(payment) = self.payment.take() {
            payment.cancel_token.cancel();
        }
    }
}

/// Result of handling an event: continue the loop or exit.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum HandleResult {
    Continue,
    Break,
}

/// Context for key event handling. Bundles mutable state to reduce parameter count.
pub struct HandleKeyContext<'a> {
    pub app: &'a mut App,
    pub config: &'a Config,
    pub client: &'a RelayClient,
    pub pending: &'a mut Pending,
    pub rt: &'a Arc<Runtime>,
}

/// True when Esc would start Option+key (escape_pending) rather than close/cancel.
pub(crate) fn would_esc_start_meta_sequence(key: &KeyEvent, app: &App, pending: &Pending) -> bool {
    Shortcut::is_escape(key) && app.popup.is_none() && pending.chat.is_none()
}

/// Handle a mouse event (wheel scroll only).
pub fn handle_mouse(mouse: MouseEvent, app: &mut App) -> HandleResult {
    if app.popup.is_none() {
        match mouse.kind {
            MouseEventKind::ScrollUp => app.scroll_up(constants::SCROLL_LINES_SMALL),
            MouseEventKind::ScrollDown => app.scroll_down(constants::SCROLL_LINES_SMALL),
            _ => {}
        }
    }
    HandleResult::Continue
}

/// Handle a key event. Returns HandleResult::Break to exit the main loop.
pub fn handle_key(key: KeyEvent, ctx: HandleKeyContext<'_>) -> HandleResult {
    if key.kind != KeyEventKind::Press {
        return HandleResult::Continue;
    }
    // Esc+key sequence (Option as Meta on Mac terminals)
    if ctx.app.escape_pending {
        ctx.app.escape_pending = false;
        if ctx.app.popup.is_none()
            && let Some(shortcut) = Shortcut::match_key(&key, true)
        {
            return shortcuts::handle_shortcut(shortcut, ctx);
        }
    }

    if let Some(shortcut) = Shortcut::match_key(&key, false) {
        if shortcut == Shortcut::Quit {
            return HandleResult::Break;
        }
        if ctx.app.popup.is_none() {
            return shortcuts::handle_shortcut(shortcut, ctx);
        }
    }

    if ctx.app.popup.is_some() {
        return popups::handle_popup_key(key.code, key.modifiers, ctx);
    }

    // Esc: cancel in-flight chat, or start Option+key sequence.
    if Shortcut::is_escape(&key) {
        if let Some(chat) = ctx.pending.chat.take() {
            chat.cancel_token.cancel();
            ctx.app.thinking = false;
            ctx.app.show_toast("Cancelled");
            return HandleResult::Continue;
        }
        ctx.app.escape_pending = true;
        return HandleResult::Continue;
    }

    input::handle_main_input(key.code, key.modifiers, ctx)
}
