//! Handler for main input (chat input, prompt suggestions, scroll).

use crossterm::event::{KeyCode, KeyModifiers};

use crate::core::chat::{self, ChatError, Prepared};

use super::super::app::{
    AuthFormState, AuthMode, ListPopupState, Popup, ScrollPosition, UpgradeStage, UpgradeState,
};
use super::super::constants;
use super::workers;
use super::{HandleKeyContext, HandleResult};

/// Gate the message, append it, and start the relay call on a worker thread.
fn send_input(ctx: HandleKeyContext<'_>) {
    let HandleKeyContext {
        app,
        client,
        pending,
        rt,
        ..
    } = ctx;
    if pending.chat.is_some() {
        return;
    }
    let text = app.input.trim().to_string();
    match chat::prepare(&mut app.session, &text, Vec::new()) {
        Ok(Prepared::Ready(request)) => {
            app.input.clear();
            app.selected_suggestion = 0;
            app.scroll = ScrollPosition::Bottom;
            app.thinking = true;
            pending.chat = Some(workers::spawn_chat(rt, client.clone(), request));
        }
        Ok(Prepared::UpgradeRequired { used, limit }) => {
            app.popup = Some(Popup::Upgrade(UpgradeState {
                blocked_at: Some((used, limit)),
                stage: UpgradeStage::Choosing(ListPopupState::default()),
            }));
        }
        Err(ChatError::NotSignedIn) => {
            app.popup = Some(Popup::Auth(AuthFormState::new(AuthMode::Login)));
        }
        Err(ChatError::NoCategory) => {
            app.show_error(ChatError::NoCategory.to_string());
            app.popup = Some(Popup::Category(ListPopupState::default()));
        }
        Err(ChatError::EmptyMessage) => {}
        Err(e) => app.show_error(e.to_string()),
    }
}

/// Insert the next prompt suggestion for the selected category.
fn insert_suggestion(ctx: HandleKeyContext<'_>) {
    let app = ctx.app;
    let state = app.state();
    let Some(category) = state.category.as_deref() else {
        return;
    };
    let prompts: Vec<String> = state
        .settings
        .prompts_for(category)
        .map(|p| p.text.clone())
        .collect();
    if prompts.is_empty() {
        return;
    }
    let index = app.selected_suggestion % prompts.len();
    app.input = prompts[index].clone();
    app.selected_suggestion = index + 1;
}

/// Handle main input keys (when no popup is open).
pub(crate) fn handle_main_input(
    key_code: KeyCode,
    key_modifiers: KeyModifiers,
    ctx: HandleKeyContext<'_>,
) -> HandleResult {
    match (key_code, key_modifiers) {
        (KeyCode::Enter, _) => send_input(ctx),
        (KeyCode::Tab, _) => insert_suggestion(ctx),
        (KeyCode::Backspace, _) => {
            ctx.app.input.pop();
        }
        (KeyCode::Char('u'), KeyModifiers::CONTROL) => ctx.app.input.clear(),
        (KeyCode::Up, _) => ctx.app.scroll_up(constants::SCROLL_LINES_SMALL),
        (KeyCode::Down, _) => ctx.app.scroll_down(constants::SCROLL_LINES_SMALL),
        (KeyCode::PageUp, _) => ctx.app.scroll_up(constants::SCROLL_LINES_PAGE),
        (KeyCode::PageDown, _) => ctx.app.scroll_down(constants::SCROLL_LINES_PAGE),
        (KeyCode::Char(c), mods) => {
            // Ignore Alt/Ctrl+key: user likely intended a shortcut (e.g. Alt+H)
            if !mods.intersects(KeyModifiers::ALT | KeyModifiers::CONTROL) {
                ctx.app.input.push(c);
            }
        }
        _ => {}
    }
    HandleResult::Continue
}
