//! Key handling for popups: account form, account summary, category, history, upgrade.
//!
//! The open popup is taken out of the app while its handler runs; each handler returns
//! the popup to show next (`None` closes it).

use crossterm::event::{KeyCode, KeyModifiers};

use crate::core::auth::{LoginForm, RegisterForm, ValidationError};
use crate::core::history;
use crate::core::state::Action;

use super::super::app::{
    AuthFormState, AuthMode, HistoryPopupState, ListPopupState, Popup, ScrollPosition,
    UpgradeStage, UpgradeState, upgrade_plans,
};
use super::workers::{self, AuthRequest};
use super::{HandleKeyContext, HandleResult};

pub(crate) fn handle_popup_key(
    key_code: KeyCode,
    key_modifiers: KeyModifiers,
    mut ctx: HandleKeyContext<'_>,
) -> HandleResult {
    let Some(popup) = ctx.app.popup.take() else {
        return HandleResult::Continue;
    };
    let next = match popup {
        Popup::Auth(form) => handle_auth(key_code, key_modifiers, form, &mut ctx),
        Popup::Account => handle_account(key_code, &mut ctx),
        Popup::Category(list) => handle_category(key_code, list, &mut ctx),
        Popup::History(selector) => handle_history(key_code, key_modifiers, selector, &mut ctx),
        Popup::Upgrade(upgrade) => handle_upgrade(key_code, upgrade, &mut ctx),
    };
    ctx.app.popup = next;
    HandleResult::Continue
}

/// Build the request for the current form, or the first validation error.
fn auth_request(form: &AuthFormState) -> Result<AuthRequest, ValidationError> {
    match form.mode {
        AuthMode::Login => {
            let login = LoginForm {
                email: form.email.clone(),
                password: form.password.clone(),
            };
            login.validate()?;
            Ok(AuthRequest::Login(login))
        }
        AuthMode::Register => {
            let register = RegisterForm {
                name: form.name.clone(),
                email: form.email.clone(),
                password: form.password.clone(),
            };
            register.validate()?;
            Ok(AuthRequest::Register(register))
        }
        AuthMode::ResetPassword => {
            if form.email.trim().is_empty() {
                return Err(ValidationError::Missing("Email"));
            }
            Ok(AuthRequest::ResetPassword(form.email.trim().to_string()))
        }
    }
}

fn handle_auth(
    key_code: KeyCode,
    key_modifiers: KeyModifiers,
    mut form: AuthFormState,
    ctx: &mut HandleKeyContext<'_>,
) -> Option<Popup> {
    if form.busy {
        return Some(Popup::Auth(form));
    }
    let field_count = form.mode.fields().len();
    match key_code {
        KeyCode::Esc => return None,
        KeyCode::Char('r') if key_modifiers.contains(KeyModifiers::CONTROL) => form.switch_mode(),
        KeyCode::Tab | KeyCode::Down => form.focus = (form.focus + 1) % field_count,
        KeyCode::BackTab | KeyCode::Up => {
            form.focus = (form.focus + field_count - 1) % field_count
        }
        KeyCode::Enter if form.focus + 1 < field_count => form.focus += 1,
        KeyCode::Enter => match auth_request(&form) {
            Ok(request) => {
                form.error = None;
                form.notice = None;
                form.busy = true;
                ctx.pending.auth = Some(workers::spawn_auth(
                    ctx.rt,
                    ctx.client.clone(),
                    request,
                    ctx.app.state().settings.clone(),
                ));
            }
            Err(e) => form.error = Some(e.to_string()),
        },
        KeyCode::Backspace => {
            let field = form.focused_field();
            form.field_mut(field).pop();
        }
        KeyCode::Char(c) if !key_modifiers.contains(KeyModifiers::CONTROL) => {
            let field = form.focused_field();
            form.field_mut(field).push(c);
            form.error = None;
        }
        _ => {}
    }
    Some(Popup::Auth(form))
}

fn handle_account(key_code: KeyCode, ctx: &mut HandleKeyContext<'_>) -> Option<Popup> {
    match key_code {
        KeyCode::Esc | KeyCode::Enter => None,
        KeyCode::Char('o') => {
            if let Some(chat) = ctx.pending.chat.take() {
                chat.cancel_token.cancel();
                ctx.app.thinking = false;
            }
            ctx.app.dispatch(Action::SignedOut);
            ctx.app.scroll = ScrollPosition::Bottom;
            ctx.app.show_toast("Signed out");
            Some(Popup::Auth(AuthFormState::new(AuthMode::Login)))
        }
        KeyCode::Char('u') => Some(Popup::Upgrade(UpgradeState {
            blocked_at: None,
            stage: UpgradeStage::Choosing(ListPopupState::default()),
        })),
        _ => Some(Popup::Account),
    }
}

fn handle_category(
    key_code: KeyCode,
    mut list: ListPopupState,
    ctx: &mut HandleKeyContext<'_>,
) -> Option<Popup> {
    let count = ctx.app.state().settings.categories.len();
    match key_code {
        KeyCode::Esc => return None,
        KeyCode::Up => list.selected_index = list.selected_index.saturating_sub(1),
        KeyCode::Down => {
            list.selected_index = (list.selected_index + 1).min(count.saturating_sub(1))
        }
        KeyCode::Enter => {
            let Some(category) = ctx
                .app
                .state()
                .settings
                .categories
                .get(list.selected_index)
                .cloned()
            else {
                return None;
            };
            ctx.app
                .dispatch(Action::CategorySelected(category.id.clone()));
            ctx.app.selected_suggestion = 0;
            ctx.app.show_toast(format!("Category: {}", category.name));
            return None;
        }
        _ => {}
    }
    Some(Popup::Category(list))
}

fn handle_history(
    key_code: KeyCode,
    key_modifiers: KeyModifiers,
    mut selector: HistoryPopupState,
    ctx: &mut HandleKeyContext<'_>,
) -> Option<Popup> {
    let ctrl = key_modifiers.contains(KeyModifiers::CONTROL);
    let selected_id = history::filter(&ctx.app.state().saved, &selector.filter)
        .get(selector.selected_index)
        .map(|c| c.id.clone());
    let count = history::filter(&ctx.app.state().saved, &selector.filter).len();

    match key_code {
        KeyCode::Esc => return None,
        KeyCode::Up => selector.selected_index = selector.selected_index.saturating_sub(1),
        KeyCode::Down => {
            selector.selected_index = (selector.selected_index + 1).min(count.saturating_sub(1))
        }
        KeyCode::Enter => {
            let Some(id) = selected_id else {
                return Some(Popup::History(selector));
            };
            if ctx.pending.chat.is_some() {
                ctx.app.show_error("Wait for the current reply first");
                return Some(Popup::History(selector));
            }
            ctx.app.dispatch(Action::ConversationRestored(id));
            ctx.app.scroll = ScrollPosition::Bottom;
            ctx.app.show_toast("Conversation restored");
            return None;
        }
        KeyCode::Char('d') if ctrl => {
            if let Some(id) = selected_id {
                ctx.app.dispatch(Action::ConversationDeleted(id));
                selector.selected_index = selector.selected_index.min(count.saturating_sub(2));
                ctx.app.show_toast("Deleted");
            }
        }
        KeyCode::Char('x') if ctrl => {
            if ctx.pending.chat.is_some() {
                ctx.app.show_error("Wait for the current reply first");
            } else {
                ctx.app.dispatch(Action::HistoryCleared);
                ctx.app.scroll = ScrollPosition::Bottom;
                ctx.app.show_toast("History cleared");
                return None;
            }
        }
        KeyCode::Backspace => {
            selector.filter.pop();
            selector.selected_index = 0;
        }
        KeyCode::Char(c) if !ctrl => {
            selector.filter.push(c);
            selector.selected_index = 0;
        }
        _ => {}
    }
    Some(Popup::History(selector))
}

fn handle_upgrade(
    key_code: KeyCode,
    mut upgrade: UpgradeState,
    ctx: &mut HandleKeyContext<'_>,
) -> Option<Popup> {
    match &mut upgrade.stage {
        UpgradeStage::Choosing(list) => {
            let plans = upgrade_plans(ctx.app.state());
            let count = plans.len();
            let chosen = plans.get(list.selected_index).map(|p| (*p).clone());
            match key_code {
                KeyCode::Esc => return None,
                KeyCode::Up => list.selected_index = list.selected_index.saturating_sub(1),
                KeyCode::Down => {
                    list.selected_index = (list.selected_index + 1).min(count.saturating_sub(1))
                }
                KeyCode::Enter => {
                    let (Some(plan), Some(user)) = (chosen, ctx.app.state().user.clone()) else {
                        return None;
                    };
                    log::info!("Starting payment for plan {}", plan.id);
                    upgrade.stage = UpgradeStage::Waiting {
                        plan_name: plan.name.clone(),
                        url: None,
                    };
                    ctx.pending.payment = Some(workers::spawn_payment(
                        ctx.rt,
                        ctx.client.clone(),
                        ctx.config,
                        user,
                        plan,
                    ));
                }
                _ => {}
            }
        }
        UpgradeStage::Waiting { .. } => {
            if key_code == KeyCode::Esc {
                if let Some(payment) = ctx.pending.payment.take() {
                    payment.cancel_token.cancel();
                }
                ctx.app
                    .show_toast("Stopped waiting. The payment may still complete.");
                return None;
            }
        }
        UpgradeStage::Finished { .. } => {
            if matches!(key_code, KeyCode::Esc | KeyCode::Enter) {
                return None;
            }
        }
    }
    Some(Popup::Upgrade(upgrade))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(mode: AuthMode, name: &str, email: &str, password: &str) -> AuthFormState {
        let mut form = AuthFormState::new(mode);
        form.name = name.to_string();
        form.email = email.to_string();
        form.password = password.to_string();
        form
    }

    #[test]
    fn auth_request_validates_each_mode() {
        assert!(matches!(
            auth_request(&form(AuthMode::Login, "", "a@b.c", "pw")),
            Ok(AuthRequest::Login(_))
        ));
        assert_eq!(
            auth_request(&form(AuthMode::Login, "", "a@b.c", "")).err(),
            Some(ValidationError::Missing("Password"))
        );
        assert_eq!(
            auth_request(&form(AuthMode::Register, "", "a@b.c", "pw")).err(),
            Some(ValidationError::Missing("Name"))
        );
        assert!(matches!(
            auth_request(&form(AuthMode::ResetPassword, "", " a@b.c ", "")),
            Ok(AuthRequest::ResetPassword(email)) if email == "a@b.c"
        ));
        assert_eq!(
            auth_request(&form(AuthMode::ResetPassword, "", "", "")).err(),
            Some(ValidationError::Missing("Email"))
        );
    }
}
