//! Global shortcut handlers (when no popup is open).

use std::io;
use std::path::PathBuf;

use crate::core::app;
use crate::core::paths;
use crate::core::state::Action;

use super::super::app::{
    AuthFormState, AuthMode, HistoryPopupState, ListPopupState, Popup, ScrollPosition,
    UpgradeStage, UpgradeState,
};
use super::super::shortcuts::Shortcut;
use super::{HandleKeyContext, HandleResult};

/// Write previewable markup to the cache dir so a browser can open it.
fn write_preview(markup: &str) -> io::Result<PathBuf> {
    let dir = paths::cache_dir()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no cache directory"))?;
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(format!("{}-preview.html", app::NAME));
    std::fs::write(&path, markup)?;
    Ok(path)
}

pub(crate) fn handle_shortcut(shortcut: Shortcut, ctx: HandleKeyContext<'_>) -> HandleResult {
    let HandleKeyContext { app, pending, .. } = ctx;
    match shortcut {
        Shortcut::Quit => return HandleResult::Break,
        Shortcut::History => app.popup = Some(Popup::History(HistoryPopupState::default())),
        Shortcut::Account => {
            app.popup = Some(if app.state().user.is_some() {
                Popup::Account
            } else {
                Popup::Auth(AuthFormState::new(AuthMode::Login))
            });
        }
        Shortcut::Upgrade => {
            if app.state().user.is_none() {
                app.show_error("Sign in to upgrade");
                app.popup = Some(Popup::Auth(AuthFormState::new(AuthMode::Login)));
            } else if let Some(payment) = &pending.payment {
                app.popup = Some(Popup::Upgrade(UpgradeState {
                    blocked_at: None,
                    stage: UpgradeStage::Waiting {
                        plan_name: payment.plan.name.clone(),
                        url: payment.url.clone(),
                    },
                }));
            } else {
                app.popup = Some(Popup::Upgrade(UpgradeState {
                    blocked_at: None,
                    stage: UpgradeStage::Choosing(ListPopupState::default()),
                }));
            }
        }
        Shortcut::Category => {
            let state = app.state();
            let selected_index = state
                .category
                .as_deref()
                .and_then(|id| state.settings.categories.iter().position(|c| c.id == id))
                .unwrap_or(0);
            app.popup = Some(Popup::Category(ListPopupState {
                selected_index,
                ..Default::default()
            }));
        }
        Shortcut::NewConversation => {
            if pending.chat.is_some() {
                app.show_error("Wait for the current reply first");
            } else {
                let had_messages = !app.state().transcript.is_empty();
                app.dispatch(Action::ConversationStarted);
                app.scroll = ScrollPosition::Bottom;
                app.input.clear();
                if had_messages {
                    app.show_toast("Conversation saved");
                }
            }
        }
        Shortcut::ToggleTheme => {
            app.dispatch(Action::ThemeToggled);
            let name = app.state().theme.name();
            app.show_toast(format!("Theme: {}", name));
        }
        Shortcut::CopyCode => match app.last_reply_content() {
            Some(content) if content.flags.offers_copy_code() => {
                match arboard::Clipboard::new().and_then(|mut c| c.set_text(content.copy_text())) {
                    Ok(()) => app.show_toast("Copied"),
                    Err(e) => {
                        log::warn!("Clipboard unavailable: {}", e);
                        app.show_error("Clipboard unavailable");
                    }
                }
            }
            _ => app.show_error("No code to copy"),
        },
        Shortcut::Preview => match app.last_reply_content() {
            Some(content) if content.flags.offers_preview() => {
                let opened = write_preview(&content.copy_text())
                    .and_then(|path| opener::open(&path).map_err(io::Error::other));
                match opened {
                    Ok(()) => app.show_toast("Opened preview"),
                    Err(e) => {
                        log::warn!("Preview failed: {}", e);
                        app.show_error(format!("Preview failed: {}", e));
                    }
                }
            }
            _ => app.show_error("Nothing to preview"),
        },
    }
    HandleResult::Continue
}
