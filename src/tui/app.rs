//! TUI application state: session, input, scroll, popups, toast.

use std::time::{Duration, Instant};

use ratatui::widgets::ListState;

use crate::core::content::PreparedContent;
use crate::core::message::Message;
use crate::core::settings::PricingPlan;
use crate::core::state::{Action, AppState, Session};
use crate::core::store::FileStore;

use super::constants::{Palette, TOAST_SECS};

/// Which account form is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
    ResetPassword,
}

impl AuthMode {
    pub fn next(self) -> Self {
        match self {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::ResetPassword,
            AuthMode::ResetPassword => AuthMode::Login,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            AuthMode::Login => " Sign in ",
            AuthMode::Register => " Create account ",
            AuthMode::ResetPassword => " Reset password ",
        }
    }

    /// Visible fields, in focus order.
    pub fn fields(self) -> &'static [AuthField] {
        match self {
            AuthMode::Login => &[AuthField::Email, AuthField::Password],
            AuthMode::Register => &[AuthField::Name, AuthField::Email, AuthField::Password],
            AuthMode::ResetPassword => &[AuthField::Email],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    Name,
    Email,
    Password,
}

impl AuthField {
    pub fn label(self) -> &'static str {
        match self {
            AuthField::Name => "Name",
            AuthField::Email => "Email",
            AuthField::Password => "Password",
        }
    }
}

/// State for the account popup (signed out).
pub struct AuthFormState {
    pub mode: AuthMode,
    pub name: String,
    pub email: String,
    pub password: String,
    /// Index into `mode.fields()`.
    pub focus: usize,
    pub error: Option<String>,
    /// Shown after a reset request succeeds.
    pub notice: Option<String>,
    pub busy: bool,
}

impl AuthFormState {
    pub fn new(mode: AuthMode) -> Self {
        Self {
            mode,
            name: String::new(),
            email: String::new(),
            password: String::new(),
            focus: 0,
            error: None,
            notice: None,
            busy: false,
        }
    }

    pub fn focused_field(&self) -> AuthField {
        let fields = self.mode.fields();
        fields[self.focus.min(fields.len() - 1)]
    }

    pub fn field_mut(&mut self, field: AuthField) -> &mut String {
        match field {
            AuthField::Name => &mut self.name,
            AuthField::Email => &mut self.email,
            AuthField::Password => &mut self.password,
        }
    }

    pub fn field(&self, field: AuthField) -> &str {
        match field {
            AuthField::Name => &self.name,
            AuthField::Email => &self.email,
            AuthField::Password => &self.password,
        }
    }

    pub fn switch_mode(&mut self) {
        self.mode = self.mode.next();
        self.focus = 0;
        self.error = None;
        self.notice = None;
    }
}

/// State for list popups (category picker, plan list).
#[derive(Default)]
pub struct ListPopupState {
    pub selected_index: usize,
    pub list_state: ListState,
}

/// State for the history popup (Alt+H).
#[derive(Default)]
pub struct HistoryPopupState {
    pub selected_index: usize,
    pub list_state: ListState,
    pub filter: String,
}

/// Upgrade flow: choose a plan, then wait for the payment to settle.
pub enum UpgradeStage {
    Choosing(ListPopupState),
    Waiting { plan_name: String, url: Option<String> },
    Finished { message: String, is_error: bool },
}

/// Plans the signed-in user can move to, cheapest first.
pub(crate) fn upgrade_plans(state: &AppState) -> Vec<&PricingPlan> {
    match &state.user {
        Some(user) => state.settings.upgrades_from(user.message_limit),
        None => Vec::new(),
    }
}

pub struct UpgradeState {
    /// Usage that triggered the view, when it was opened by the quota gate.
    pub blocked_at: Option<(u32, u32)>,
    pub stage: UpgradeStage,
}

pub enum Popup {
    Auth(AuthFormState),
    /// Signed-in account summary with a sign-out key.
    Account,
    Category(ListPopupState),
    History(HistoryPopupState),
    Upgrade(UpgradeState),
}

/// Scroll position: either a specific line index, or "at bottom" (follow new content).
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollPosition {
    Line(usize),
    #[default]
    Bottom,
}

pub struct Toast {
    pub text: String,
    pub is_error: bool,
    pub until: Instant,
}

pub struct App {
    pub(crate) session: Session<FileStore>,
    /// User input in the text field.
    pub(crate) input: String,
    pub(crate) scroll: ScrollPosition,
    pub(crate) last_max_scroll: usize,
    /// Index of the prompt suggestion Tab inserts next.
    pub(crate) selected_suggestion: usize,
    pub(crate) popup: Option<Popup>,
    pub(crate) toast: Option<Toast>,
    /// Whether to show timestamps next to message labels (from RELAY_SHOW_TIMESTAMPS).
    pub(crate) show_timestamps: bool,
    /// Esc was pressed; next key = Option+key (Mac terminals with "Use option as meta").
    pub(crate) escape_pending: bool,
    /// True while a chat request is in flight.
    pub(crate) thinking: bool,
}

impl App {
    pub fn new(session: Session<FileStore>, show_timestamps: bool) -> Self {
        let popup = if session.state().user.is_none() {
            Some(Popup::Auth(AuthFormState::new(AuthMode::Login)))
        } else if session.state().selected_category_name().is_none() {
            Some(Popup::Category(ListPopupState::default()))
        } else {
            None
        };
        Self {
            session,
            input: String::new(),
            scroll: ScrollPosition::default(),
            last_max_scroll: 0,
            selected_suggestion: 0,
            popup,
            toast: None,
            show_timestamps,
            escape_pending: false,
            thinking: false,
        }
    }

    pub(crate) fn state(&self) -> &AppState {
        self.session.state()
    }

    pub(crate) fn palette(&self) -> Palette {
        Palette::for_theme(self.state().theme)
    }

    /// Apply an action; a storage failure becomes an error toast.
    pub(crate) fn dispatch(&mut self, action: Action) {
        if let Err(e) = self.session.dispatch(action) {
            log::error!("Failed to persist state: {}", e);
            self.show_error(format!("Save failed: {}", e));
        }
    }

    pub(crate) fn show_toast(&mut self, text: impl Into<String>) {
        self.toast = Some(Toast {
            text: text.into(),
            is_error: false,
            until: Instant::now() + Duration::from_secs(TOAST_SECS),
        });
    }

    pub(crate) fn show_error(&mut self, text: impl Into<String>) {
        self.toast = Some(Toast {
            text: text.into(),
            is_error: true,
            until: Instant::now() + Duration::from_secs(TOAST_SECS),
        });
    }

    /// Last assistant message of the current conversation.
    pub(crate) fn last_reply(&self) -> Option<&Message> {
        self.state().transcript.iter().rev().find(|m| !m.is_user)
    }

    pub(crate) fn last_reply_content(&self) -> Option<PreparedContent> {
        self.last_reply().map(|m| PreparedContent::new(&m.content))
    }

    /// Must be called before scroll_up/scroll_down when at bottom.
    pub(crate) fn materialize_scroll(&mut self) {
        if self.scroll == ScrollPosition::Bottom {
            self.scroll = ScrollPosition::Line(self.last_max_scroll);
        }
    }

    pub(crate) fn scroll_down(&mut self, n: usize) {
        self.materialize_scroll();
        if let ScrollPosition::Line(pos) = self.scroll {
            let next = (pos + n).min(self.last_max_scroll);
            self.scroll = if next == self.last_max_scroll {
                ScrollPosition::Bottom
            } else {
                ScrollPosition::Line(next)
            };
        }
    }

    pub(crate) fn scroll_up(&mut self, n: usize) {
        self.materialize_scroll();
        if let ScrollPosition::Line(pos) = self.scroll {
            self.scroll = ScrollPosition::Line(pos.saturating_sub(n));
        }
    }

    /// Resolve scroll position to a concrete line index.
    pub(crate) fn scroll_line(&self) -> usize {
        match self.scroll {
            ScrollPosition::Line(n) => n.min(self.last_max_scroll),
            ScrollPosition::Bottom => self.last_max_scroll,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_modes_cycle_and_reset_focus() {
        let mut form = AuthFormState::new(AuthMode::Login);
        form.focus = 1;
        assert_eq!(form.focused_field(), AuthField::Password);
        form.switch_mode();
        assert_eq!(form.mode, AuthMode::Register);
        assert_eq!(form.focused_field(), AuthField::Name);
        form.switch_mode();
        assert_eq!(form.mode.fields(), &[AuthField::Email]);
        form.switch_mode();
        assert_eq!(form.mode, AuthMode::Login);
    }

    #[test]
    fn focus_is_clamped_to_visible_fields() {
        let mut form = AuthFormState::new(AuthMode::ResetPassword);
        form.focus = 2;
        assert_eq!(form.focused_field(), AuthField::Email);
        form.field_mut(AuthField::Email).push_str("a@b.c");
        assert_eq!(form.field(AuthField::Email), "a@b.c");
    }
}
