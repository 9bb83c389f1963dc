//! Application state, mutated only through [`Action`]s.
//!
//! [`Session`] owns the state and a [`Store`]; every dispatch persists the keys the
//! action touched.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::history::{self, SavedConversation};
use crate::core::message::Message;
use crate::core::quota::User;
use crate::core::settings::{PricingPlan, Settings};
use crate::core::store::{self, Store, StoreError, StoreKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub user: Option<User>,
    /// Canonical id of the selected category. Chat is gated on this.
    pub category: Option<String>,
    /// Current conversation, oldest first.
    pub transcript: Vec<Message>,
    /// Archived conversations, most recent first.
    pub saved: Vec<SavedConversation>,
    pub theme: Theme,
    pub session_id: String,
    pub settings: Settings,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            user: None,
            category: None,
            transcript: Vec::new(),
            saved: Vec::new(),
            theme: Theme::default(),
            session_id: Uuid::new_v4().to_string(),
            settings: Settings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SignedIn(User),
    /// Forget the user and the current transcript. Saved conversations stay.
    SignedOut,
    CategorySelected(String),
    MessageAppended(Message),
    /// One relay reply counted against the user's quota.
    UsageRecorded,
    PlanUpgraded(PricingPlan),
    /// Archive the transcript into the saved list and start empty.
    ConversationStarted,
    /// Archive the current transcript, then move a saved conversation back into it.
    ConversationRestored(String),
    ConversationDeleted(String),
    /// Drop the transcript and every saved conversation.
    HistoryCleared,
    ThemeSet(Theme),
    ThemeToggled,
    SettingsImported(Settings),
    SettingsReset,
}

impl AppState {
    /// Apply `action` and return the store keys whose values changed.
    pub fn apply(&mut self, action: Action) -> Vec<StoreKey> {
        match action {
            Action::SignedIn(user) => {
                self.user = Some(user);
                vec![StoreKey::CurrentUser]
            }
            Action::SignedOut => {
                self.user = None;
                self.transcript.clear();
                vec![StoreKey::CurrentUser, StoreKey::Transcript]
            }
            Action::CategorySelected(id) => {
                self.category = Some(id);
                vec![StoreKey::SelectedCategory]
            }
            Action::MessageAppended(message) => {
                self.transcript.push(message);
                vec![StoreKey::Transcript]
            }
            Action::UsageRecorded => match self.user.as_mut() {
                Some(user) => {
                    user.record_message();
                    vec![StoreKey::CurrentUser]
                }
                None => Vec::new(),
            },
            Action::PlanUpgraded(plan) => match self.user.as_mut() {
                Some(user) => {
                    user.apply_plan(&plan);
                    vec![StoreKey::CurrentUser]
                }
                None => Vec::new(),
            },
            Action::ConversationStarted => {
                if self.transcript.is_empty() {
                    return Vec::new();
                }
                self.archive_transcript();
                vec![StoreKey::Transcript, StoreKey::SavedConversations]
            }
            Action::ConversationRestored(id) => {
                let Some(restored) = history::remove(&mut self.saved, &id) else {
                    return Vec::new();
                };
                self.archive_transcript();
                self.transcript = restored.messages;
                let mut changed = vec![StoreKey::Transcript, StoreKey::SavedConversations];
                if let Some(category) = restored.category
                    && self.settings.category(&category).is_some()
                {
                    self.category = Some(category);
                    changed.push(StoreKey::SelectedCategory);
                }
                changed
            }
            Action::ConversationDeleted(id) => match history::remove(&mut self.saved, &id) {
                Some(_) => vec![StoreKey::SavedConversations],
                None => Vec::new(),
            },
            Action::HistoryCleared => {
                self.transcript.clear();
                self.saved.clear();
                vec![StoreKey::Transcript, StoreKey::SavedConversations]
            }
            Action::ThemeSet(theme) => {
                self.theme = theme;
                vec![StoreKey::Theme]
            }
            Action::ThemeToggled => {
                self.theme = self.theme.toggled();
                vec![StoreKey::Theme]
            }
            Action::SettingsImported(settings) => {
                self.settings = settings;
                self.drop_unknown_category()
            }
            Action::SettingsReset => {
                self.settings = Settings::default();
                self.drop_unknown_category()
            }
        }
    }

    fn archive_transcript(&mut self) {
        let messages = std::mem::take(&mut self.transcript);
        history::archive(&mut self.saved, messages, self.category.clone());
    }

    fn drop_unknown_category(&mut self) -> Vec<StoreKey> {
        let mut changed = vec![StoreKey::Settings];
        if let Some(id) = &self.category
            && self.settings.category(id).is_none()
        {
            log::info!("Selected category {} no longer exists", id);
            self.category = None;
            changed.push(StoreKey::SelectedCategory);
        }
        changed
    }

    pub fn selected_category_name(&self) -> Option<&str> {
        let id = self.category.as_deref()?;
        self.settings.category(id).map(|c| c.name.as_str())
    }
}

/// State plus the store it is persisted to.
pub struct Session<S: Store> {
    store: S,
    state: AppState,
}

impl<S: Store> Session<S> {
    /// Load state from `store`. Corrupt values are ignored with a warning; a missing
    /// session id is generated and written back.
    pub fn open(store: S) -> Result<Self, StoreError> {
        let mut state = AppState {
            user: store::load_or_default(&store, StoreKey::CurrentUser),
            category: store::load_or_default(&store, StoreKey::SelectedCategory),
            transcript: store::load_or_default(&store, StoreKey::Transcript),
            saved: store::load_or_default(&store, StoreKey::SavedConversations),
            theme: store::load_or_default(&store, StoreKey::Theme),
            ..AppState::default()
        };
        let stored_settings: Option<Settings> = store::load_or_default(&store, StoreKey::Settings);
        if let Some(settings) = stored_settings {
            match settings.validate() {
                Ok(()) => state.settings = settings,
                Err(e) => log::warn!("Ignoring stored settings: {}", e),
            }
        }
        state.saved.truncate(history::MAX_SAVED);

        let stored_session: Option<String> = store::load_or_default(&store, StoreKey::SessionId);
        let mut session = Self { store, state };
        match stored_session {
            Some(id) if !id.trim().is_empty() => session.state.session_id = id,
            _ => session.persist(StoreKey::SessionId)?,
        }
        Ok(session)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply `action` and persist what it changed.
    pub fn dispatch(&mut self, action: Action) -> Result<(), StoreError> {
        for key in self.state.apply(action) {
            self.persist(key)?;
        }
        Ok(())
    }

    fn persist(&mut self, key: StoreKey) -> Result<(), StoreError> {
        let state = &self.state;
        let store: &mut dyn Store = &mut self.store;
        match key {
            StoreKey::CurrentUser => store::save_optional(store, key, state.user.as_ref()),
            StoreKey::Transcript => store::save(store, key, &state.transcript),
            StoreKey::SavedConversations => store::save(store, key, &state.saved),
            StoreKey::Theme => store::save(store, key, &state.theme),
            StoreKey::SessionId => store::save(store, key, &state.session_id),
            StoreKey::SelectedCategory => {
                store::save_optional(store, key, state.category.as_ref())
            }
            StoreKey::Settings if state.settings == Settings::default() => store.remove(key),
            StoreKey::Settings => store::save(store, key, &state.settings),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::MemoryStore;

    fn user() -> User {
        User {
            id: "u1".to_string(),
            email: "a@example.com".to_string(),
            name: "A".to_string(),
            plan: "free".to_string(),
            messages_used: 0,
            message_limit: 10,
        }
    }

    fn reopen(session: &Session<MemoryStore>) -> Session<MemoryStore> {
        Session::open(session.store().clone()).unwrap()
    }

    #[test]
    fn session_id_is_generated_once() {
        let session = Session::open(MemoryStore::default()).unwrap();
        assert!(!session.state().session_id.is_empty());
        assert_eq!(reopen(&session).state().session_id, session.state().session_id);
    }

    #[test]
    fn dispatch_persists_changes() {
        let mut session = Session::open(MemoryStore::default()).unwrap();
        session.dispatch(Action::SignedIn(user())).unwrap();
        session
            .dispatch(Action::CategorySelected("code".to_string()))
            .unwrap();
        session
            .dispatch(Action::MessageAppended(Message::user("hi", Some("code".to_string()))))
            .unwrap();
        session.dispatch(Action::UsageRecorded).unwrap();
        session.dispatch(Action::ThemeToggled).unwrap();

        let reopened = reopen(&session);
        let state = reopened.state();
        assert_eq!(state.user.as_ref().map(|u| u.messages_used), Some(1));
        assert_eq!(state.category.as_deref(), Some("code"));
        assert_eq!(state.transcript.len(), 1);
        assert_eq!(state.theme, Theme::Light);
    }

    #[test]
    fn new_conversation_archives_transcript() {
        let mut session = Session::open(MemoryStore::default()).unwrap();
        session.dispatch(Action::ConversationStarted).unwrap();
        assert!(session.state().saved.is_empty());

        session
            .dispatch(Action::MessageAppended(Message::user("first", None)))
            .unwrap();
        session.dispatch(Action::ConversationStarted).unwrap();
        let state = reopen(&session).state().clone();
        assert!(state.transcript.is_empty());
        assert_eq!(state.saved.len(), 1);
        assert_eq!(state.saved[0].title, "first");
    }

    #[test]
    fn restore_swaps_transcript_and_category() {
        let mut session = Session::open(MemoryStore::default()).unwrap();
        session
            .dispatch(Action::CategorySelected("sql".to_string()))
            .unwrap();
        session
            .dispatch(Action::MessageAppended(Message::user("old", None)))
            .unwrap();
        session.dispatch(Action::ConversationStarted).unwrap();
        session
            .dispatch(Action::CategorySelected("code".to_string()))
            .unwrap();
        session
            .dispatch(Action::MessageAppended(Message::user("current", None)))
            .unwrap();

        let id = session.state().saved[0].id.clone();
        session.dispatch(Action::ConversationRestored(id)).unwrap();
        let state = session.state();
        assert_eq!(state.transcript[0].content, "old");
        assert_eq!(state.category.as_deref(), Some("sql"));
        assert_eq!(state.saved.len(), 1);
        assert_eq!(state.saved[0].title, "current");
    }

    #[test]
    fn sign_out_keeps_saved_conversations() {
        let mut session = Session::open(MemoryStore::default()).unwrap();
        session.dispatch(Action::SignedIn(user())).unwrap();
        session
            .dispatch(Action::MessageAppended(Message::user("a", None)))
            .unwrap();
        session.dispatch(Action::ConversationStarted).unwrap();
        session
            .dispatch(Action::MessageAppended(Message::user("b", None)))
            .unwrap();
        session.dispatch(Action::SignedOut).unwrap();
        let state = reopen(&session).state().clone();
        assert!(state.user.is_none());
        assert!(state.transcript.is_empty());
        assert_eq!(state.saved.len(), 1);
    }

    #[test]
    fn history_cleared_and_deleted() {
        let mut session = Session::open(MemoryStore::default()).unwrap();
        for text in ["a", "b"] {
            session
                .dispatch(Action::MessageAppended(Message::user(text, None)))
                .unwrap();
            session.dispatch(Action::ConversationStarted).unwrap();
        }
        let id = session.state().saved[0].id.clone();
        session.dispatch(Action::ConversationDeleted(id)).unwrap();
        assert_eq!(session.state().saved.len(), 1);
        session.dispatch(Action::HistoryCleared).unwrap();
        assert!(reopen(&session).state().saved.is_empty());
    }

    #[test]
    fn importing_settings_drops_missing_category() {
        let mut session = Session::open(MemoryStore::default()).unwrap();
        session
            .dispatch(Action::CategorySelected("sql".to_string()))
            .unwrap();
        let mut settings = Settings::default();
        settings.categories.retain(|c| c.id == "general");
        settings.prompts.retain(|p| p.category == "general");
        session
            .dispatch(Action::SettingsImported(settings.clone()))
            .unwrap();

        let reopened = reopen(&session);
        assert_eq!(reopened.state().settings, settings);
        assert!(reopened.state().category.is_none());

        session.dispatch(Action::SettingsReset).unwrap();
        assert_eq!(reopen(&session).state().settings, Settings::default());
    }

    #[test]
    fn upgrade_keeps_usage() {
        let mut session = Session::open(MemoryStore::default()).unwrap();
        let mut u = user();
        u.messages_used = 10;
        session.dispatch(Action::SignedIn(u)).unwrap();
        let plan = session.state().settings.plan("pro").cloned().unwrap();
        session.dispatch(Action::PlanUpgraded(plan)).unwrap();
        let user = session.state().user.clone().unwrap();
        assert_eq!(user.plan, "pro");
        assert_eq!(user.messages_used, 10);
        assert!(user.check_quota().is_allowed());
    }

    #[test]
    fn theme_parse() {
        assert_eq!(Theme::parse("LIGHT"), Some(Theme::Light));
        assert_eq!(Theme::parse("blue"), None);
        assert_eq!(Theme::Dark.toggled().name(), "light");
    }
}
