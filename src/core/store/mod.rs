//! Key-value persistence adapter for application state.
//!
//! Values are JSON strings. [`FileStore`] keeps one file per key under the data
//! directory; [`MemoryStore`] backs tests and ephemeral sessions.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Every persisted slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    CurrentUser,
    Transcript,
    SavedConversations,
    Theme,
    SessionId,
    Settings,
    SelectedCategory,
}

impl StoreKey {
    pub const ALL: [StoreKey; 7] = [
        StoreKey::CurrentUser,
        StoreKey::Transcript,
        StoreKey::SavedConversations,
        StoreKey::Theme,
        StoreKey::SessionId,
        StoreKey::Settings,
        StoreKey::SelectedCategory,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StoreKey::CurrentUser => "current_user",
            StoreKey::Transcript => "transcript",
            StoreKey::SavedConversations => "saved_conversations",
            StoreKey::Theme => "theme",
            StoreKey::SessionId => "session_id",
            StoreKey::Settings => "settings",
            StoreKey::SelectedCategory => "selected_category",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("No data directory available")]
    NoDataDir,
    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Corrupt stored value: {0}")]
    Json(#[from] serde_json::Error),
}

/// Raw JSON-string storage keyed by [`StoreKey`].
pub trait Store {
    fn get(&self, key: StoreKey) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: StoreKey, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: StoreKey) -> Result<(), StoreError>;
}

/// Read and deserialize a value. `None` when the key was never written.
pub fn load<T: DeserializeOwned>(store: &dyn Store, key: StoreKey) -> Result<Option<T>, StoreError> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Like [`load`], but a corrupt value is logged and treated as absent.
pub fn load_or_default<T: DeserializeOwned + Default>(store: &dyn Store, key: StoreKey) -> T {
    match load(store, key) {
        Ok(value) => value.unwrap_or_default(),
        Err(e) => {
            log::warn!("Ignoring stored {}: {}", key.name(), e);
            T::default()
        }
    }
}

pub fn save<T: Serialize + ?Sized>(
    store: &mut dyn Store,
    key: StoreKey,
    value: &T,
) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(value)?;
    store.set(key, &json)
}

/// Write `value` when present, otherwise remove the key.
pub fn save_optional<T: Serialize>(
    store: &mut dyn Store,
    key: StoreKey,
    value: Option<&T>,
) -> Result<(), StoreError> {
    match value {
        Some(v) => save(store, key, v),
        None => store.remove(key),
    }
}
