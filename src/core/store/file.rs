//! One JSON file per key under the data directory (`<key>.json`).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::core::paths;

use super::{Store, StoreError, StoreKey};

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at the platform data directory (or `RELAY_CHAT_DATA_DIR`).
    pub fn open_default() -> Result<Self, StoreError> {
        paths::data_dir().map(Self::new).ok_or(StoreError::NoDataDir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: StoreKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.name()))
    }
}

impl Store for FileStore {
    fn get(&self, key: StoreKey) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path(key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: StoreKey, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(key);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, value)?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    fn remove(&mut self, key: StoreKey) -> Result<(), StoreError> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
