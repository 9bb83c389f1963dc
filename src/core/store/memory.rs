use std::collections::HashMap;

use super::{Store, StoreError, StoreKey};

/// In-process store; nothing survives the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<StoreKey, String>,
}

impl Store for MemoryStore {
    fn get(&self, key: StoreKey) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(&key).cloned())
    }

    fn set(&mut self, key: StoreKey, value: &str) -> Result<(), StoreError> {
        self.values.insert(key, value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: StoreKey) -> Result<(), StoreError> {
        self.values.remove(&key);
        Ok(())
    }
}
