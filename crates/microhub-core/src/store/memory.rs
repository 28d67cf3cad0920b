//! In-process store, shared between clones.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::{LocalStore, StorageKey};
use crate::error::Result;

#[derive(Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<StorageKey, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current raw value under `key`, without going through the async API.
    pub fn get(&self, key: StorageKey) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    pub fn insert(&self, key: StorageKey, value: impl Into<String>) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value.into());
    }
}

impl LocalStore for MemoryStore {
    async fn load(&self, key: StorageKey) -> Result<Option<String>> {
        Ok(self.get(key))
    }

    async fn save(&self, key: StorageKey, value: &str) -> Result<()> {
        self.insert(key, value);
        Ok(())
    }

    async fn remove(&self, key: StorageKey) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
        Ok(())
    }
}
