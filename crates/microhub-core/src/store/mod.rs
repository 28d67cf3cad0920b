//! Local key-value persistence.
//!
//! Every persisted value is JSON text stored under a fixed [`StorageKey`].
//! The coordinator reads and writes whole collections at a time.

mod database;
mod memory;
mod migrations;

use std::fmt;
use std::future::Future;

pub use database::LibSqlStore;
pub use memory::MemoryStore;

use crate::Result;

/// Keys of the values the hub persists locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Tasks,
    Journal,
    Movies,
    Username,
    Theme,
    Connection,
    Route,
}

impl StorageKey {
    pub const ALL: [Self; 7] = [
        Self::Tasks,
        Self::Journal,
        Self::Movies,
        Self::Username,
        Self::Theme,
        Self::Connection,
        Self::Route,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tasks => "microhub_tasks",
            Self::Journal => "microhub_journal_entries",
            Self::Movies => "microhub_movies",
            Self::Username => "microhub_username",
            Self::Theme => "microhub_theme",
            Self::Connection => "microhub_connection",
            Self::Route => "microhub_route",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for local storage operations
pub trait LocalStore: Send + Sync + 'static {
    /// Load the raw value stored under `key`
    fn load(&self, key: StorageKey) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Store `value` under `key`, replacing any previous value
    fn save(&self, key: StorageKey, value: &str) -> impl Future<Output = Result<()>> + Send;

    /// Remove the value under `key`; missing keys are not an error
    fn remove(&self, key: StorageKey) -> impl Future<Output = Result<()>> + Send;
}
