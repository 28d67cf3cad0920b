//! Remote sync: startup reconciliation, debounced pushes and auth teardown.

mod coordinator;
mod scheduler;

use std::fmt;

pub use coordinator::{PullOutcome, SyncCoordinator};

use crate::store::StorageKey;

/// Default quiet period between the last mutation and its push.
pub const DEFAULT_DEBOUNCE_MS: u64 = 2_000;

/// Collections mirrored to the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SyncedCollection {
    Tasks,
    Journal,
    Movies,
    User,
}

impl SyncedCollection {
    pub const ALL: [Self; 4] = [Self::Tasks, Self::Journal, Self::Movies, Self::User];

    pub const fn storage_key(self) -> StorageKey {
        match self {
            Self::Tasks => StorageKey::Tasks,
            Self::Journal => StorageKey::Journal,
            Self::Movies => StorageKey::Movies,
            Self::User => StorageKey::Username,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Journal => "journal",
            Self::Movies => "movies",
            Self::User => "user",
        }
    }
}

impl fmt::Display for SyncedCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-collection sync state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SyncState {
    /// No connection.
    #[default]
    Offline,
    /// Connected, nothing pushed this session.
    Idle,
    /// A push is scheduled.
    Pending,
    Syncing,
    Synced,
    Error,
}

impl SyncState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Error => "error",
        }
    }
}

/// Observable sync status.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub tasks: SyncState,
    pub journal: SyncState,
    pub movies: SyncState,
    pub user: SyncState,
    /// Raised when the remote rejected the stored credentials.
    pub needs_reconnect: bool,
    pub last_error: Option<String>,
}

impl SyncReport {
    pub const fn state(&self, collection: SyncedCollection) -> SyncState {
        match collection {
            SyncedCollection::Tasks => self.tasks,
            SyncedCollection::Journal => self.journal,
            SyncedCollection::Movies => self.movies,
            SyncedCollection::User => self.user,
        }
    }

    pub fn set_state(&mut self, collection: SyncedCollection, state: SyncState) {
        match collection {
            SyncedCollection::Tasks => self.tasks = state,
            SyncedCollection::Journal => self.journal = state,
            SyncedCollection::Movies => self.movies = state,
            SyncedCollection::User => self.user = state,
        }
    }

    pub fn set_all(&mut self, state: SyncState) {
        for collection in SyncedCollection::ALL {
            self.set_state(collection, state);
        }
    }
}
