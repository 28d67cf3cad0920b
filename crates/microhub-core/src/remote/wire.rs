//! JSON shapes exchanged with a remote endpoint.

use serde::{Deserialize, Serialize};

use crate::models::{JournalEntry, Movie, Task};

/// Snapshot of the synced collections.
///
/// An absent field means "leave untouched"; an empty list means "clear".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Task>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<Vec<JournalEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movies: Option<Vec<Movie>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

impl Snapshot {
    pub const fn is_empty(&self) -> bool {
        self.tasks.is_none() && self.journal.is_none() && self.movies.is_none() && self.user.is_none()
    }

    /// Overwrite every field that `other` specifies.
    pub fn overwrite_with(&mut self, other: Self) {
        if other.tasks.is_some() {
            self.tasks = other.tasks;
        }
        if other.journal.is_some() {
            self.journal = other.journal;
        }
        if other.movies.is_some() {
            self.movies = other.movies;
        }
        if other.user.is_some() {
            self.user = other.user;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
}

/// POST body understood by a remote endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum RemoteRequest {
    CheckStatus {
        #[serde(alias = "sheetId")]
        store_id: String,
    },
    SetupNewUser {
        #[serde(alias = "sheetId")]
        store_id: String,
        user_name: String,
    },
    Login {
        #[serde(alias = "sheetId")]
        store_id: String,
        auth_key: String,
    },
    WipeAndReset {
        #[serde(alias = "sheetId")]
        store_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_name: Option<String>,
    },
    SyncPush {
        #[serde(alias = "sheetId")]
        store_id: String,
        auth_key: String,
        #[serde(default)]
        data: Snapshot,
    },
}

impl RemoteRequest {
    pub const fn action(&self) -> &'static str {
        match self {
            Self::CheckStatus { .. } => "check_status",
            Self::SetupNewUser { .. } => "setup_new_user",
            Self::Login { .. } => "login",
            Self::WipeAndReset { .. } => "wipe_and_reset",
            Self::SyncPush { .. } => "sync_push",
        }
    }

    pub fn store_id(&self) -> &str {
        match self {
            Self::CheckStatus { store_id }
            | Self::SetupNewUser { store_id, .. }
            | Self::Login { store_id, .. }
            | Self::WipeAndReset { store_id, .. }
            | Self::SyncPush { store_id, .. } => store_id,
        }
    }
}

/// Query string of the snapshot fetch (`GET ?storeId=..&authKey=..`).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchQuery {
    #[serde(alias = "sheetId")]
    pub store_id: String,
    pub auth_key: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    #[default]
    Success,
    NewUser,
    ReturningUser,
    Error,
}

/// Machine-readable error classification carried next to `message`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    InvalidRequest,
    NotFound,
    AlreadyInitialized,
    RateLimited,
    Internal,
    #[serde(other)]
    Unknown,
}

/// Response envelope shared by every action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteResponse {
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Snapshot>,
}

impl RemoteResponse {
    pub fn with_status(status: ResponseStatus) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn success() -> Self {
        Self::with_status(ResponseStatus::Success)
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: Some(message.into()),
            code: Some(code),
            ..Self::default()
        }
    }
}
