//! Remote endpoint contract and HTTP client.

mod http;
mod wire;

use std::fmt;
use std::future::Future;

use thiserror::Error;

pub use http::HttpRemoteClient;
pub use wire::{
    ErrorCode, FetchQuery, RemoteRequest, RemoteResponse, ResponseStatus, Snapshot, UserProfile,
};

use crate::models::{Connection, StoreTarget};

/// Messages that legacy endpoints use for rejected credentials.
const LEGACY_AUTH_MESSAGES: [&str; 2] = ["Invalid Credentials", "Unauthorized"];

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Remote rejected credentials: {0}")]
    Unauthorized(String),
    #[error("Remote endpoint error: {message}")]
    Api {
        code: Option<ErrorCode>,
        message: String,
    },
    #[error("Remote request timed out")]
    Timeout,
    #[error("Remote HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),
    #[error("Invalid remote payload: {0}")]
    InvalidPayload(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

impl RemoteError {
    /// Classify an error envelope.
    ///
    /// The structured `code` wins; without one the message is matched against
    /// the phrases older endpoints use.
    pub fn from_envelope(code: Option<ErrorCode>, message: impl Into<String>) -> Self {
        let message = message.into();
        let unauthorized = match code {
            Some(code) => code == ErrorCode::Unauthorized,
            None => LEGACY_AUTH_MESSAGES
                .iter()
                .any(|phrase| message.contains(phrase)),
        };
        if unauthorized {
            Self::Unauthorized(message)
        } else {
            Self::Api { code, message }
        }
    }

    /// Whether the stored credentials must be dropped.
    pub const fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Whether the call might succeed if repeated later.
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout
                | Self::Http(_)
                | Self::Api {
                    code: Some(ErrorCode::Internal | ErrorCode::RateLimited) | None,
                    ..
                }
        )
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(error)
        }
    }
}

/// A freshly minted access key. Shown to the user once.
#[derive(Clone, PartialEq, Eq)]
pub struct MintedKey(String);

impl MintedKey {
    pub fn new(raw: impl Into<String>) -> RemoteResult<Self> {
        let raw = raw.into().trim().to_string();
        if raw.is_empty() {
            return Err(RemoteError::InvalidPayload(
                "response did not include rawKey".to_string(),
            ));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for MintedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MintedKey([REDACTED])")
    }
}

/// Outcome of `check_status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreStatus {
    NewUser,
    ReturningUser { user_name: Option<String> },
}

/// The remote store, one method per protocol action.
pub trait RemoteEndpoint: Send + Sync + 'static {
    fn check_status(
        &self,
        target: &StoreTarget,
    ) -> impl Future<Output = RemoteResult<StoreStatus>> + Send;

    fn setup_new_user(
        &self,
        target: &StoreTarget,
        user_name: &str,
    ) -> impl Future<Output = RemoteResult<MintedKey>> + Send;

    fn login(
        &self,
        target: &StoreTarget,
        access_key: &str,
    ) -> impl Future<Output = RemoteResult<()>> + Send;

    /// Erase the store. With a user name the store is re-keyed and the new
    /// key returned.
    fn wipe_and_reset(
        &self,
        target: &StoreTarget,
        user_name: Option<&str>,
    ) -> impl Future<Output = RemoteResult<Option<MintedKey>>> + Send;

    fn fetch_snapshot(
        &self,
        connection: &Connection,
    ) -> impl Future<Output = RemoteResult<Snapshot>> + Send;

    fn push_snapshot(
        &self,
        connection: &Connection,
        data: &Snapshot,
    ) -> impl Future<Output = RemoteResult<()>> + Send;
}
