//! Connect flow for a remote store.
//!
//! ```text
//! Checking ──new_user──────▶ NewStore ──create_store──▶ Authenticated
//!     └─────returning_user─▶ ReturningStore ──login──▶ Authenticated
//!                              │   ▲
//!                 request_wipe ▼   │ cancel_wipe
//!                             WipeConfirm ──confirm_wipe──▶ Authenticated
//! ```
//!
//! Any remote failure moves the flow to `Error`, which remembers the state to
//! resume. Dropping the flow abandons it without persisting anything.

use thiserror::Error;

use crate::models::{Connection, StoreTarget};
use crate::remote::{MintedKey, RemoteEndpoint, RemoteError, StoreStatus};
use crate::util::normalize_text_option;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapState {
    Checking,
    NewStore,
    ReturningStore {
        user_name: Option<String>,
    },
    WipeConfirm {
        user_name: Option<String>,
    },
    Authenticated,
    Error {
        message: String,
        resume: Box<BootstrapState>,
    },
}

impl BootstrapState {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::NewStore => "new store",
            Self::ReturningStore { .. } => "returning store",
            Self::WipeConfirm { .. } => "wipe confirmation",
            Self::Authenticated => "authenticated",
            Self::Error { .. } => "error",
        }
    }

    /// The state user input applies to; `Error` defers to its resume state.
    fn effective(&self) -> &Self {
        match self {
            Self::Error { resume, .. } => resume.effective(),
            other => other,
        }
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Cannot {action} while in {state} state")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Credentials produced by a successful flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub connection: Connection,
    /// Display name learned from the remote or entered during setup.
    pub user_name: Option<String>,
}

pub struct BootstrapFlow<'a, R> {
    remote: &'a R,
    target: StoreTarget,
    state: BootstrapState,
    authenticated: Option<Authenticated>,
}

impl<'a, R: RemoteEndpoint> BootstrapFlow<'a, R> {
    /// Validate the address and start in `Checking`. No network call is made.
    pub fn new(remote: &'a R, endpoint_url: &str, store_id: &str) -> Result<Self, BootstrapError> {
        let target = StoreTarget::new(endpoint_url, store_id)
            .map_err(|error| BootstrapError::Validation(error.to_string()))?;
        Ok(Self {
            remote,
            target,
            state: BootstrapState::Checking,
            authenticated: None,
        })
    }

    pub const fn state(&self) -> &BootstrapState {
        &self.state
    }

    pub const fn target(&self) -> &StoreTarget {
        &self.target
    }

    /// Ask the remote whether the store is new or returning.
    pub async fn check(&mut self) -> Result<&BootstrapState, BootstrapError> {
        self.require_state("check store status", |state| {
            matches!(state, BootstrapState::Checking)
        })?;

        match self.remote.check_status(&self.target).await {
            Ok(StoreStatus::NewUser) => self.state = BootstrapState::NewStore,
            Ok(StoreStatus::ReturningUser { user_name }) => {
                self.state = BootstrapState::ReturningStore {
                    user_name: normalize_text_option(user_name),
                };
            }
            Err(error) => return Err(self.fail(BootstrapState::Checking, error)),
        }
        tracing::debug!(state = self.state.label(), "Checked remote store");
        Ok(&self.state)
    }

    /// Initialize a new store. The returned key is not shown again.
    pub async fn create_store(&mut self, user_name: &str) -> Result<MintedKey, BootstrapError> {
        self.require_state("create store", |state| matches!(state, BootstrapState::NewStore))?;
        let user_name = required(user_name, "name")?;

        match self.remote.setup_new_user(&self.target, &user_name).await {
            Ok(key) => {
                self.authenticate(key.as_str(), Some(user_name))?;
                Ok(key)
            }
            Err(error) => Err(self.fail(BootstrapState::NewStore, error)),
        }
    }

    /// Log in to a returning store. On failure the key can be re-entered.
    pub async fn login(&mut self, access_key: &str) -> Result<(), BootstrapError> {
        let user_name = match self.state.effective() {
            BootstrapState::ReturningStore { user_name } => user_name.clone(),
            other => return Err(invalid("log in", other)),
        };
        let access_key = required(access_key, "access key")?;

        match self.remote.login(&self.target, &access_key).await {
            Ok(()) => self.authenticate(&access_key, user_name),
            Err(error) => Err(self.fail(BootstrapState::ReturningStore { user_name }, error)),
        }
    }

    /// Lost key: ask for confirmation before erasing the store.
    pub fn request_wipe(&mut self) -> Result<(), BootstrapError> {
        match self.state.effective() {
            BootstrapState::ReturningStore { user_name } => {
                self.state = BootstrapState::WipeConfirm {
                    user_name: user_name.clone(),
                };
                Ok(())
            }
            other => Err(invalid("request a wipe", other)),
        }
    }

    pub fn cancel_wipe(&mut self) -> Result<(), BootstrapError> {
        match &self.state {
            BootstrapState::WipeConfirm { user_name } => {
                self.state = BootstrapState::ReturningStore {
                    user_name: user_name.clone(),
                };
                Ok(())
            }
            other => Err(invalid("cancel a wipe", other)),
        }
    }

    /// Erase the store and re-key it for `user_name`.
    pub async fn confirm_wipe(&mut self, user_name: &str) -> Result<MintedKey, BootstrapError> {
        let previous = match self.state.effective() {
            state @ BootstrapState::WipeConfirm { .. } => state.clone(),
            other => return Err(invalid("confirm a wipe", other)),
        };
        let user_name = required(user_name, "name")?;

        let minted = self
            .remote
            .wipe_and_reset(&self.target, Some(&user_name))
            .await
            .and_then(|key| {
                key.ok_or_else(|| {
                    RemoteError::InvalidPayload("wipe_and_reset did not return a key".to_string())
                })
            });

        match minted {
            Ok(key) => {
                tracing::info!("Remote store wiped and re-keyed");
                self.authenticate(key.as_str(), Some(user_name))?;
                Ok(key)
            }
            Err(error) => Err(self.fail(previous, error)),
        }
    }

    /// Leave `Error` for the state it interrupted.
    pub fn retry(&mut self) -> Result<(), BootstrapError> {
        match &self.state {
            BootstrapState::Error { resume, .. } => {
                self.state = (**resume).clone();
                Ok(())
            }
            other => Err(invalid("retry", other)),
        }
    }

    pub fn into_authenticated(self) -> Option<Authenticated> {
        self.authenticated
    }

    fn require_state(
        &self,
        action: &'static str,
        allowed: impl Fn(&BootstrapState) -> bool,
    ) -> Result<(), BootstrapError> {
        let state = self.state.effective();
        if allowed(state) {
            Ok(())
        } else {
            Err(invalid(action, state))
        }
    }

    fn authenticate(&mut self, access_key: &str, user_name: Option<String>) -> Result<(), BootstrapError> {
        let connection = Connection::new(self.target.clone(), access_key)
            .map_err(|error| BootstrapError::Validation(error.to_string()))?;
        self.authenticated = Some(Authenticated {
            connection,
            user_name,
        });
        self.state = BootstrapState::Authenticated;
        Ok(())
    }

    fn fail(&mut self, resume: BootstrapState, error: RemoteError) -> BootstrapError {
        tracing::warn!(%error, state = resume.label(), "Connect flow step failed");
        self.state = BootstrapState::Error {
            message: error.to_string(),
            resume: Box::new(resume),
        };
        BootstrapError::Remote(error)
    }
}

fn required(value: &str, field: &str) -> Result<String, BootstrapError> {
    normalize_text_option(Some(value.to_string()))
        .ok_or_else(|| BootstrapError::Validation(format!("{field} must not be empty")))
}

fn invalid(action: &'static str, state: &BootstrapState) -> BootstrapError {
    BootstrapError::InvalidTransition {
        action,
        state: state.label(),
    }
}
