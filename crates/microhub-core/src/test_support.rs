//! In-memory remote endpoint for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::models::{Connection, StoreTarget};
use crate::remote::{
    ErrorCode, MintedKey, RemoteEndpoint, RemoteError, RemoteResult, Snapshot, StoreStatus,
};

#[derive(Default)]
struct FakeState {
    key: Option<String>,
    user_name: Option<String>,
    snapshot: Snapshot,
    pushes: Vec<Snapshot>,
    logins: usize,
    minted: u32,
    failures: VecDeque<RemoteError>,
    fetch_delay: Option<Duration>,
    push_delay: Option<Duration>,
}

/// Behaves like a single remote store; every call can be made to fail.
#[derive(Clone, Default)]
pub struct FakeRemote {
    state: Arc<Mutex<FakeState>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Initialize the store for `user_name` and return its key.
    pub fn initialize(&self, user_name: &str) -> String {
        let mut state = self.lock();
        let key = mint(&mut state);
        state.user_name = Some(user_name.to_string());
        key
    }

    pub fn key(&self) -> Option<String> {
        self.lock().key.clone()
    }

    pub fn set_snapshot(&self, snapshot: Snapshot) {
        self.lock().snapshot = snapshot;
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot.clone()
    }

    pub fn pushes(&self) -> Vec<Snapshot> {
        self.lock().pushes.clone()
    }

    pub fn logins(&self) -> usize {
        self.lock().logins
    }

    /// The next call of any kind fails with `error`.
    pub fn fail_next(&self, error: RemoteError) {
        self.lock().failures.push_back(error);
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        self.lock().fetch_delay = Some(delay);
    }

    pub fn set_push_delay(&self, delay: Duration) {
        self.lock().push_delay = Some(delay);
    }

    fn take_failure(&self) -> RemoteResult<()> {
        self.lock().failures.pop_front().map_or(Ok(()), Err)
    }

    fn authorize(&self, key: &str) -> RemoteResult<()> {
        if self.lock().key.as_deref() == Some(key) {
            Ok(())
        } else {
            Err(RemoteError::Unauthorized("Invalid Credentials".to_string()))
        }
    }
}

fn mint(state: &mut FakeState) -> String {
    state.minted += 1;
    let key = format!("{:06}", 100_000 + state.minted);
    state.key = Some(key.clone());
    key
}

impl RemoteEndpoint for FakeRemote {
    async fn check_status(&self, _target: &StoreTarget) -> RemoteResult<StoreStatus> {
        self.take_failure()?;
        let state = self.lock();
        Ok(match state.key {
            Some(_) => StoreStatus::ReturningUser {
                user_name: state.user_name.clone(),
            },
            None => StoreStatus::NewUser,
        })
    }

    async fn setup_new_user(&self, _target: &StoreTarget, user_name: &str) -> RemoteResult<MintedKey> {
        self.take_failure()?;
        let mut state = self.lock();
        if state.key.is_some() {
            return Err(RemoteError::from_envelope(
                Some(ErrorCode::AlreadyInitialized),
                "Store already initialized",
            ));
        }
        state.user_name = Some(user_name.to_string());
        MintedKey::new(mint(&mut state))
    }

    async fn login(&self, _target: &StoreTarget, access_key: &str) -> RemoteResult<()> {
        self.take_failure()?;
        self.authorize(access_key)?;
        self.lock().logins += 1;
        Ok(())
    }

    async fn wipe_and_reset(
        &self,
        _target: &StoreTarget,
        user_name: Option<&str>,
    ) -> RemoteResult<Option<MintedKey>> {
        self.take_failure()?;
        let mut state = self.lock();
        state.snapshot = Snapshot::default();
        state.key = None;
        state.user_name = user_name.map(str::to_string);
        match user_name {
            Some(_) => MintedKey::new(mint(&mut state)).map(Some),
            None => Ok(None),
        }
    }

    async fn fetch_snapshot(&self, connection: &Connection) -> RemoteResult<Snapshot> {
        let delay = self.lock().fetch_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.take_failure()?;
        self.authorize(connection.access_key())?;
        Ok(self.snapshot())
    }

    async fn push_snapshot(&self, connection: &Connection, data: &Snapshot) -> RemoteResult<()> {
        let delay = self.lock().push_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.take_failure()?;
        self.authorize(connection.access_key())?;
        let mut state = self.lock();
        state.pushes.push(data.clone());
        state.snapshot.overwrite_with(data.clone());
        Ok(())
    }
}
