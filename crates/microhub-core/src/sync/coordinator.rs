//! Sync coordinator owning the hub state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;

use super::scheduler::PushScheduler;
use super::{SyncReport, SyncState, SyncedCollection};
use crate::bootstrap::{Authenticated, BootstrapError, BootstrapFlow};
use crate::error::{Error, Result};
use crate::models::{
    Connection, EntityId, JournalEntry, Movie, Priority, Route, Task, TaskStatus, Theme,
    WatchStatus,
};
use crate::remote::{RemoteEndpoint, RemoteError};
use crate::state::HubState;
use crate::store::{LocalStore, StorageKey};

/// Result of pulling the remote snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullOutcome {
    NotConnected,
    /// Startup reconciliation already ran this session.
    AlreadyReconciled,
    /// Collections overwritten from the remote.
    Applied(Vec<SyncedCollection>),
    /// The connection changed while the fetch was outstanding.
    Discarded,
    /// Transient failure; local data kept.
    Failed(String),
    /// The remote rejected the credentials and the connection was dropped.
    Disconnected,
}

struct Inner<S, R> {
    store: S,
    remote: R,
    state: Mutex<HubState>,
    report: StdMutex<SyncReport>,
    scheduler: Arc<PushScheduler>,
    reconciled: AtomicBool,
}

/// Owns the hub state and keeps it in step with the local store and the
/// remote endpoint.
///
/// Every mutation is written to the local store before it returns. While a
/// connection exists, the mutated collection is pushed once it has been quiet
/// for the debounce period.
pub struct SyncCoordinator<S, R> {
    inner: Arc<Inner<S, R>>,
}

impl<S, R> Clone for SyncCoordinator<S, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: LocalStore, R: RemoteEndpoint> SyncCoordinator<S, R> {
    /// Load state from `store`. Pushes wait `debounce` after the last mutation.
    pub async fn open(store: S, remote: R, debounce: Duration) -> Result<Self> {
        let state = HubState::load(&store).await?;
        let mut report = SyncReport::default();
        if state.connection.is_some() {
            report.set_all(SyncState::Idle);
        }

        Ok(Self {
            inner: Arc::new(Inner {
                store,
                remote,
                state: Mutex::new(state),
                report: StdMutex::new(report),
                scheduler: Arc::new(PushScheduler::new(debounce)),
                reconciled: AtomicBool::new(false),
            }),
        })
    }

    pub async fn state(&self) -> HubState {
        self.inner.state.lock().await.clone()
    }

    pub async fn tasks(&self) -> Vec<Task> {
        self.inner.state.lock().await.tasks.to_vec()
    }

    pub async fn journal(&self) -> Vec<JournalEntry> {
        self.inner.state.lock().await.journal.to_vec()
    }

    pub async fn movies(&self) -> Vec<Movie> {
        self.inner.state.lock().await.movies.to_vec()
    }

    pub async fn connection(&self) -> Option<Connection> {
        self.inner.state.lock().await.connection.clone()
    }

    pub fn report(&self) -> SyncReport {
        self.inner.report().clone()
    }

    /// Start the connect flow against a remote store.
    pub fn bootstrap(
        &self,
        endpoint_url: &str,
        store_id: &str,
    ) -> std::result::Result<BootstrapFlow<'_, R>, BootstrapError> {
        BootstrapFlow::new(&self.inner.remote, endpoint_url, store_id)
    }

    /// Startup reconciliation. Runs at most once per session.
    pub async fn startup(&self) -> PullOutcome {
        if self.inner.reconciled.swap(true, Ordering::SeqCst) {
            return PullOutcome::AlreadyReconciled;
        }
        self.pull().await
    }

    /// Fetch the remote snapshot and overwrite every collection it specifies.
    pub async fn pull(&self) -> PullOutcome {
        self.inner.pull().await
    }

    /// Persist new credentials and bootstrap local state from the remote.
    pub async fn connect(&self, authenticated: Authenticated) -> Result<PullOutcome> {
        self.inner.scheduler.cancel_pending();
        {
            let mut state = self.inner.state.lock().await;
            let previous = state.clone();
            state.connection = Some(authenticated.connection);
            if let Some(name) = authenticated.user_name {
                state.username = Some(name);
            }
            if let Err(error) = persist_keys(
                &state,
                &self.inner.store,
                &[StorageKey::Connection, StorageKey::Username],
            )
            .await
            {
                *state = previous;
                return Err(error);
            }
        }

        {
            let mut report = self.inner.report();
            report.set_all(SyncState::Idle);
            report.needs_reconnect = false;
            report.last_error = None;
        }
        self.inner.reconciled.store(true, Ordering::SeqCst);
        tracing::info!("Connected to remote store");

        Ok(self.pull().await)
    }

    /// Forget the connection and the username.
    pub async fn disconnect(&self) -> Result<()> {
        self.inner.scheduler.cancel_pending();
        {
            let mut state = self.inner.state.lock().await;
            let previous = state.clone();
            state.connection = None;
            state.username = None;
            if let Err(error) = persist_keys(
                &state,
                &self.inner.store,
                &[StorageKey::Connection, StorageKey::Username],
            )
            .await
            {
                *state = previous;
                return Err(error);
            }
        }

        let mut report = self.inner.report();
        *report = SyncReport::default();
        tracing::info!("Disconnected from remote store");
        Ok(())
    }

    pub async fn add_task(&self, title: &str, description: &str, priority: Priority) -> Result<Task> {
        let task = Task::new(title, description, priority)?;
        self.commit(SyncedCollection::Tasks, |state| {
            state.tasks.insert(task.clone())?;
            Ok(task)
        })
        .await
    }

    pub async fn move_task(&self, id: &EntityId, status: TaskStatus) -> Result<Task> {
        self.commit(SyncedCollection::Tasks, |state| {
            let task = state
                .tasks
                .get_mut(id)
                .ok_or_else(|| Error::NotFound(format!("task {id}")))?;
            task.move_to(status, Utc::now());
            Ok(task.clone())
        })
        .await
    }

    pub async fn delete_task(&self, id: &EntityId) -> Result<Task> {
        self.commit(SyncedCollection::Tasks, |state| {
            state
                .tasks
                .remove(id)
                .ok_or_else(|| Error::NotFound(format!("task {id}")))
        })
        .await
    }

    pub async fn add_journal_entry(&self, title: &str, content: &str) -> Result<JournalEntry> {
        let entry = JournalEntry::new(title, content)?;
        self.commit(SyncedCollection::Journal, |state| {
            state.journal.insert(entry.clone())?;
            Ok(entry)
        })
        .await
    }

    pub async fn update_journal_entry(
        &self,
        id: &EntityId,
        title: &str,
        content: &str,
    ) -> Result<JournalEntry> {
        self.commit(SyncedCollection::Journal, |state| {
            let entry = state
                .journal
                .get_mut(id)
                .ok_or_else(|| Error::NotFound(format!("journal entry {id}")))?;
            let mut updated = entry.clone();
            updated.update(title, content)?;
            *entry = updated.clone();
            Ok(updated)
        })
        .await
    }

    pub async fn delete_journal_entry(&self, id: &EntityId) -> Result<JournalEntry> {
        self.commit(SyncedCollection::Journal, |state| {
            state
                .journal
                .remove(id)
                .ok_or_else(|| Error::NotFound(format!("journal entry {id}")))
        })
        .await
    }

    pub async fn add_movie(&self, movie: Movie) -> Result<Movie> {
        if movie.title.trim().is_empty() {
            return Err(Error::InvalidInput("movie title must not be empty".to_string()));
        }
        self.commit(SyncedCollection::Movies, |state| {
            state.movies.insert(movie.clone())?;
            Ok(movie)
        })
        .await
    }

    pub async fn set_movie_status(&self, id: &EntityId, status: WatchStatus) -> Result<Movie> {
        self.commit(SyncedCollection::Movies, |state| {
            let movie = state
                .movies
                .get_mut(id)
                .ok_or_else(|| Error::NotFound(format!("movie {id}")))?;
            movie.status = status;
            Ok(movie.clone())
        })
        .await
    }

    pub async fn delete_movie(&self, id: &EntityId) -> Result<Movie> {
        self.commit(SyncedCollection::Movies, |state| {
            state
                .movies
                .remove(id)
                .ok_or_else(|| Error::NotFound(format!("movie {id}")))
        })
        .await
    }

    pub async fn set_username(&self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("name must not be empty".to_string()));
        }
        self.commit(SyncedCollection::User, |state| {
            state.username = Some(name.to_string());
            Ok(())
        })
        .await
    }

    /// Local only; never pushed.
    pub async fn set_theme(&self, theme: Theme) -> Result<()> {
        self.commit_local(StorageKey::Theme, |state| state.theme = theme)
            .await
    }

    /// Local only; never pushed.
    pub async fn set_route(&self, route: Route) -> Result<()> {
        self.commit_local(StorageKey::Route, |state| state.route = route)
            .await
    }

    /// Fire pending pushes now, wait for in-flight ones, then flush state.
    pub async fn shutdown(&self) -> Result<()> {
        for collection in self.inner.scheduler.cancel_pending() {
            self.inner.push_collection(collection).await;
        }
        for handle in self.inner.scheduler.take_in_flight() {
            if let Err(error) = handle.await {
                tracing::warn!(%error, "Push task did not complete");
            }
        }

        let state = self.inner.state.lock().await;
        state.flush(&self.inner.store).await
    }

    /// Drop pending pushes and flush state without contacting the remote.
    pub async fn shutdown_offline(&self) -> Result<Vec<SyncedCollection>> {
        let dropped = self.inner.scheduler.cancel_pending();
        if !dropped.is_empty() {
            tracing::info!(collections = dropped.len(), "Skipped pushes while offline");
        }
        let state = self.inner.state.lock().await;
        state.flush(&self.inner.store).await?;
        Ok(dropped)
    }

    /// Apply a mutation, persist the collection, then schedule its push.
    ///
    /// A failed mutation or failed local write leaves the state untouched.
    async fn commit<T>(
        &self,
        collection: SyncedCollection,
        apply: impl FnOnce(&mut HubState) -> Result<T>,
    ) -> Result<T> {
        let (value, connected) = {
            let mut state = self.inner.state.lock().await;
            let previous = state.clone();
            let value = apply(&mut state)?;
            if let Err(error) = state.persist(&self.inner.store, collection.storage_key()).await {
                *state = previous;
                return Err(error);
            }
            (value, state.connection.is_some())
        };

        if connected {
            self.schedule_push(collection);
        }
        Ok(value)
    }

    async fn commit_local(&self, key: StorageKey, apply: impl FnOnce(&mut HubState)) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        let previous = state.clone();
        apply(&mut state);
        if let Err(error) = state.persist(&self.inner.store, key).await {
            *state = previous;
            return Err(error);
        }
        Ok(())
    }

    fn schedule_push(&self, collection: SyncedCollection) {
        self.inner.report().set_state(collection, SyncState::Pending);
        let inner = Arc::clone(&self.inner);
        self.inner.scheduler.schedule(collection, move || async move {
            inner.push_collection(collection).await;
        });
    }
}

impl<S: LocalStore, R: RemoteEndpoint> Inner<S, R> {
    fn report(&self) -> std::sync::MutexGuard<'_, SyncReport> {
        self.report.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn pull(&self) -> PullOutcome {
        let Some(connection) = self.state.lock().await.connection.clone() else {
            return PullOutcome::NotConnected;
        };

        let result = self.remote.fetch_snapshot(&connection).await;

        let mut state = self.state.lock().await;
        if state.connection.as_ref() != Some(&connection) {
            tracing::debug!("Connection changed during pull; discarding snapshot");
            return PullOutcome::Discarded;
        }

        match result {
            Ok(snapshot) => {
                let previous = state.clone();
                let applied = state.apply_snapshot(snapshot);
                let keys: Vec<_> = applied.iter().map(|c| c.storage_key()).collect();
                if let Err(error) = persist_keys(&state, &self.store, &keys).await {
                    *state = previous;
                    tracing::warn!(%error, "Failed to store pulled snapshot");
                    return PullOutcome::Failed(error.to_string());
                }
                drop(state);

                let mut report = self.report();
                for collection in &applied {
                    report.set_state(*collection, SyncState::Synced);
                }
                tracing::info!(collections = applied.len(), "Applied remote snapshot");
                PullOutcome::Applied(applied)
            }
            Err(error) if error.is_auth_failure() => {
                drop(state);
                self.teardown(&connection, &error).await;
                PullOutcome::Disconnected
            }
            Err(error) => {
                tracing::warn!(%error, "Remote pull failed; keeping local data");
                self.report().last_error = Some(error.to_string());
                PullOutcome::Failed(error.to_string())
            }
        }
    }

    /// Push the current contents of `collection`.
    async fn push_collection(&self, collection: SyncedCollection) {
        let (connection, snapshot) = {
            let state = self.state.lock().await;
            let Some(connection) = state.connection.clone() else {
                self.report().set_state(collection, SyncState::Offline);
                return;
            };
            let snapshot = state.snapshot_of(collection);
            // Marked under the state lock so connect/disconnect cannot interleave.
            let marker = if snapshot.is_empty() {
                SyncState::Idle
            } else {
                SyncState::Syncing
            };
            self.report().set_state(collection, marker);
            (connection, snapshot)
        };
        if snapshot.is_empty() {
            return;
        }

        let result = self.remote.push_snapshot(&connection, &snapshot).await;

        {
            let state = self.state.lock().await;
            if state.connection.as_ref() != Some(&connection) {
                let settled = if state.connection.is_some() {
                    SyncState::Idle
                } else {
                    SyncState::Offline
                };
                let mut report = self.report();
                if report.state(collection) == SyncState::Syncing {
                    report.set_state(collection, settled);
                }
                tracing::debug!(collection = collection.label(), "Connection changed during push");
                return;
            }
        }

        match result {
            Ok(()) => {
                tracing::debug!(collection = collection.label(), "Pushed collection");
                self.report().set_state(collection, SyncState::Synced);
            }
            Err(error) if error.is_auth_failure() => self.teardown(&connection, &error).await,
            Err(error) => {
                tracing::warn!(collection = collection.label(), %error, "Push failed");
                let mut report = self.report();
                report.set_state(collection, SyncState::Error);
                report.last_error = Some(error.to_string());
            }
        }
    }

    /// Drop rejected credentials so no later push reuses them.
    async fn teardown(&self, rejected: &Connection, error: &RemoteError) {
        {
            let mut state = self.state.lock().await;
            if state.connection.as_ref() != Some(rejected) {
                return;
            }
            state.connection = None;
            if let Err(store_error) = state.persist(&self.store, StorageKey::Connection).await {
                tracing::warn!(%store_error, "Failed to remove rejected connection");
            }
        }
        self.scheduler.cancel_pending();

        tracing::warn!(%error, "Remote rejected credentials; reconnect from the profile screen");
        let mut report = self.report();
        report.set_all(SyncState::Offline);
        report.needs_reconnect = true;
        report.last_error = Some(error.to_string());
    }
}

async fn persist_keys<S: LocalStore>(state: &HubState, store: &S, keys: &[StorageKey]) -> Result<()> {
    for key in keys {
        state.persist(store, *key).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StoreTarget;
    use crate::remote::{Snapshot, UserProfile};
    use crate::store::MemoryStore;
    use crate::test_support::FakeRemote;
    use pretty_assertions::assert_eq;

    const QUIET: Duration = Duration::from_secs(2);

    fn connection(key: &str) -> Connection {
        let target = StoreTarget::new("https://hub.example.com", "sheet-1").unwrap();
        Connection::new(target, key).unwrap()
    }

    async fn connected(remote: &FakeRemote) -> (SyncCoordinator<MemoryStore, FakeRemote>, MemoryStore) {
        let key = remote.initialize("Alex");
        let store = MemoryStore::new();
        store.insert(
            StorageKey::Connection,
            serde_json::to_string(&connection(&key)).unwrap(),
        );
        let coordinator = SyncCoordinator::open(store.clone(), remote.clone(), QUIET)
            .await
            .unwrap();
        (coordinator, store)
    }

    fn stored_tasks(store: &MemoryStore) -> Vec<Task> {
        serde_json::from_str(&store.get(StorageKey::Tasks).unwrap()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn offline_mutations_only_write_locally() {
        let remote = FakeRemote::new();
        let store = MemoryStore::new();
        let coordinator = SyncCoordinator::open(store.clone(), remote.clone(), QUIET)
            .await
            .unwrap();

        let task = coordinator.add_task("Offline", "", Priority::High).await.unwrap();
        assert_eq!(stored_tasks(&store), coordinator.tasks().await);

        coordinator.move_task(&task.id, TaskStatus::Archive).await.unwrap();
        assert_eq!(stored_tasks(&store), coordinator.tasks().await);

        tokio::time::sleep(QUIET * 2).await;
        assert!(remote.pushes().is_empty());
        assert_eq!(coordinator.startup().await, PullOutcome::NotConnected);
        assert_eq!(coordinator.report().tasks, SyncState::Offline);
    }

    #[tokio::test(start_paused = true)]
    async fn mutations_within_quiet_period_push_once() {
        let remote = FakeRemote::new();
        let (coordinator, _store) = connected(&remote).await;

        for title in ["one", "two", "three"] {
            coordinator.add_task(title, "", Priority::Medium).await.unwrap();
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        assert!(remote.pushes().is_empty());
        assert_eq!(coordinator.report().tasks, SyncState::Pending);

        tokio::time::sleep(QUIET * 2).await;
        let pushes = remote.pushes();
        assert_eq!(pushes.len(), 1);
        let pushed = pushes[0].tasks.as_ref().unwrap();
        assert_eq!(pushed.len(), 3);
        assert_eq!(pushed[0].title, "three");
        assert!(pushes[0].journal.is_none());
        assert_eq!(coordinator.report().tasks, SyncState::Synced);
    }

    #[tokio::test(start_paused = true)]
    async fn startup_applies_only_present_fields() {
        let remote = FakeRemote::new();
        let (coordinator, store) = connected(&remote).await;
        coordinator.add_journal_entry("Local", "keep").await.unwrap();
        remote.set_snapshot(Snapshot {
            tasks: Some(vec![Task::new("Remote task", "", Priority::Low).unwrap()]),
            movies: Some(Vec::new()),
            user: Some(UserProfile {
                name: "Sam".to_string(),
            }),
            ..Snapshot::default()
        });

        let outcome = coordinator.startup().await;
        assert_eq!(
            outcome,
            PullOutcome::Applied(vec![
                SyncedCollection::Tasks,
                SyncedCollection::Movies,
                SyncedCollection::User
            ])
        );

        let state = coordinator.state().await;
        assert_eq!(state.tasks.len(), 1);
        assert_eq!(state.journal.len(), 1);
        assert_eq!(state.username.as_deref(), Some("Sam"));
        assert_eq!(stored_tasks(&store)[0].title, "Remote task");
        assert_eq!(coordinator.startup().await, PullOutcome::AlreadyReconciled);
    }

    #[tokio::test(start_paused = true)]
    async fn pushed_collections_round_trip_through_pull() {
        let remote = FakeRemote::new();
        let (coordinator, _store) = connected(&remote).await;
        coordinator.add_task("Round trip", "", Priority::High).await.unwrap();
        coordinator.set_username("Robin").await.unwrap();
        coordinator.shutdown().await.unwrap();

        let expected = coordinator.state().await;
        let (fresh, _) = connected_with_key(&remote, &remote.key().unwrap()).await;
        assert!(matches!(fresh.startup().await, PullOutcome::Applied(_)));
        let pulled = fresh.state().await;
        assert_eq!(pulled.tasks, expected.tasks);
        assert_eq!(pulled.username.as_deref(), Some("Robin"));
    }

    async fn connected_with_key(
        remote: &FakeRemote,
        key: &str,
    ) -> (SyncCoordinator<MemoryStore, FakeRemote>, MemoryStore) {
        let store = MemoryStore::new();
        store.insert(
            StorageKey::Connection,
            serde_json::to_string(&connection(key)).unwrap(),
        );
        let coordinator = SyncCoordinator::open(store.clone(), remote.clone(), QUIET)
            .await
            .unwrap();
        (coordinator, store)
    }

    #[tokio::test(start_paused = true)]
    async fn unauthorized_pull_tears_down_connection() {
        let remote = FakeRemote::new();
        let (coordinator, store) = connected(&remote).await;
        remote.fail_next(RemoteError::from_envelope(None, "Unauthorized"));

        assert_eq!(coordinator.startup().await, PullOutcome::Disconnected);
        assert_eq!(coordinator.connection().await, None);
        assert_eq!(store.get(StorageKey::Connection), None);
        assert!(coordinator.report().needs_reconnect);

        coordinator.add_task("After", "", Priority::Low).await.unwrap();
        tokio::time::sleep(QUIET * 2).await;
        assert!(remote.pushes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unauthorized_push_tears_down_connection() {
        let remote = FakeRemote::new();
        let (coordinator, store) = connected(&remote).await;
        coordinator.add_task("First", "", Priority::Low).await.unwrap();
        remote.fail_next(RemoteError::Unauthorized("Invalid Credentials".to_string()));

        tokio::time::sleep(QUIET * 2).await;
        assert_eq!(coordinator.connection().await, None);
        assert_eq!(store.get(StorageKey::Connection), None);
        let report = coordinator.report();
        assert!(report.needs_reconnect);
        assert_eq!(report.tasks, SyncState::Offline);

        coordinator.add_task("Second", "", Priority::Low).await.unwrap();
        tokio::time::sleep(QUIET * 2).await;
        assert!(remote.pushes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_keep_local_data() {
        let remote = FakeRemote::new();
        let (coordinator, _store) = connected(&remote).await;
        coordinator.add_task("Local", "", Priority::Low).await.unwrap();
        tokio::time::sleep(QUIET * 2).await;
        remote.set_snapshot(Snapshot {
            tasks: Some(Vec::new()),
            ..Snapshot::default()
        });

        remote.fail_next(RemoteError::Timeout);
        assert!(matches!(coordinator.pull().await, PullOutcome::Failed(_)));
        assert_eq!(coordinator.tasks().await.len(), 1);
        assert!(coordinator.connection().await.is_some());

        remote.fail_next(RemoteError::Timeout);
        coordinator.add_task("Again", "", Priority::Low).await.unwrap();
        tokio::time::sleep(QUIET * 2).await;
        assert_eq!(coordinator.report().tasks, SyncState::Error);
        assert!(coordinator.connection().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn pull_is_discarded_when_connection_changes() {
        let remote = FakeRemote::new();
        let (coordinator, _store) = connected(&remote).await;
        remote.set_snapshot(Snapshot {
            tasks: Some(vec![Task::new("Remote", "", Priority::Low).unwrap()]),
            ..Snapshot::default()
        });
        remote.set_fetch_delay(Duration::from_secs(5));

        let background = coordinator.clone();
        let pull = tokio::spawn(async move { background.pull().await });
        tokio::task::yield_now().await;
        coordinator.disconnect().await.unwrap();

        assert_eq!(pull.await.unwrap(), PullOutcome::Discarded);
        assert!(coordinator.tasks().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_push_is_ignored_after_disconnect() {
        let remote = FakeRemote::new();
        let (coordinator, store) = connected(&remote).await;
        remote.set_push_delay(QUIET * 3);
        coordinator.add_task("Racing", "", Priority::Low).await.unwrap();

        tokio::time::sleep(QUIET + Duration::from_millis(10)).await;
        assert_eq!(coordinator.report().tasks, SyncState::Syncing);
        coordinator.disconnect().await.unwrap();
        remote.fail_next(RemoteError::Unauthorized("Invalid Credentials".to_string()));

        tokio::time::sleep(QUIET * 4).await;
        let report = coordinator.report();
        assert_eq!(report.tasks, SyncState::Offline);
        assert!(!report.needs_reconnect);
        assert_eq!(report.last_error, None);
        assert_eq!(store.get(StorageKey::Connection), None);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_push_rejection_keeps_new_connection() {
        let remote = FakeRemote::new();
        let (coordinator, store) = connected(&remote).await;
        remote.set_push_delay(QUIET * 3);
        coordinator.add_task("Racing", "", Priority::Low).await.unwrap();
        tokio::time::sleep(QUIET + Duration::from_millis(10)).await;

        // Re-key while the old push is outstanding; the old key is then rejected.
        let new_key = remote.initialize("Alex");
        let rekeyed = connection(&new_key);
        coordinator
            .connect(Authenticated {
                connection: rekeyed.clone(),
                user_name: None,
            })
            .await
            .unwrap();

        tokio::time::sleep(QUIET * 4).await;
        assert_eq!(coordinator.connection().await, Some(rekeyed));
        assert!(store.get(StorageKey::Connection).is_some());
        let report = coordinator.report();
        assert!(!report.needs_reconnect);
        assert_ne!(report.tasks, SyncState::Syncing);
        assert_ne!(report.tasks, SyncState::Offline);
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_cancels_pending_push_and_clears_name() {
        let remote = FakeRemote::new();
        let (coordinator, store) = connected(&remote).await;
        coordinator.set_username("Alex").await.unwrap();
        coordinator.add_task("Pending", "", Priority::Low).await.unwrap();

        coordinator.disconnect().await.unwrap();
        tokio::time::sleep(QUIET * 2).await;

        assert!(remote.pushes().is_empty());
        assert_eq!(store.get(StorageKey::Username), None);
        assert_eq!(coordinator.state().await.display_name(), "Traveler");
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_flushes_pending_pushes() {
        let remote = FakeRemote::new();
        let (coordinator, _store) = connected(&remote).await;
        coordinator.add_journal_entry("Tonight", "#ops done").await.unwrap();

        coordinator.shutdown().await.unwrap();
        let pushes = remote.pushes();
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].journal.as_ref().unwrap()[0].tags, vec!["OPS"]);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_mutations_change_nothing() {
        let remote = FakeRemote::new();
        let (coordinator, store) = connected(&remote).await;

        assert!(coordinator.add_task("  ", "", Priority::Low).await.is_err());
        assert!(coordinator
            .move_task(&"missing".parse().unwrap(), TaskStatus::Active)
            .await
            .is_err());
        assert!(coordinator.set_username(" ").await.is_err());

        tokio::time::sleep(QUIET * 2).await;
        assert_eq!(store.get(StorageKey::Tasks), None);
        assert!(remote.pushes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn theme_and_route_are_never_pushed() {
        let remote = FakeRemote::new();
        let (coordinator, store) = connected(&remote).await;
        coordinator
            .set_theme(Theme::new("#123456", "#ffffff").unwrap())
            .await
            .unwrap();
        coordinator.set_route(Route::Timer).await.unwrap();

        tokio::time::sleep(QUIET * 2).await;
        assert!(remote.pushes().is_empty());
        assert_eq!(store.get(StorageKey::Route).as_deref(), Some("\"TIMER\""));
    }

    #[tokio::test(start_paused = true)]
    async fn connect_persists_credentials_and_pulls() {
        let remote = FakeRemote::new();
        let key = remote.initialize("Alex");
        remote.set_snapshot(Snapshot {
            movies: Some(Vec::new()),
            ..Snapshot::default()
        });
        let store = MemoryStore::new();
        let coordinator = SyncCoordinator::open(store.clone(), remote.clone(), QUIET)
            .await
            .unwrap();

        let outcome = coordinator
            .connect(Authenticated {
                connection: connection(&key),
                user_name: Some("Alex".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(outcome, PullOutcome::Applied(vec![SyncedCollection::Movies]));
        assert!(store.get(StorageKey::Connection).is_some());
        assert_eq!(store.get(StorageKey::Username).as_deref(), Some("\"Alex\""));
        assert_eq!(coordinator.startup().await, PullOutcome::AlreadyReconciled);
    }

    #[tokio::test(start_paused = true)]
    async fn offline_shutdown_skips_remote() {
        let remote = FakeRemote::new();
        let (coordinator, store) = connected(&remote).await;
        coordinator.add_task("Later", "", Priority::Low).await.unwrap();

        let dropped = coordinator.shutdown_offline().await.unwrap();
        assert_eq!(dropped, vec![SyncedCollection::Tasks]);
        tokio::time::sleep(QUIET * 2).await;
        assert!(remote.pushes().is_empty());
        assert_eq!(stored_tasks(&store)[0].title, "Later");
    }
}
