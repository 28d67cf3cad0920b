//! Application state shared by every mini-app.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{
    Connection, EntityCollection, JournalEntry, Movie, Route, Task, Theme, DEFAULT_USERNAME,
};
use crate::remote::{Snapshot, UserProfile};
use crate::store::{LocalStore, StorageKey};
use crate::sync::SyncedCollection;
use crate::Result;

/// Everything the hub keeps locally.
///
/// Loaded once at startup with [`HubState::load`] and written back with
/// [`HubState::flush`] at shutdown; in between the coordinator persists the
/// touched key after every mutation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HubState {
    pub tasks: EntityCollection<Task>,
    pub journal: EntityCollection<JournalEntry>,
    pub movies: EntityCollection<Movie>,
    pub username: Option<String>,
    pub theme: Theme,
    pub route: Route,
    pub connection: Option<Connection>,
}

impl HubState {
    pub async fn load<S: LocalStore>(store: &S) -> Result<Self> {
        Ok(Self {
            tasks: decode_or_default(store, StorageKey::Tasks).await?,
            journal: decode_or_default(store, StorageKey::Journal).await?,
            movies: decode_or_default(store, StorageKey::Movies).await?,
            username: load_username(store).await?,
            theme: decode_or_default(store, StorageKey::Theme).await?,
            route: decode_or_default(store, StorageKey::Route).await?,
            connection: load_connection(store).await?,
        })
    }

    /// Write every key back to the store.
    pub async fn flush<S: LocalStore>(&self, store: &S) -> Result<()> {
        for key in StorageKey::ALL {
            self.persist(store, key).await?;
        }
        Ok(())
    }

    /// Write one key back to the store. Absent optional values are removed.
    pub async fn persist<S: LocalStore>(&self, store: &S, key: StorageKey) -> Result<()> {
        let encoded = match key {
            StorageKey::Tasks => Some(serde_json::to_string(&self.tasks)?),
            StorageKey::Journal => Some(serde_json::to_string(&self.journal)?),
            StorageKey::Movies => Some(serde_json::to_string(&self.movies)?),
            StorageKey::Theme => Some(serde_json::to_string(&self.theme)?),
            StorageKey::Route => Some(serde_json::to_string(&self.route)?),
            StorageKey::Username => encode_optional(self.username.as_ref())?,
            StorageKey::Connection => encode_optional(self.connection.as_ref())?,
        };

        match encoded {
            Some(value) => store.save(key, &value).await,
            None => store.remove(key).await,
        }
    }

    /// Name shown in greetings.
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(DEFAULT_USERNAME)
    }

    pub fn open_task_count(&self) -> usize {
        self.tasks.iter().filter(|task| task.is_open()).count()
    }

    /// Snapshot carrying only `collection`.
    pub fn snapshot_of(&self, collection: SyncedCollection) -> Snapshot {
        let mut snapshot = Snapshot::default();
        match collection {
            SyncedCollection::Tasks => snapshot.tasks = Some(self.tasks.to_vec()),
            SyncedCollection::Journal => snapshot.journal = Some(self.journal.to_vec()),
            SyncedCollection::Movies => snapshot.movies = Some(self.movies.to_vec()),
            SyncedCollection::User => {
                snapshot.user = self
                    .username
                    .clone()
                    .map(|name| UserProfile { name });
            }
        }
        snapshot
    }

    /// Overwrite every collection the snapshot specifies.
    ///
    /// Returns the collections that were replaced. A blank user name is
    /// ignored.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) -> Vec<SyncedCollection> {
        let mut applied = Vec::new();
        if let Some(tasks) = snapshot.tasks {
            self.tasks.replace_all(tasks);
            applied.push(SyncedCollection::Tasks);
        }
        if let Some(journal) = snapshot.journal {
            self.journal.replace_all(journal);
            applied.push(SyncedCollection::Journal);
        }
        if let Some(movies) = snapshot.movies {
            self.movies.replace_all(movies);
            applied.push(SyncedCollection::Movies);
        }
        if let Some(name) = snapshot.user.and_then(|user| normalize_name(&user.name)) {
            self.username = Some(name);
            applied.push(SyncedCollection::User);
        }
        applied
    }
}

fn normalize_name(name: &str) -> Option<String> {
    crate::util::normalize_text_option(Some(name.to_string()))
}

fn encode_optional<T: Serialize>(value: Option<&T>) -> Result<Option<String>> {
    value
        .map(serde_json::to_string)
        .transpose()
        .map_err(Into::into)
}

async fn decode_or_default<S, T>(store: &S, key: StorageKey) -> Result<T>
where
    S: LocalStore,
    T: DeserializeOwned + Default,
{
    let Some(raw) = store.load(key).await? else {
        return Ok(T::default());
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(error) => {
            tracing::warn!(key = key.as_str(), %error, "Ignoring unreadable stored value");
            Ok(T::default())
        }
    }
}

/// A stored connection that is unreadable or has a blank field is removed.
async fn load_connection<S: LocalStore>(store: &S) -> Result<Option<Connection>> {
    let Some(raw) = store.load(StorageKey::Connection).await? else {
        return Ok(None);
    };
    match serde_json::from_str::<Connection>(&raw) {
        Ok(connection) if connection.is_complete() => Ok(Some(connection)),
        Ok(_) => {
            tracing::warn!("Discarding incomplete stored connection");
            store.remove(StorageKey::Connection).await?;
            Ok(None)
        }
        Err(error) => {
            tracing::warn!(%error, "Discarding unreadable stored connection");
            store.remove(StorageKey::Connection).await?;
            Ok(None)
        }
    }
}

/// Usernames written by older clients are bare text rather than JSON.
async fn load_username<S: LocalStore>(store: &S) -> Result<Option<String>> {
    let Some(raw) = store.load(StorageKey::Username).await? else {
        return Ok(None);
    };
    let name = serde_json::from_str::<String>(&raw).unwrap_or(raw);
    Ok(normalize_name(&name))
}
