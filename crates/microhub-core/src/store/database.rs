//! libSQL-backed local store

use std::path::Path;

use libsql::{params, Builder, Connection, Database};
use tokio::sync::Mutex;

use super::{migrations, LocalStore, StorageKey};
use crate::error::Result;

struct Inner {
    // Keeps the database handle alive for the connection's lifetime.
    _db: Database,
    conn: Connection,
}

/// Local store persisted in a libSQL database file.
pub struct LibSqlStore {
    inner: Mutex<Inner>,
}

impl LibSqlStore {
    /// Open the store at the given path, creating it if it doesn't exist.
    ///
    /// Runs migrations automatically.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let path_str = path.to_string_lossy().to_string();
        let db = Builder::new_local(&path_str).build().await?;
        Self::from_database(db).await
    }

    /// Open an in-memory store (useful for testing)
    pub async fn open_in_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        Self::from_database(db).await
    }

    async fn from_database(db: Database) -> Result<Self> {
        let conn = db.connect()?;
        conn.execute("PRAGMA journal_mode = WAL;", ()).await.ok();
        migrations::run(&conn).await?;
        Ok(Self {
            inner: Mutex::new(Inner { _db: db, conn }),
        })
    }
}

impl LocalStore for LibSqlStore {
    async fn load(&self, key: StorageKey) -> Result<Option<String>> {
        let inner = self.inner.lock().await;
        let mut rows = inner
            .conn
            .query("SELECT value FROM kv_store WHERE key = ?", [key.as_str()])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(row.get::<String>(0)?))
        } else {
            Ok(None)
        }
    }

    async fn save(&self, key: StorageKey, value: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        let inner = self.inner.lock().await;
        inner
            .conn
            .execute(
                "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)",
                params![key.as_str(), value, now],
            )
            .await?;
        Ok(())
    }

    async fn remove(&self, key: StorageKey) -> Result<()> {
        let inner = self.inner.lock().await;
        inner
            .conn
            .execute("DELETE FROM kv_store WHERE key = ?", [key.as_str()])
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn save_load_and_remove() {
        let store = LibSqlStore::open_in_memory().await.unwrap();
        assert_eq!(store.load(StorageKey::Tasks).await.unwrap(), None);

        store.save(StorageKey::Tasks, "[]").await.unwrap();
        store.save(StorageKey::Tasks, r#"[{"id":"1"}]"#).await.unwrap();
        assert_eq!(
            store.load(StorageKey::Tasks).await.unwrap().as_deref(),
            Some(r#"[{"id":"1"}]"#)
        );

        store.remove(StorageKey::Tasks).await.unwrap();
        store.remove(StorageKey::Tasks).await.unwrap();
        assert_eq!(store.load(StorageKey::Tasks).await.unwrap(), None);
    }

    #[tokio::test]
    async fn values_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("microhub.db");

        {
            let store = LibSqlStore::open(&path).await.unwrap();
            store.save(StorageKey::Username, "\"Alex\"").await.unwrap();
        }

        let store = LibSqlStore::open(&path).await.unwrap();
        assert_eq!(
            store.load(StorageKey::Username).await.unwrap().as_deref(),
            Some("\"Alex\"")
        );
    }
}
