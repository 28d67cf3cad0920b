//! Store records behind the remote endpoint.
//!
//! One record per store id: the hashed access key and the last snapshot the
//! owner pushed. Records live in memory and, when a data file is configured,
//! are rewritten to disk after every mutation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use microhub_core::remote::{RemoteResponse, ResponseStatus, Snapshot, UserProfile};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::keys::{hash_key, mint_key, verify_key};
use crate::rate_limit::store_fingerprint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreRecord {
    key_hash: String,
    #[serde(default)]
    data: Snapshot,
}

impl StoreRecord {
    fn initialized(user_name: &str, raw_key: &str) -> Self {
        Self {
            key_hash: hash_key(raw_key),
            data: Snapshot {
                user: Some(UserProfile {
                    name: user_name.to_string(),
                }),
                ..Snapshot::default()
            },
        }
    }

    fn user_name(&self) -> Option<String> {
        self.data.user.as_ref().map(|user| user.name.clone())
    }
}

pub struct StoreRegistry {
    records: Mutex<HashMap<String, StoreRecord>>,
    data_file: Option<PathBuf>,
}

impl StoreRegistry {
    pub fn in_memory() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            data_file: None,
        }
    }

    /// Load records from `data_file` if it exists; later mutations are written back to it.
    pub async fn open(data_file: Option<PathBuf>) -> Result<Self, AppError> {
        let Some(path) = data_file else {
            return Ok(Self::in_memory());
        };

        let records = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|error| {
                AppError::internal(format!("corrupt data file {}: {error}", path.display()))
            })?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(error) => {
                return Err(AppError::internal(format!(
                    "failed to read data file {}: {error}",
                    path.display()
                )))
            }
        };
        tracing::info!(path = %path.display(), stores = records.len(), "Loaded store records");

        Ok(Self {
            records: Mutex::new(records),
            data_file: Some(path),
        })
    }

    pub async fn store_count(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn check_status(&self, store_id: &str) -> RemoteResponse {
        let records = self.records.lock().await;
        match records.get(store_id) {
            Some(record) => RemoteResponse {
                user_name: record.user_name(),
                ..RemoteResponse::with_status(ResponseStatus::ReturningUser)
            },
            None => RemoteResponse::with_status(ResponseStatus::NewUser),
        }
    }

    pub async fn setup_new_user(
        &self,
        store_id: &str,
        user_name: &str,
    ) -> Result<RemoteResponse, AppError> {
        let user_name = required_name(user_name)?;
        let mut records = self.records.lock().await;
        if records.contains_key(store_id) {
            return Err(AppError::already_initialized(
                "store already has an owner; log in or wipe it",
            ));
        }

        let raw_key = mint_key();
        let mut next = records.clone();
        next.insert(
            store_id.to_string(),
            StoreRecord::initialized(user_name, &raw_key),
        );
        self.commit(&mut records, next).await?;
        tracing::info!(store = store_fingerprint(store_id), "Initialized store");

        Ok(RemoteResponse {
            raw_key: Some(raw_key),
            ..RemoteResponse::success()
        })
    }

    pub async fn login(&self, store_id: &str, auth_key: &str) -> Result<RemoteResponse, AppError> {
        let records = self.records.lock().await;
        authorize(&records, store_id, auth_key)?;
        Ok(RemoteResponse::success())
    }

    pub async fn fetch(&self, store_id: &str, auth_key: &str) -> Result<RemoteResponse, AppError> {
        let records = self.records.lock().await;
        let record = authorize(&records, store_id, auth_key)?;
        Ok(RemoteResponse {
            data: Some(record.data.clone()),
            ..RemoteResponse::success()
        })
    }

    /// Replace every collection present in `data`; absent ones are kept.
    pub async fn push(
        &self,
        store_id: &str,
        auth_key: &str,
        data: Snapshot,
    ) -> Result<RemoteResponse, AppError> {
        let mut records = self.records.lock().await;
        authorize(&records, store_id, auth_key)?;
        let mut next = records.clone();
        if let Some(record) = next.get_mut(store_id) {
            record.data.overwrite_with(data);
        }
        self.commit(&mut records, next).await?;
        tracing::debug!(store = store_fingerprint(store_id), "Stored pushed snapshot");
        Ok(RemoteResponse::success())
    }

    /// Erase a store. A non-blank `user_name` re-initializes it under a new key.
    pub async fn wipe_and_reset(
        &self,
        store_id: &str,
        user_name: Option<&str>,
    ) -> Result<RemoteResponse, AppError> {
        let user_name = user_name.map(str::trim).filter(|name| !name.is_empty());
        let mut records = self.records.lock().await;
        if !records.contains_key(store_id) {
            return Err(AppError::not_found("store has not been initialized"));
        }

        let mut next = records.clone();
        let response = if let Some(user_name) = user_name {
            let raw_key = mint_key();
            next.insert(
                store_id.to_string(),
                StoreRecord::initialized(user_name, &raw_key),
            );
            RemoteResponse {
                raw_key: Some(raw_key),
                ..RemoteResponse::success()
            }
        } else {
            next.remove(store_id);
            RemoteResponse::success()
        };
        self.commit(&mut records, next).await?;
        tracing::warn!(
            store = store_fingerprint(store_id),
            rekeyed = user_name.is_some(),
            "Wiped store"
        );
        Ok(response)
    }

    /// Write `next` to disk, then make it current. A failed write changes nothing.
    async fn commit(
        &self,
        current: &mut HashMap<String, StoreRecord>,
        next: HashMap<String, StoreRecord>,
    ) -> Result<(), AppError> {
        self.persist(&next).await?;
        *current = next;
        Ok(())
    }

    async fn persist(&self, records: &HashMap<String, StoreRecord>) -> Result<(), AppError> {
        let Some(path) = self.data_file.as_deref() else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(records)
            .map_err(|error| AppError::internal(format!("failed to encode records: {error}")))?;
        write_atomically(path, &bytes).await
    }
}

fn authorize<'a>(
    records: &'a HashMap<String, StoreRecord>,
    store_id: &str,
    auth_key: &str,
) -> Result<&'a StoreRecord, AppError> {
    match records.get(store_id) {
        Some(record) if verify_key(auth_key, &record.key_hash) => Ok(record),
        _ => {
            tracing::debug!(store = store_fingerprint(store_id), "Rejected credentials");
            Err(AppError::invalid_credentials())
        }
    }
}

fn required_name(user_name: &str) -> Result<&str, AppError> {
    let trimmed = user_name.trim();
    if trimmed.is_empty() {
        Err(AppError::bad_request("userName is required"))
    } else {
        Ok(trimmed)
    }
}

async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    let io_error =
        |error: std::io::Error| AppError::internal(format!("failed to write {}: {error}", path.display()));

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
    }
    let staging = path.with_extension("tmp");
    tokio::fs::write(&staging, bytes).await.map_err(io_error)?;
    tokio::fs::rename(&staging, path).await.map_err(io_error)
}
