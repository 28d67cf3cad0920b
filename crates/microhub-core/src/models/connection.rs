//! Remote store connection credentials.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};
use crate::util::normalize_endpoint_url;

/// Address of a remote store: the endpoint URL plus the store id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreTarget {
    endpoint_url: String,
    store_id: String,
}

impl StoreTarget {
    pub fn new(endpoint_url: &str, store_id: &str) -> Result<Self> {
        let endpoint_url = normalize_endpoint_url(endpoint_url).ok_or_else(|| {
            Error::InvalidInput("endpoint URL must start with http:// or https://".to_string())
        })?;
        let store_id = store_id.trim();
        if store_id.is_empty() {
            return Err(Error::InvalidInput("store id must not be empty".to_string()));
        }
        Ok(Self {
            endpoint_url,
            store_id: store_id.to_string(),
        })
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    pub fn store_id(&self) -> &str {
        &self.store_id
    }
}

/// Credentials for an authenticated remote store.
///
/// Either fully present or absent; [`Connection::is_complete`] guards
/// records read back from storage.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    #[serde(alias = "scriptUrl")]
    endpoint_url: String,
    #[serde(alias = "sheetId")]
    store_id: String,
    #[serde(alias = "authKey")]
    access_key: String,
    #[serde(deserialize_with = "timestamp_or_millis")]
    connected_at: DateTime<Utc>,
}

impl Connection {
    pub fn new(target: StoreTarget, access_key: &str) -> Result<Self> {
        let access_key = access_key.trim();
        if access_key.is_empty() {
            return Err(Error::InvalidInput("access key must not be empty".to_string()));
        }
        Ok(Self {
            endpoint_url: target.endpoint_url,
            store_id: target.store_id,
            access_key: access_key.to_string(),
            connected_at: Utc::now(),
        })
    }

    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub const fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    pub fn target(&self) -> StoreTarget {
        StoreTarget {
            endpoint_url: self.endpoint_url.clone(),
            store_id: self.store_id.clone(),
        }
    }

    /// True when every field is usable.
    pub fn is_complete(&self) -> bool {
        normalize_endpoint_url(&self.endpoint_url).is_some()
            && !self.store_id.trim().is_empty()
            && !self.access_key.trim().is_empty()
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Connection")
            .field("endpoint_url", &self.endpoint_url)
            .field("store_id", &self.store_id)
            .field("access_key", &"[REDACTED]")
            .field("connected_at", &self.connected_at)
            .finish()
    }
}

fn timestamp_or_millis<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<DateTime<Utc>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(i64),
        Text(DateTime<Utc>),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Text(value) => Ok(value),
        Raw::Millis(millis) => Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(|| serde::de::Error::custom("connectedAt out of range")),
    }
}
