//! Runtime configuration for hub clients.
//!
//! Values come from the process environment (optionally seeded from a `.env`
//! file by the binary). Command-line flags override the data directory.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::sync::DEFAULT_DEBOUNCE_MS;
use crate::util::normalize_endpoint_url;

const DATABASE_FILE: &str = "microhub.db";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone, PartialEq, Eq)]
pub struct HubConfig {
    pub data_dir: PathBuf,
    pub sync_debounce: Duration,
    pub http_timeout: Duration,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_api_base_url: String,
    pub movie_db_url: Option<String>,
}

impl fmt::Debug for HubConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HubConfig")
            .field("data_dir", &self.data_dir)
            .field("sync_debounce", &self.sync_debounce)
            .field("http_timeout", &self.http_timeout)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("gemini_model", &self.gemini_model)
            .field("gemini_api_base_url", &self.gemini_api_base_url)
            .field("movie_db_url", &self.movie_db_url)
            .finish()
    }
}

impl HubConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data_dir = match optional_trimmed(&lookup, "MICROHUB_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };

        let debounce_ms = ranged(
            &lookup,
            "MICROHUB_SYNC_DEBOUNCE_MS",
            DEFAULT_DEBOUNCE_MS,
            250..=10_000,
        )?;
        let timeout_secs = ranged(
            &lookup,
            "MICROHUB_HTTP_TIMEOUT_SECS",
            DEFAULT_HTTP_TIMEOUT_SECS,
            1..=120,
        )?;

        let gemini_api_key = optional_trimmed(&lookup, "GEMINI_API_KEY");
        let gemini_model = value_or_default(&lookup, "GEMINI_MODEL", DEFAULT_GEMINI_MODEL);
        let gemini_api_base_url = http_url(
            "GEMINI_API_BASE_URL",
            &value_or_default(&lookup, "GEMINI_API_BASE_URL", DEFAULT_GEMINI_API_BASE_URL),
        )?;
        let movie_db_url = optional_trimmed(&lookup, "MOVIE_DB_URL")
            .map(|url| http_url("MOVIE_DB_URL", &url))
            .transpose()?;

        Ok(Self {
            data_dir,
            sync_debounce: Duration::from_millis(debounce_ms),
            http_timeout: Duration::from_secs(timeout_secs),
            gemini_api_key,
            gemini_model,
            gemini_api_base_url,
            movie_db_url,
        })
    }

    #[must_use]
    pub fn with_data_dir(mut self, data_dir: impl AsRef<Path>) -> Self {
        self.data_dir = data_dir.as_ref().to_path_buf();
        self
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

fn default_data_dir() -> Result<PathBuf, ConfigError> {
    dirs::data_dir()
        .map(|dir| dir.join("microhub"))
        .ok_or(ConfigError::MissingVar("MICROHUB_DATA_DIR"))
}

fn ranged(
    lookup: impl Fn(&str) -> Option<String>,
    name: &str,
    default: u64,
    range: std::ops::RangeInclusive<u64>,
) -> Result<u64, ConfigError> {
    let bounds = format!("[{}, {}]", range.start(), range.end());
    let value = match optional_trimmed(lookup, name) {
        Some(raw) => raw.parse::<u64>().map_err(|_| {
            ConfigError::Invalid(format!("{name} must be an integer in {bounds}"))
        })?,
        None => default,
    };
    if !range.contains(&value) {
        return Err(ConfigError::Invalid(format!("{name} must be in {bounds}")));
    }
    Ok(value)
}

fn http_url(name: &str, value: &str) -> Result<String, ConfigError> {
    normalize_endpoint_url(value).ok_or_else(|| {
        ConfigError::Invalid(format!("{name} must start with http:// or https://"))
    })
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
