//! Movie metadata lookup against a public JSON catalogue.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;

use super::{check_status, ServiceError, ServiceResult};
use crate::config::HubConfig;
use crate::models::MovieMetadata;
use crate::util::normalize_text_option;

pub const DEFAULT_MOVIE_DB_URL: &str =
    "https://raw.githubusercontent.com/theapache64/movie_db/master/data/movies.json";

pub trait MovieLookup: Send + Sync {
    /// Up to `limit` candidates, best match first.
    fn search_movies(
        &self,
        query: &str,
        limit: usize,
    ) -> impl Future<Output = ServiceResult<Vec<MovieMetadata>>> + Send;

    /// Best single match for `title`.
    fn lookup_movie(&self, title: &str) -> impl Future<Output = ServiceResult<MovieMetadata>> + Send {
        async move {
            self.search_movies(title, 1)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| ServiceError::NotFound(format!("movie matching '{}'", title.trim())))
        }
    }
}

#[derive(Debug, Clone)]
pub struct MovieDbClient {
    client: reqwest::Client,
    url: String,
}

impl MovieDbClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> ServiceResult<Self> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            url: url.into(),
        })
    }

    pub fn from_config(config: &HubConfig) -> ServiceResult<Self> {
        let url = config
            .movie_db_url
            .clone()
            .unwrap_or_else(|| DEFAULT_MOVIE_DB_URL.to_string());
        Self::new(url, config.http_timeout)
    }

    async fn fetch_catalogue(&self) -> ServiceResult<Vec<MovieMetadata>> {
        tracing::debug!(url = %self.url, "Downloading movie catalogue");
        let response = self.client.get(&self.url).send().await?;
        let body = check_status(response).await?.text().await?;
        parse_catalogue(&body)
    }
}

impl MovieLookup for MovieDbClient {
    async fn search_movies(&self, query: &str, limit: usize) -> ServiceResult<Vec<MovieMetadata>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ServiceError::InvalidInput("query must not be empty".to_string()));
        }
        let catalogue = self.fetch_catalogue().await?;
        Ok(rank_titles(query, catalogue, |movie| &movie.title)
            .into_iter()
            .take(limit)
            .collect())
    }
}

/// Case-insensitive title ranking: exact, then prefix, then substring
/// matches, each group ordered by shorter title. Non-matches are dropped.
pub fn rank_titles<T>(query: &str, items: Vec<T>, title: impl Fn(&T) -> &str) -> Vec<T> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut ranked: Vec<(u8, usize, T)> = items
        .into_iter()
        .filter_map(|item| {
            let haystack = title(&item).trim().to_lowercase();
            let tier = if haystack == needle {
                0
            } else if haystack.starts_with(&needle) {
                1
            } else if haystack.contains(&needle) {
                2
            } else {
                return None;
            };
            Some((tier, haystack.chars().count(), item))
        })
        .collect();
    // Stable sort keeps catalogue order among equal keys.
    ranked.sort_by_key(|(tier, length, _)| (*tier, *length));
    ranked.into_iter().map(|(_, _, item)| item).collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogueEntry {
    title: String,
    #[serde(default)]
    year: Option<serde_json::Value>,
    #[serde(default)]
    director: Option<String>,
    #[serde(default)]
    genre: Option<serde_json::Value>,
    #[serde(default)]
    plot: Option<String>,
    #[serde(default)]
    poster_url: Option<String>,
}

/// Entries that do not parse are skipped.
fn parse_catalogue(body: &str) -> ServiceResult<Vec<MovieMetadata>> {
    let raw: Vec<serde_json::Value> = serde_json::from_str(body)
        .map_err(|error| ServiceError::InvalidPayload(format!("movie catalogue: {error}")))?;

    let total = raw.len();
    let movies: Vec<MovieMetadata> = raw
        .into_iter()
        .filter_map(|value| serde_json::from_value::<CatalogueEntry>(value).ok())
        .filter(|entry| !entry.title.trim().is_empty())
        .map(CatalogueEntry::into_metadata)
        .collect();
    if movies.len() < total {
        tracing::debug!(skipped = total - movies.len(), "Skipped unreadable catalogue entries");
    }
    Ok(movies)
}

impl CatalogueEntry {
    fn into_metadata(self) -> MovieMetadata {
        let year = match self.year {
            Some(serde_json::Value::Number(number)) => Some(number.to_string()),
            Some(serde_json::Value::String(text)) => normalize_text_option(Some(text)),
            _ => None,
        };
        let genre = match self.genre {
            Some(serde_json::Value::Array(values)) => values
                .into_iter()
                .filter_map(|value| value.as_str().map(str::trim).map(str::to_string))
                .filter(|value| !value.is_empty())
                .collect(),
            Some(serde_json::Value::String(text)) => text
                .split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };

        MovieMetadata {
            title: self.title.trim().to_string(),
            year,
            director: normalize_text_option(self.director),
            genre,
            plot: normalize_text_option(self.plot),
            poster_url: normalize_text_option(self.poster_url),
            score: None,
            episode_count: None,
        }
    }
}
