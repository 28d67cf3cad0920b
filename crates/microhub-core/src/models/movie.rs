//! Movie watchlist model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::{Entity, EntityId};
use crate::error::Error;

const UNKNOWN: &str = "Unknown";
const NO_PLOT: &str = "No description available.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchStatus {
    #[default]
    Watchlist,
    Watched,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: EntityId,
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub year: String,
    #[serde(default)]
    pub director: String,
    #[serde(default)]
    pub genre: Vec<String>,
    #[serde(default)]
    pub plot: String,
    #[serde(default)]
    pub status: WatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_count: Option<u32>,
}

/// Metadata returned by a movie lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieMetadata {
    pub title: String,
    pub year: Option<String>,
    pub director: Option<String>,
    pub genre: Vec<String>,
    pub plot: Option<String>,
    pub poster_url: Option<String>,
    pub score: Option<f64>,
    pub episode_count: Option<u32>,
}

impl Movie {
    /// New watchlist entry from lookup metadata, filling gaps with placeholders.
    pub fn from_metadata(metadata: MovieMetadata) -> Self {
        let genre = if metadata.genre.is_empty() {
            vec![UNKNOWN.to_string()]
        } else {
            metadata.genre
        };

        Self {
            id: EntityId::new(),
            title: metadata.title,
            year: metadata.year.unwrap_or_else(|| UNKNOWN.to_string()),
            director: metadata.director.unwrap_or_else(|| UNKNOWN.to_string()),
            genre,
            plot: metadata.plot.unwrap_or_else(|| NO_PLOT.to_string()),
            status: WatchStatus::Watchlist,
            poster_url: metadata.poster_url,
            score: metadata.score,
            episode_count: metadata.episode_count,
        }
    }
}

impl Entity for Movie {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl WatchStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Watchlist => "watchlist",
            Self::Watched => "watched",
        }
    }
}

impl fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WatchStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "watchlist" => Ok(Self::Watchlist),
            "watched" => Ok(Self::Watched),
            other => Err(Error::InvalidInput(format!("unknown watch status: {other}"))),
        }
    }
}

/// Accepts a JSON string or number.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(value) => value,
        Raw::Number(value) => value.to_string(),
        Raw::Null(()) => String::new(),
    })
}
