//! Local-only preferences: theme, navigation route, display name.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Display name used when no username is set.
pub const DEFAULT_USERNAME: &str = "Traveler";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub primary: String,
    pub secondary: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: "#bef264".to_string(),
            secondary: "#000000".to_string(),
        }
    }
}

impl Theme {
    pub fn new(primary: &str, secondary: &str) -> Result<Self> {
        Ok(Self {
            primary: parse_hex_color(primary)?,
            secondary: parse_hex_color(secondary)?,
        })
    }
}

fn parse_hex_color(value: &str) -> Result<String> {
    let value = value.trim();
    let digits = value.strip_prefix('#').unwrap_or_default();
    let valid = matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(value.to_ascii_lowercase())
    } else {
        Err(Error::InvalidInput(format!(
            "color must look like #rgb or #rrggbb: {value}"
        )))
    }
}

/// Screen the hub was last showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Route {
    #[default]
    Home,
    Tasks,
    Journal,
    Movies,
    Profile,
    Timer,
    Stopwatch,
    Chat,
    Images,
}

impl Route {
    pub const ALL: [Self; 9] = [
        Self::Home,
        Self::Tasks,
        Self::Journal,
        Self::Movies,
        Self::Profile,
        Self::Timer,
        Self::Stopwatch,
        Self::Chat,
        Self::Images,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Home => "HOME",
            Self::Tasks => "TASKS",
            Self::Journal => "JOURNAL",
            Self::Movies => "MOVIES",
            Self::Profile => "PROFILE",
            Self::Timer => "TIMER",
            Self::Stopwatch => "STOPWATCH",
            Self::Chat => "CHAT",
            Self::Images => "IMAGES",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Route {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|route| route.as_str() == wanted)
            .ok_or_else(|| Error::InvalidInput(format!("unknown route: {}", s.trim())))
    }
}
