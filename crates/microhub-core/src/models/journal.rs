//! Journal entry model

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Entity, EntityId};
use crate::error::{Error, Result};

const UNTITLED: &str = "UNTITLED";
const DEFAULT_TAG: &str = "NOTE";

static HASHTAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([a-zA-Z][a-zA-Z0-9_-]*)").expect("valid hashtag regex"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Display date, e.g. `28 Feb`.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl JournalEntry {
    /// Create an entry dated today.
    pub fn new(title: &str, content: &str) -> Result<Self> {
        Self::new_on(title, content, Local::now().date_naive())
    }

    pub fn new_on(title: &str, content: &str, date: NaiveDate) -> Result<Self> {
        let (title, content) = normalize(title, content)?;
        let tags = tags_or_default(extract_hashtags(&content));
        Ok(Self {
            id: EntityId::new(),
            title,
            content,
            date: format_entry_date(date),
            tags,
        })
    }

    /// Replace title and content, keeping id and date.
    pub fn update(&mut self, title: &str, content: &str) -> Result<()> {
        let (title, content) = normalize(title, content)?;
        let hashtags = extract_hashtags(&content);
        if !hashtags.is_empty() {
            self.tags = hashtags;
        } else if self.tags.is_empty() {
            self.tags = tags_or_default(Vec::new());
        }
        self.title = title;
        self.content = content;
        Ok(())
    }
}

impl Entity for JournalEntry {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

fn normalize(title: &str, content: &str) -> Result<(String, String)> {
    let title = title.trim();
    let content = content.trim();
    if title.is_empty() && content.is_empty() {
        return Err(Error::InvalidInput(
            "journal entry needs a title or content".to_string(),
        ));
    }
    let title = if title.is_empty() { UNTITLED } else { title };
    Ok((title.to_string(), content.to_string()))
}

fn tags_or_default(tags: Vec<String>) -> Vec<String> {
    if tags.is_empty() {
        vec![DEFAULT_TAG.to_string()]
    } else {
        tags
    }
}

fn format_entry_date(date: NaiveDate) -> String {
    format!("{} {}", date.day(), date.format("%b"))
}

/// Extract `#hashtags` from text, uppercased and in first-appearance order.
///
/// # Examples
///
/// ```
/// use microhub_core::models::extract_hashtags;
///
/// let tags = extract_hashtags("Shipped #release, then #rust and #Release again");
/// assert_eq!(tags, vec!["RELEASE", "RUST"]);
/// ```
#[must_use]
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    HASHTAG
        .captures_iter(text)
        .map(|cap| cap[1].to_uppercase())
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn feb_28() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
    }

    #[test]
    fn blank_title_becomes_untitled() {
        let entry = JournalEntry::new_on("  ", "All systems nominal.", feb_28()).unwrap();
        assert_eq!(entry.title, "UNTITLED");
        assert_eq!(entry.date, "28 Feb");
        assert_eq!(entry.tags, vec!["NOTE"]);
    }

    #[test]
    fn empty_entry_is_rejected() {
        assert!(JournalEntry::new_on(" ", "\n", feb_28()).is_err());
    }

    #[test]
    fn hashtags_become_tags() {
        let entry = JournalEntry::new_on("Log", "Deployed #ops fix #OPS #db", feb_28()).unwrap();
        assert_eq!(entry.tags, vec!["OPS", "DB"]);
    }

    #[test]
    fn single_digit_day_has_no_padding() {
        let entry =
            JournalEntry::new_on("Log", "x", NaiveDate::from_ymd_opt(2025, 3, 4).unwrap()).unwrap();
        assert_eq!(entry.date, "4 Mar");
    }

    #[test]
    fn update_keeps_id_date_and_tags() {
        let mut entry = JournalEntry::new_on("Log", "first #ops", feb_28()).unwrap();
        let id = entry.id.clone();
        entry.update("Log 2", "second").unwrap();
        assert_eq!(entry.id, id);
        assert_eq!(entry.date, "28 Feb");
        assert_eq!(entry.tags, vec!["OPS"]);
        assert_eq!(entry.title, "Log 2");

        entry.update("Log 3", "third #later").unwrap();
        assert_eq!(entry.tags, vec!["LATER"]);
    }
}
