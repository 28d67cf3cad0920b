use microhub_core::models::{Entity, EntityCollection, EntityId, JournalEntry, Movie, Task};

use crate::error::CliError;

const SHORT_ID_LEN: usize = 13;

pub fn short_id(id: &EntityId) -> String {
    id.as_str().chars().take(SHORT_ID_LEN).collect()
}

/// Join words from the command line; `None` when nothing but whitespace.
pub fn join_words(parts: &[String]) -> Option<String> {
    let joined = parts.join(" ");
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn required_words(parts: &[String], field: &'static str) -> Result<String, CliError> {
    join_words(parts).ok_or(CliError::EmptyText(field))
}

pub fn normalize_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyId)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Resolve a full id or a unique id prefix.
pub fn resolve_id<T: Entity>(
    collection: &EntityCollection<T>,
    query: &str,
    kind: &'static str,
) -> Result<EntityId, CliError> {
    let query = normalize_identifier(query)?;
    if let Ok(id) = query.parse::<EntityId>() {
        if collection.contains(&id) {
            return Ok(id);
        }
    }

    let matches = collection.find_by_prefix(&query);
    match matches.as_slice() {
        [] => Err(CliError::NotFound(kind, query)),
        [only] => Ok(only.id().clone()),
        several => {
            let options = several
                .iter()
                .take(3)
                .map(|item| short_id(item.id()))
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let mut truncated = collapsed
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_task_line(task: &Task) -> String {
    let id = short_id(&task.id);
    let status = task.status.as_str();
    let priority = task.priority.as_str();
    let title = truncate(&task.title, 48);
    format!("{id:<13}  {status:<8}  {priority:<6}  {title}")
}

pub fn format_journal_line(entry: &JournalEntry) -> String {
    let id = short_id(&entry.id);
    let title = truncate(&entry.title, 32);
    let tags = entry
        .tags
        .iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<_>>()
        .join(" ");
    format!("{id:<13}  {:<6}  {title:<32}  {tags}", entry.date)
}

pub fn format_movie_line(movie: &Movie) -> String {
    let id = short_id(&movie.id);
    let title = truncate(&movie.title, 40);
    format!(
        "{id:<13}  {:<9}  {title:<40}  {}",
        movie.status.as_str(),
        movie.year
    )
}
