//! Task model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Entity, EntityId};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    Backlog,
    Active,
    Archive,
}

/// A task on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    /// Set when the task moves into `Archive`, cleared when it leaves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a backlog task. Blank titles are rejected.
    pub fn new(title: &str, description: &str, priority: Priority) -> Result<Self> {
        Self::new_at(title, description, priority, Utc::now())
    }

    pub fn new_at(
        title: &str,
        description: &str,
        priority: Priority,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::InvalidInput("task title must not be empty".to_string()));
        }

        Ok(Self {
            id: EntityId::new(),
            title: title.to_string(),
            description: description.trim().to_string(),
            priority,
            status: TaskStatus::Backlog,
            created_at: now,
            completed_at: None,
        })
    }

    /// Move the task to another column.
    pub fn move_to(&mut self, status: TaskStatus, now: DateTime<Utc>) {
        match (self.status, status) {
            (TaskStatus::Archive, TaskStatus::Archive) => {}
            (_, TaskStatus::Archive) => self.completed_at = Some(now),
            _ => self.completed_at = None,
        }
        self.status = status;
    }

    pub fn is_open(&self) -> bool {
        self.status != TaskStatus::Archive
    }
}

impl Entity for Task {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Priority {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl TaskStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "Backlog",
            Self::Active => "Active",
            Self::Archive => "Archive",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(Error::InvalidInput(format!("unknown priority: {other}"))),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "backlog" => Ok(Self::Backlog),
            "active" => Ok(Self::Active),
            "archive" | "archived" | "done" => Ok(Self::Archive),
            other => Err(Error::InvalidInput(format!("unknown task status: {other}"))),
        }
    }
}
