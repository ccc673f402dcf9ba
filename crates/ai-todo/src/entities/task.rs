//! Task entity and related types.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{normalize_tag, parse_tags, Subtask, TaskDraft};
use crate::errors::TodoError;

/// Task priority levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    #[serde(alias = "Low", alias = "LOW")]
    Low,
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "High", alias = "HIGH")]
    High,
}

impl TaskPriority {
    /// All priorities, highest first.
    pub const ALL: [Self; 3] = [Self::High, Self::Medium, Self::Low];

    /// Title-cased label for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for TaskPriority {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" | "med" | "normal" => Ok(Self::Medium),
            "high" | "urgent" => Ok(Self::High),
            _ => Err(TodoError::InvalidPriority {
                priority: s.to_string(),
            }),
        }
    }
}

/// Core task structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier (UUID v4)
    pub id: String,

    /// Short, descriptive title
    pub title: String,

    /// Whether the task is complete
    #[serde(default, alias = "completed")]
    pub done: bool,

    /// Creation timestamp
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,

    /// Due date
    #[serde(default)]
    pub due: Option<NaiveDate>,

    /// Priority, if one was chosen. Unknown values read as unset.
    #[serde(default, deserialize_with = "deserialize_priority")]
    pub priority: Option<TaskPriority>,

    /// Free-form labels. Older files may hold a comma-separated string.
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: BTreeSet<String>,

    /// Checklist items, addressed by position
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

impl Task {
    /// Create a new open task with only a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            done: false,
            created_at: Utc::now(),
            due: None,
            priority: None,
            tags: BTreeSet::new(),
            subtasks: Vec::new(),
        }
    }

    /// Build a task from a draft. The title is trimmed.
    pub fn from_draft(draft: TaskDraft) -> Self {
        let mut task = Self::new(draft.title.trim());
        task.due = draft.due;
        task.priority = draft.priority;
        task.tags = draft.tags;
        task
    }

    /// Check whether the task carries a tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Get mutable subtask by position
    pub fn get_subtask_mut(&mut self, index: usize) -> Option<&mut Subtask> {
        self.subtasks.get_mut(index)
    }

    /// Append a subtask
    pub fn add_subtask(&mut self, title: impl Into<String>) {
        self.subtasks.push(Subtask::new(title));
    }

    /// Remove a subtask by position
    pub fn remove_subtask(&mut self, index: usize) -> Option<Subtask> {
        (index < self.subtasks.len()).then(|| self.subtasks.remove(index))
    }

    /// Number of subtasks marked done
    pub fn completed_subtasks(&self) -> usize {
        self.subtasks.iter().filter(|s| s.done).count()
    }
}

/// Accept RFC 3339 timestamps as well as naive local ones (`2024-05-01T10:00:00.123456`).
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

fn deserialize_priority<'de, D>(deserializer: D) -> Result<Option<TaskPriority>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|value| value.parse().ok()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTags {
    List(Vec<String>),
    Joined(String),
}

fn deserialize_tags<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<RawTags>::deserialize(deserializer)? {
        Some(RawTags::List(tags)) => tags.iter().filter_map(|t| normalize_tag(t)).collect(),
        Some(RawTags::Joined(joined)) => parse_tags(&joined),
        None => BTreeSet::new(),
    })
}
