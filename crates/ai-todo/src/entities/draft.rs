//! Inputs and views over tasks: drafts, partial updates, filters and counts.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use super::{Task, TaskPriority};

/// Fields a new task is created from.
///
/// Produced by manual entry and by AI enrichment alike.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,

    #[serde(default)]
    pub due: Option<NaiveDate>,

    #[serde(default)]
    pub priority: Option<TaskPriority>,

    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl TaskDraft {
    /// A draft holding only a title.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            title: text.into(),
            ..Self::default()
        }
    }
}

/// Partial update of a task. `None` leaves a field unchanged; for `due` and
/// `priority`, `Some(None)` (JSON `null`) clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TaskUpdate {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub due: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "double_option")]
    pub priority: Option<Option<TaskPriority>>,

    #[serde(default)]
    pub tags: Option<BTreeSet<String>>,
}

impl TaskUpdate {
    /// True when the update would not change anything.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.due.is_none() && self.priority.is_none() && self.tags.is_none()
    }
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A priority the model proposes for the task with this exact title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrioritySuggestion {
    pub title: String,
    pub priority: TaskPriority,
}

/// Selection applied when listing tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Hide completed tasks
    pub open_only: bool,
    /// Keep only these priorities (empty keeps all)
    pub priorities: Vec<TaskPriority>,
    /// Require this tag
    pub tag: Option<String>,
}

impl TaskFilter {
    /// Check whether a task passes the filter.
    pub fn matches(&self, task: &Task) -> bool {
        if self.open_only && task.done {
            return false;
        }
        if !self.priorities.is_empty()
            && !task.priority.is_some_and(|p| self.priorities.contains(&p))
        {
            return false;
        }
        match self.tag.as_deref().map(str::trim) {
            Some(tag) if !tag.is_empty() => task.has_tag(tag),
            _ => true,
        }
    }
}

/// Task counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    pub total: usize,
    pub open: usize,
    pub done: usize,
}

impl TaskStats {
    /// Count tasks by completion.
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let done = tasks.iter().filter(|t| t.done).count();
        Self {
            total: tasks.len(),
            open: tasks.len() - done,
            done,
        }
    }
}
