//! Core data structures for task management.

mod draft;
mod fields;
mod subtask;
mod task;

pub use draft::{PrioritySuggestion, TaskDraft, TaskFilter, TaskStats, TaskUpdate};
pub use fields::{normalize_tag, normalize_tags, parse_due, parse_tags};
pub use subtask::Subtask;
pub use task::{Task, TaskPriority};
