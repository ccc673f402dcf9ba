//! Error types for the to-do crate.

use thiserror::Error;

/// Failures of the AI enrichment adapter.
///
/// Both kinds are recoverable: callers fall back to using the raw input text
/// as a task title.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnrichError {
    /// No API key configured, or the provider could not be reached.
    #[error("AI enrichment unavailable: {reason}")]
    Unavailable { reason: String },

    /// The provider answered but the text was not in the expected shape.
    #[error("could not parse AI response: {reason}")]
    Parse { reason: String },
}

impl EnrichError {
    /// Build an [`EnrichError::Unavailable`].
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Build an [`EnrichError::Parse`].
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
        }
    }
}

/// Error types for task management
#[derive(Error, Debug, Clone)]
pub enum TodoError {
    // Task errors
    #[error("Task '{task_id}' not found")]
    TaskNotFound { task_id: String },

    #[error("ID prefix '{prefix}' matches more than one task")]
    AmbiguousId { prefix: String },

    #[error("Subtask {index} not found in task '{task_id}'")]
    SubtaskNotFound { task_id: String, index: usize },

    #[error("Task title cannot be empty")]
    EmptyTitle,

    #[error("Invalid priority: '{priority}'")]
    InvalidPriority { priority: String },

    #[error("Invalid date: '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { value: String },

    // Storage errors
    #[error("Storage error: {reason}")]
    StorageError { reason: String },

    #[error("Failed to write file '{path}': {reason}")]
    FileWriteError { path: String, reason: String },

    #[error("Failed to parse JSON: {reason}")]
    JsonParseError { reason: String },

    // Configuration errors
    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    // AI errors
    #[error(transparent)]
    Enrich(#[from] EnrichError),
}

impl From<std::io::Error> for TodoError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageError {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for TodoError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonParseError {
            reason: err.to_string(),
        }
    }
}

/// Result type alias for task operations
pub type TodoResult<T> = Result<T, TodoError>;

/// Result type alias for enrichment calls
pub type EnrichResult<T> = Result<T, EnrichError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TodoError::TaskNotFound {
            task_id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Task 'abc' not found");
    }

    #[test]
    fn test_enrich_error_is_transparent() {
        let err: TodoError = EnrichError::parse("no JSON object").into();
        assert_eq!(err.to_string(), "could not parse AI response: no JSON object");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: TodoError = io_err.into();
        assert!(matches!(err, TodoError::StorageError { .. }));
    }
}
