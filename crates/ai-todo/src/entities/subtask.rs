//! Subtask entity.

use serde::{Deserialize, Serialize};

/// Checklist item nested within a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    /// Short description of the step
    pub title: String,

    /// Whether the step is complete
    #[serde(default)]
    pub done: bool,
}

impl Subtask {
    /// Create a new open subtask
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            done: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtask_defaults_to_open() {
        let subtask: Subtask = serde_json::from_str(r#"{"title": "Outline"}"#).unwrap();
        assert_eq!(subtask, Subtask::new("Outline"));
    }
}
