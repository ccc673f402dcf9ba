//! Breakdown prompt template.

use serde::Serialize;

use super::{PromptTemplate, BREAKDOWN};

/// Context for the breakdown prompt.
#[derive(Debug, Clone, Serialize)]
pub struct BreakdownContext {
    /// Title of the task to split up
    pub title: String,
}

/// Get the breakdown template.
pub fn template() -> PromptTemplate {
    PromptTemplate::new(BREAKDOWN, SYSTEM_PROMPT, USER_PROMPT)
        .with_description("Break a task into 3-6 actionable subtasks")
}

const SYSTEM_PROMPT: &str = r"You help people plan personal and work tasks. Answer with a plain bullet list only.";

const USER_PROMPT: &str = r"Break the task into 3-6 concise subtasks (bullet list, one line each): {{{json title}}}";
