//! Prioritize prompt template.
//!
//! Asks the model to reassign High/Medium/Low to every task.

use serde::Serialize;

use super::{PromptTemplate, PRIORITIZE};
use crate::entities::Task;

/// One task as shown to the model.
#[derive(Debug, Clone, Serialize)]
pub struct TaskLine {
    pub number: usize,
    pub title: String,
    pub due: String,
    pub priority: String,
    pub done: bool,
}

/// Context for the prioritize prompt.
#[derive(Debug, Clone, Serialize)]
pub struct PrioritizeContext {
    pub tasks: Vec<TaskLine>,
}

impl PrioritizeContext {
    /// Number the tasks from 1 in list order.
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let tasks = tasks
            .iter()
            .enumerate()
            .map(|(i, task)| TaskLine {
                number: i + 1,
                title: task.title.clone(),
                due: task
                    .due
                    .map_or_else(|| "none".to_string(), |d| d.format("%Y-%m-%d").to_string()),
                priority: task
                    .priority
                    .map_or_else(|| "none".to_string(), |p| p.label().to_string()),
                done: task.done,
            })
            .collect();
        Self { tasks }
    }
}

/// Get the prioritize template.
pub fn template() -> PromptTemplate {
    PromptTemplate::new(PRIORITIZE, SYSTEM_PROMPT, USER_PROMPT)
        .with_description("Reassign task priorities by urgency and impact")
}

const SYSTEM_PROMPT: &str = r"You triage personal to-do lists by urgency and impact. Only output valid JSON.";

const USER_PROMPT: &str = r"Reassign each task a priority of High/Medium/Low. Return JSON array with objects: {title, priority}. Copy each title exactly.
{{#each tasks}}
{{number}}. {{title}} (due: {{due}}, priority: {{priority}}, done: {{done}})
{{/each}}";
