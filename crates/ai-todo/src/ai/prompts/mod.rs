//! Prompt template system for AI operations.
//!
//! Templates are Handlebars strings rendered with HTML escaping disabled.

use handlebars::Handlebars;
use serde::Serialize;
use std::collections::HashMap;

use crate::errors::{EnrichError, EnrichResult};

mod breakdown;
mod parse_task;
mod prioritize;

pub use breakdown::BreakdownContext;
pub use parse_task::ParseTaskContext;
pub use prioritize::{PrioritizeContext, TaskLine};

/// Template id for free text → task fields
pub const PARSE_TASK: &str = "parse-task";
/// Template id for task → subtask list
pub const BREAKDOWN: &str = "breakdown";
/// Template id for task list → priorities
pub const PRIORITIZE: &str = "prioritize";

/// A prompt template with system and user messages.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub id: String,
    pub description: String,
    pub system: String,
    pub user: String,
}

impl PromptTemplate {
    /// Create a new prompt template.
    pub fn new(id: impl Into<String>, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            system: system.into(),
            user: user.into(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Render the template with the given context.
    ///
    /// Rendering failures are reported as [`EnrichError::Unavailable`]: no
    /// request can be made without a prompt.
    pub fn render<T: Serialize>(&self, context: &T) -> EnrichResult<(String, String)> {
        let handlebars = create_handlebars();

        let system = handlebars
            .render_template(&self.system, context)
            .map_err(|e| EnrichError::unavailable(format!("Failed to render system prompt: {e}")))?;

        let user = handlebars
            .render_template(&self.user, context)
            .map_err(|e| EnrichError::unavailable(format!("Failed to render user prompt: {e}")))?;

        Ok((system, user))
    }
}

/// Create a Handlebars instance with custom helpers.
fn create_handlebars() -> Handlebars<'static> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for prompts
    handlebars.register_escape_fn(handlebars::no_escape);

    // Helper: {{{json value}}}
    handlebars.register_helper(
        "json",
        Box::new(
            |h: &handlebars::Helper,
             _: &Handlebars,
             _: &handlebars::Context,
             _: &mut handlebars::RenderContext,
             out: &mut dyn handlebars::Output| {
                if let Some(param) = h.param(0) {
                    let json = serde_json::to_string(param.value())
                        .unwrap_or_else(|_| "null".to_string());
                    out.write(&json)?;
                }
                Ok(())
            },
        ),
    );

    handlebars
}

/// Prompt manager for loading and rendering templates.
pub struct PromptManager {
    templates: HashMap<String, PromptTemplate>,
}

impl PromptManager {
    /// Create a new prompt manager with default templates.
    pub fn new() -> Self {
        let mut manager = Self {
            templates: HashMap::new(),
        };

        manager.register(parse_task::template());
        manager.register(breakdown::template());
        manager.register(prioritize::template());

        manager
    }

    /// Register a template, replacing any with the same id.
    pub fn register(&mut self, template: PromptTemplate) {
        self.templates.insert(template.id.clone(), template);
    }

    /// Get a template by ID.
    pub fn get(&self, id: &str) -> Option<&PromptTemplate> {
        self.templates.get(id)
    }

    /// Render a template with context.
    pub fn render<T: Serialize>(&self, id: &str, context: &T) -> EnrichResult<(String, String)> {
        let template = self
            .get(id)
            .ok_or_else(|| EnrichError::unavailable(format!("Template '{id}' not found")))?;
        template.render(context)
    }
}

impl Default for PromptManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_template_rendering_does_not_escape() {
        let template = PromptTemplate::new("test", "You are a {{role}}", "Extract: \"{{prompt}}\"");
        let context = json!({"role": "planner", "prompt": "Call <Bob> & Alice"});

        let (system, user) = template.render(&context).unwrap();
        assert_eq!(system, "You are a planner");
        assert_eq!(user, "Extract: \"Call <Bob> & Alice\"");
    }

    #[test]
    fn test_json_helper() {
        let template = PromptTemplate::new("test", "System", "Title: {{{json title}}}");
        let (_, user) = template.render(&json!({"title": "Say \"hi\""})).unwrap();
        assert_eq!(user, r#"Title: "Say \"hi\"""#);
    }

    #[test]
    fn test_prompt_manager_defaults() {
        let manager = PromptManager::new();
        assert!(manager.get(PARSE_TASK).is_some());
        assert!(manager.get(BREAKDOWN).is_some());
        assert!(manager.get(PRIORITIZE).is_some());
        assert!(manager.render("missing", &json!({})).is_err());
    }
}
