//! Parse-task prompt template.
//!
//! Turns a free-text description into title, priority, due date and tags.

use chrono::NaiveDate;
use serde::Serialize;

use super::{PromptTemplate, PARSE_TASK};

/// Context for the parse-task prompt.
#[derive(Debug, Clone, Serialize)]
pub struct ParseTaskContext {
    /// The user's free text
    pub prompt: String,
    /// Today's date (YYYY-MM-DD), for resolving relative dates
    pub today: String,
    /// Today's weekday name
    pub weekday: String,
}

impl ParseTaskContext {
    /// Build the context for `prompt` as seen on `today`.
    pub fn new(prompt: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            prompt: prompt.into(),
            today: today.format("%Y-%m-%d").to_string(),
            weekday: today.format("%A").to_string(),
        }
    }
}

/// Get the parse-task template.
pub fn template() -> PromptTemplate {
    PromptTemplate::new(PARSE_TASK, SYSTEM_PROMPT, USER_PROMPT)
        .with_description("Extract a to-do item from free text")
}

const SYSTEM_PROMPT: &str = r"You turn short free-text notes into to-do items for a personal task list. Only output valid JSON, with no markdown fences and no commentary.";

const USER_PROMPT: &str = r##"Today is {{weekday}}, {{today}}.

Extract a to-do item from: """{{prompt}}""".
Return JSON with keys:
- title (short string, without the date, priority or tag phrases)
- priority (High/Medium/Low, or null if not stated)
- due (YYYY-MM-DD or null; resolve relative dates such as "tomorrow" or "Friday" against today)
- tags (array of short tags; "tag:x" and "#x" both mean tag x)
Only output valid JSON."##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_today_and_prompt() {
        let context = ParseTaskContext::new(
            "Buy milk tomorrow",
            NaiveDate::from_ymd_opt(2025, 3, 12).unwrap(),
        );
        let (_, user) = template().render(&context).unwrap();
        assert!(user.starts_with("Today is Wednesday, 2025-03-12."));
        assert!(user.contains(r#""""Buy milk tomorrow""""#));
    }

    #[test]
    fn test_user_prompt_keeps_hash_tag_hint() {
        assert!(USER_PROMPT.contains(r##""tag:x" and "#x" both mean tag x"##));
        assert!(USER_PROMPT.ends_with("Only output valid JSON."));
    }
}
