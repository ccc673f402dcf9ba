//! Decoding of model responses into task fields.
//!
//! Models answer with free-form text. Every decoder here locates the
//! structured part, reads it leniently and reports [`EnrichError::Parse`]
//! only when nothing usable is left.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use super::provider::{extract_json_array, extract_json_object};
use crate::entities::{normalize_tag, parse_due, PrioritySuggestion, TaskDraft, TaskPriority};
use crate::errors::{EnrichError, EnrichResult};

/// Maximum number of subtasks kept from a breakdown.
pub const MAX_SUBTASKS: usize = 6;

/// Subtask lines longer than this are discarded.
pub const MAX_SUBTASK_CHARS: usize = 140;

/// Raw shape of a parse-task answer. Every field is optional.
#[derive(Debug, Default, Deserialize)]
struct RawTaskFields {
    #[serde(default)]
    title: Option<Value>,
    #[serde(default)]
    priority: Option<Value>,
    #[serde(default)]
    due: Option<Value>,
    #[serde(default)]
    tags: Option<Value>,
}

/// Decode a parse-task answer into a draft.
///
/// A missing or blank title becomes `input` verbatim. Unknown priorities and
/// unparseable due dates are dropped rather than failing the whole answer.
pub fn parse_task_response(text: &str, input: &str, today: NaiveDate) -> EnrichResult<TaskDraft> {
    let span = extract_json_object(text)?;
    let raw: RawTaskFields = serde_json::from_str(span)
        .map_err(|e| EnrichError::parse(format!("invalid task JSON: {e}")))?;

    let title = raw
        .title
        .as_ref()
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map_or_else(|| input.to_string(), str::to_string);

    let priority = raw
        .priority
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|p| p.parse::<TaskPriority>().ok());

    let due = raw
        .due
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|d| parse_due(d, today));

    let tags = match raw.tags {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(normalize_tag)
            .collect(),
        Some(Value::String(list)) => list.split(',').filter_map(normalize_tag).collect(),
        _ => Default::default(),
    };

    Ok(TaskDraft {
        title,
        due,
        priority,
        tags,
    })
}

fn bullet_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:(?:[-*•·]+|\d+[.)]|\[[\sxX]?\])\s*)+").expect("valid regex")
    })
}

/// Decode a breakdown answer into at most [`MAX_SUBTASKS`] subtask titles.
///
/// Accepts a plain bullet or numbered list, or a JSON array of strings.
/// Headings (lines ending in `:`) and over-long lines are skipped.
pub fn parse_breakdown_response(text: &str) -> EnrichResult<Vec<String>> {
    let from_json = extract_json_array(text)
        .ok()
        .and_then(|span| serde_json::from_str::<Vec<String>>(span).ok());

    let lines: Vec<String> = match from_json {
        Some(items) => items,
        None => text.lines().map(str::to_string).collect(),
    };

    let subtasks: Vec<String> = lines
        .iter()
        .map(|line| bullet_prefix().replace(line.trim(), "").trim().to_string())
        .map(|line| {
            line.replace("**", "")
                .trim_matches(|c| c == '`' || c == '*')
                .trim()
                .to_string()
        })
        .filter(|line| !line.is_empty() && !line.ends_with(':'))
        .filter(|line| line.chars().count() <= MAX_SUBTASK_CHARS)
        .take(MAX_SUBTASKS)
        .collect();

    if subtasks.is_empty() {
        return Err(EnrichError::parse("breakdown contained no usable lines"));
    }
    Ok(subtasks)
}

/// Decode a prioritize answer into suggestions.
///
/// Entries without a title or with an unknown priority are skipped.
pub fn parse_priorities_response(text: &str) -> EnrichResult<Vec<PrioritySuggestion>> {
    let span = extract_json_array(text)?;
    let entries: Vec<Value> = serde_json::from_str(span)
        .map_err(|e| EnrichError::parse(format!("invalid priorities JSON: {e}")))?;

    Ok(entries
        .iter()
        .filter_map(|entry| {
            let title = entry.get("title")?.as_str()?.trim();
            let priority = entry.get("priority")?.as_str()?.parse().ok()?;
            (!title.is_empty()).then(|| PrioritySuggestion {
                title: title.to_string(),
                priority,
            })
        })
        .collect())
}
