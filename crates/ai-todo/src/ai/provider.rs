//! AI Provider trait and common types.
//!
//! Defines the interface that all AI providers must implement.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::{EnrichError, EnrichResult};

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AIRole {
    /// System message (sets context/behavior)
    System,
    /// User message (input)
    User,
    /// Assistant message (AI response)
    Assistant,
}

/// A message in a conversation with an AI model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AIMessage {
    pub role: AIRole,
    pub content: String,
}

impl AIMessage {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: AIRole::System,
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: AIRole::User,
            content: content.into(),
        }
    }
}

/// Token usage information from an AI response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

/// Response from an AI model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AIResponse {
    /// Generated text content
    pub text: String,
    /// Token usage information
    pub usage: TokenUsage,
    /// Model that generated the response
    pub model: String,
    /// Provider that generated the response
    pub provider: String,
}

/// Options for text generation.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Temperature for sampling (0.0 to 1.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Whether to request JSON output
    pub json_mode: bool,
}

/// Trait for AI providers.
///
/// Implementations make exactly one HTTP request per call. Missing keys,
/// transport failures and non-success statuses surface as
/// [`EnrichError::Unavailable`].
#[async_trait]
pub trait AIProvider: Send + Sync {
    /// Get the provider name (e.g., "gemini", "openai").
    fn name(&self) -> &'static str;

    /// Get the environment variable name for the API key.
    fn api_key_env_var(&self) -> &'static str;

    /// Check if the provider is configured (has API key).
    fn is_configured(&self) -> bool;

    /// Model used when none is configured.
    fn default_model(&self) -> &'static str;

    /// Generate text from messages.
    async fn generate_text(
        &self,
        model: &str,
        messages: &[AIMessage],
        options: &GenerateOptions,
    ) -> EnrichResult<AIResponse>;
}

fn object_span() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"))
}

fn array_span() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\[.*\]").expect("valid regex"))
}

/// Find the outermost `{ ... }` span in a model response.
///
/// Models often wrap JSON in markdown fences or chatter; everything from the
/// first `{` to the last `}` is returned.
pub fn extract_json_object(text: &str) -> EnrichResult<&str> {
    object_span()
        .find(text)
        .map(|m| m.as_str())
        .ok_or_else(|| EnrichError::parse("response contains no JSON object"))
}

/// Find the outermost `[ ... ]` span in a model response.
pub fn extract_json_array(text: &str) -> EnrichResult<&str> {
    array_span()
        .find(text)
        .map(|m| m.as_str())
        .ok_or_else(|| EnrichError::parse("response contains no JSON array"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_fenced_object() {
        let text = "```json\n{\"title\": \"Buy milk\"}\n```";
        assert_eq!(extract_json_object(text).unwrap(), "{\"title\": \"Buy milk\"}");
    }

    #[test]
    fn test_object_spans_nested_braces() {
        let text = "Sure! {\"a\": {\"b\": 1}} hope that helps";
        assert_eq!(extract_json_object(text).unwrap(), "{\"a\": {\"b\": 1}}");
    }

    #[test]
    fn test_missing_spans_are_parse_errors() {
        assert!(matches!(
            extract_json_object("no braces here"),
            Err(EnrichError::Parse { .. })
        ));
        assert!(matches!(
            extract_json_array("{}"),
            Err(EnrichError::Parse { .. })
        ));
    }
}
