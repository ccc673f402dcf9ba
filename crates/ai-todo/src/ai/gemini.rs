//! Google Gemini provider implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{EnrichError, EnrichResult};

use super::provider::{AIMessage, AIProvider, AIResponse, AIRole, GenerateOptions, TokenUsage};

/// Gemini API base (model path and method are appended)
const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Environment variable holding the API key
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

/// Gemini `generateContent` request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_field_names)]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

/// Gemini `generateContent` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: UsageMetadata,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    #[serde(default)]
    status: Option<String>,
    message: String,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

/// Google Gemini provider.
pub struct GeminiProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider with an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: Some(api_key.into()).filter(|k: &String| !k.trim().is_empty()),
            base_url: GEMINI_API_URL.to_string(),
        }
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Bound every request by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    /// Split out the system instruction and map the rest to Gemini roles.
    fn convert_messages(messages: &[AIMessage]) -> (Option<Content>, Vec<Content>) {
        let mut system = None;
        let mut contents = Vec::new();

        for msg in messages {
            match msg.role {
                AIRole::System => {
                    system = Some(Content {
                        role: None,
                        parts: vec![Part {
                            text: msg.content.clone(),
                        }],
                    });
                }
                AIRole::User | AIRole::Assistant => contents.push(Content {
                    role: Some(if msg.role == AIRole::User { "user" } else { "model" }),
                    parts: vec![Part {
                        text: msg.content.clone(),
                    }],
                }),
            }
        }

        (system, contents)
    }
}

#[async_trait]
impl AIProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn api_key_env_var(&self) -> &'static str {
        GEMINI_API_KEY_ENV
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn default_model(&self) -> &'static str {
        DEFAULT_MODEL
    }

    async fn generate_text(
        &self,
        model: &str,
        messages: &[AIMessage],
        options: &GenerateOptions,
    ) -> EnrichResult<AIResponse> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| EnrichError::unavailable(format!("{GEMINI_API_KEY_ENV} not set")))?;

        let (system_instruction, contents) = Self::convert_messages(messages);
        let request = GeminiRequest {
            contents,
            system_instruction,
            generation_config: GenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_tokens,
                response_mime_type: options.json_mode.then_some("application/json"),
            },
        };

        info!(model, "Calling Gemini API");

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| EnrichError::unavailable(format!("Gemini API request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EnrichError::unavailable(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            if let Ok(error_response) = serde_json::from_str::<GeminiErrorResponse>(&body) {
                return Err(EnrichError::unavailable(format!(
                    "Gemini API error ({}): {}",
                    error_response.error.status.as_deref().unwrap_or("UNKNOWN"),
                    error_response.error.message
                )));
            }
            return Err(EnrichError::unavailable(format!(
                "Gemini API error ({status}): {body}"
            )));
        }

        let parsed: GeminiResponse = serde_json::from_str(&body).map_err(|e| {
            EnrichError::unavailable(format!("Unexpected Gemini response body: {e}"))
        })?;

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| EnrichError::parse("Gemini returned no candidates"))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(EnrichError::parse(format!(
                "Gemini returned no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        let usage = parsed.usage_metadata;
        debug!(
            input_tokens = usage.prompt_token_count,
            output_tokens = usage.candidates_token_count,
            "Gemini response received"
        );

        Ok(AIResponse {
            text,
            usage: TokenUsage {
                input_tokens: usage.prompt_token_count,
                output_tokens: usage.candidates_token_count,
                total_tokens: usage.total_token_count,
            },
            model: parsed.model_version.unwrap_or_else(|| model.to_string()),
            provider: "gemini".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn messages() -> Vec<AIMessage> {
        vec![
            AIMessage::system("You extract tasks"),
            AIMessage::user("Buy milk"),
        ]
    }

    #[test]
    fn test_blank_key_is_unconfigured() {
        assert!(!GeminiProvider::new("  ").is_configured());
        assert!(GeminiProvider::new("k").is_configured());
    }

    #[test]
    fn test_message_conversion() {
        let (system, contents) = GeminiProvider::convert_messages(&messages());
        assert_eq!(system.unwrap().parts[0].text, "You extract tasks");
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].role, Some("user"));
    }

    #[tokio::test]
    async fn test_generate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "systemInstruction": {"parts": [{"text": "You extract tasks"}]},
                "generationConfig": {"responseMimeType": "application/json"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"parts": [{"text": "{\"title\": "}, {"text": "\"Buy milk\"}"}], "role": "model"},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 8, "totalTokenCount": 20},
                "modelVersion": "gemini-1.5-flash-002"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("test-key").with_base_url(server.uri());
        let options = GenerateOptions {
            json_mode: true,
            ..GenerateOptions::default()
        };
        let response = provider
            .generate_text(DEFAULT_MODEL, &messages(), &options)
            .await
            .unwrap();

        assert_eq!(response.text, "{\"title\": \"Buy milk\"}");
        assert_eq!(response.usage.total_tokens, 20);
        assert_eq!(response.model, "gemini-1.5-flash-002");
    }

    #[tokio::test]
    async fn test_api_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}
            })))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("bad-key").with_base_url(server.uri());
        let err = provider
            .generate_text(DEFAULT_MODEL, &messages(), &GenerateOptions::default())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            EnrichError::unavailable("Gemini API error (INVALID_ARGUMENT): API key not valid")
        );
    }

    #[tokio::test]
    async fn test_blocked_response_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"finishReason": "SAFETY"}]
            })))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("k").with_base_url(server.uri());
        let err = provider
            .generate_text(DEFAULT_MODEL, &messages(), &GenerateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EnrichError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_request() {
        let provider = GeminiProvider {
            client: Client::new(),
            api_key: None,
            base_url: "http://127.0.0.1:9".to_string(),
        };
        let err = provider
            .generate_text(DEFAULT_MODEL, &messages(), &GenerateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EnrichError::Unavailable { .. }));
    }
}
