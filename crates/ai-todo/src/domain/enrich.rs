//! AI enrichment adapter.
//!
//! This module turns free text into structured task data:
//! - Parse a description into title, due date, priority and tags
//! - Break a task into subtasks
//! - Suggest priorities for a task list
//!
//! Each operation makes at most one provider call. Callers that need a task
//! no matter what use [`EnrichmentAdapter::parse_or_fallback`].

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::ai::{
    prompts::{
        BreakdownContext, ParseTaskContext, PrioritizeContext, BREAKDOWN, PARSE_TASK, PRIORITIZE,
    },
    schemas::{parse_breakdown_response, parse_priorities_response, parse_task_response},
    AIMessage, AIProvider, GenerateOptions, PromptManager,
};
use crate::entities::{PrioritySuggestion, Task, TaskDraft};
use crate::errors::{EnrichError, EnrichResult};

/// Today's date in local time.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// What to ask the model for.
#[derive(Debug, Clone)]
pub enum EnrichRequest<'a> {
    /// Free text → task fields
    ParseFields { text: &'a str, today: NaiveDate },
    /// Task title → subtask titles
    Breakdown { title: &'a str },
    /// Task list → new priorities
    Prioritize { tasks: &'a [Task] },
}

/// Structured result of an [`EnrichRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enrichment {
    Fields(TaskDraft),
    Subtasks(Vec<String>),
    Priorities(Vec<PrioritySuggestion>),
}

/// Adapter between the task store and an optional AI provider.
pub struct EnrichmentAdapter {
    provider: Option<Arc<dyn AIProvider>>,
    model: String,
    prompts: PromptManager,
}

impl EnrichmentAdapter {
    /// Create an adapter for `provider`, using its default model unless
    /// `model` is given.
    pub fn new(provider: Arc<dyn AIProvider>, model: Option<String>) -> Self {
        let model = model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| provider.default_model().to_string());
        Self {
            provider: Some(provider),
            model,
            prompts: PromptManager::default(),
        }
    }

    /// An adapter that never calls out.
    pub fn disabled() -> Self {
        Self {
            provider: None,
            model: String::new(),
            prompts: PromptManager::default(),
        }
    }

    /// True when a provider with an API key is configured.
    pub fn is_available(&self) -> bool {
        self.provider.as_ref().is_some_and(|p| p.is_configured())
    }

    /// Name of the configured provider, if any.
    pub fn provider_name(&self) -> Option<&'static str> {
        self.provider.as_ref().map(|p| p.name())
    }

    /// Environment variable the provider reads its key from.
    pub fn key_env_var(&self) -> Option<&'static str> {
        self.provider.as_ref().map(|p| p.api_key_env_var())
    }

    /// Model requests are sent to.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Run one enrichment request.
    pub async fn enrich(&self, request: EnrichRequest<'_>) -> EnrichResult<Enrichment> {
        match request {
            EnrichRequest::ParseFields { text, today } => {
                self.parse_task(text, today).await.map(Enrichment::Fields)
            }
            EnrichRequest::Breakdown { title } => {
                self.breakdown(title).await.map(Enrichment::Subtasks)
            }
            EnrichRequest::Prioritize { tasks } => {
                self.prioritize(tasks).await.map(Enrichment::Priorities)
            }
        }
    }

    /// Parse free text into a draft.
    pub async fn parse_task(&self, text: &str, today: NaiveDate) -> EnrichResult<TaskDraft> {
        let context = ParseTaskContext::new(text, today);
        let options = GenerateOptions {
            temperature: Some(0.2),
            max_tokens: Some(512),
            json_mode: true,
        };
        let answer = self.complete(PARSE_TASK, &context, &options).await?;
        parse_task_response(&answer, text, today)
    }

    /// Break a task into at most six subtask titles.
    pub async fn breakdown(&self, title: &str) -> EnrichResult<Vec<String>> {
        let context = BreakdownContext {
            title: title.to_string(),
        };
        let options = GenerateOptions {
            temperature: Some(0.4),
            max_tokens: Some(512),
            json_mode: false,
        };
        let answer = self.complete(BREAKDOWN, &context, &options).await?;
        parse_breakdown_response(&answer)
    }

    /// Suggest priorities for `tasks`.
    pub async fn prioritize(&self, tasks: &[Task]) -> EnrichResult<Vec<PrioritySuggestion>> {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }
        let context = PrioritizeContext::from_tasks(tasks);
        // OpenAI's JSON mode only permits objects, and this answer is an array.
        let options = GenerateOptions {
            temperature: Some(0.2),
            max_tokens: Some(2048),
            json_mode: false,
        };
        let answer = self.complete(PRIORITIZE, &context, &options).await?;
        parse_priorities_response(&answer)
    }

    /// Parse free text, or fall back to a draft titled with `text` verbatim.
    ///
    /// The error is returned alongside the draft so callers can tell the
    /// user enrichment was skipped.
    pub async fn parse_or_fallback(
        &self,
        text: &str,
        today: NaiveDate,
    ) -> (TaskDraft, Option<EnrichError>) {
        match self.parse_task(text, today).await {
            Ok(draft) => (draft, None),
            Err(err) => {
                warn!(error = %err, "AI enrichment failed, using raw text as title");
                (TaskDraft::from_text(text), Some(err))
            }
        }
    }

    /// Render a prompt, call the provider once and return its text.
    async fn complete<T: serde::Serialize>(
        &self,
        template_id: &str,
        context: &T,
        options: &GenerateOptions,
    ) -> EnrichResult<String> {
        let provider = match &self.provider {
            Some(provider) if provider.is_configured() => provider,
            Some(provider) => {
                return Err(EnrichError::unavailable(format!(
                    "{} is not set",
                    provider.api_key_env_var()
                )));
            }
            None => return Err(EnrichError::unavailable("no AI provider configured")),
        };

        let (system, user) = self.prompts.render(template_id, context)?;
        let messages = vec![AIMessage::system(system), AIMessage::user(user)];

        debug!(provider = provider.name(), model = %self.model, template = template_id, "Calling AI provider");
        let response = provider.generate_text(&self.model, &messages, options).await?;
        debug!(
            output_tokens = response.usage.output_tokens,
            "AI provider answered"
        );
        Ok(response.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AIResponse, TokenUsage};
    use crate::entities::TaskPriority;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider returning a canned answer and counting calls.
    struct ScriptedProvider {
        answer: EnrichResult<String>,
        configured: bool,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn answering(text: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: Ok(text.to_string()),
                configured: true,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(err: EnrichError) -> Arc<Self> {
            Arc::new(Self {
                answer: Err(err),
                configured: true,
                calls: AtomicUsize::new(0),
            })
        }

        fn without_key() -> Arc<Self> {
            Arc::new(Self {
                answer: Ok("{}".to_string()),
                configured: false,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AIProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn api_key_env_var(&self) -> &'static str {
            "SCRIPTED_API_KEY"
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        fn default_model(&self) -> &'static str {
            "scripted-1"
        }

        async fn generate_text(
            &self,
            model: &str,
            _messages: &[AIMessage],
            _options: &GenerateOptions,
        ) -> EnrichResult<AIResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let text = self.answer.clone()?;
            Ok(AIResponse {
                text,
                usage: TokenUsage::default(),
                model: model.to_string(),
                provider: "scripted".to_string(),
            })
        }
    }

    fn wednesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 12).unwrap()
    }

    #[tokio::test]
    async fn test_parse_well_formed_answer() {
        let provider = ScriptedProvider::answering(
            r#"{"title": "Buy milk", "priority": "High", "due": "tomorrow", "tags": ["errand"]}"#,
        );
        let adapter = EnrichmentAdapter::new(provider.clone(), None);

        let (draft, err) = adapter
            .parse_or_fallback("Buy milk tomorrow high priority tag:errand", wednesday())
            .await;

        assert!(err.is_none());
        assert_eq!(draft.title, "Buy milk");
        assert_eq!(draft.due, NaiveDate::from_ymd_opt(2025, 3, 13));
        assert_eq!(draft.priority, Some(TaskPriority::High));
        assert!(draft.tags.contains("errand") && draft.tags.len() == 1);
        assert_eq!(provider.calls(), 1);
        assert_eq!(adapter.model(), "scripted-1");
    }

    #[tokio::test]
    async fn test_malformed_answer_falls_back_verbatim() {
        let provider = ScriptedProvider::answering("Sorry, I can't help with that.");
        let adapter = EnrichmentAdapter::new(provider, Some("custom".to_string()));
        let input = "  Call   the plumber!! ";

        let (draft, err) = adapter.parse_or_fallback(input, wednesday()).await;

        assert!(matches!(err, Some(EnrichError::Parse { .. })));
        assert_eq!(draft, TaskDraft::from_text(input));
        assert_eq!(adapter.model(), "custom");
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back() {
        let provider = ScriptedProvider::failing(EnrichError::unavailable("HTTP 503"));
        let adapter = EnrichmentAdapter::new(provider.clone(), None);

        let (draft, err) = adapter.parse_or_fallback("Pay rent", wednesday()).await;

        assert!(matches!(err, Some(EnrichError::Unavailable { .. })));
        assert_eq!(draft.title, "Pay rent");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_key_never_calls_provider() {
        let provider = ScriptedProvider::without_key();
        let adapter = EnrichmentAdapter::new(provider.clone(), None);
        assert!(!adapter.is_available());

        let (draft, err) = adapter.parse_or_fallback("Pay rent", wednesday()).await;
        assert_eq!(draft.title, "Pay rent");
        assert!(matches!(err, Some(EnrichError::Unavailable { .. })));
        assert!(adapter.breakdown("Pay rent").await.is_err());
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_disabled_adapter() {
        let adapter = EnrichmentAdapter::disabled();
        assert!(!adapter.is_available());
        assert_eq!(adapter.provider_name(), None);
        assert!(matches!(
            adapter.prioritize(&[Task::new("Taxes")]).await,
            Err(EnrichError::Unavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_enrich_dispatches_by_mode() {
        let provider = ScriptedProvider::answering("- Collect receipts\n- File forms\n- Pay");
        let adapter = EnrichmentAdapter::new(provider, None);

        let result = adapter
            .enrich(EnrichRequest::Breakdown { title: "Taxes" })
            .await
            .unwrap();
        assert_eq!(
            result,
            Enrichment::Subtasks(vec![
                "Collect receipts".to_string(),
                "File forms".to_string(),
                "Pay".to_string(),
            ])
        );
    }

    #[tokio::test]
    async fn test_prioritize_empty_list_skips_call() {
        let provider = ScriptedProvider::answering("[]");
        let adapter = EnrichmentAdapter::new(provider.clone(), None);
        assert!(adapter.prioritize(&[]).await.unwrap().is_empty());
        assert_eq!(provider.calls(), 0);
    }
}
