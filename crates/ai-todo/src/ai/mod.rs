//! AI integration for task enrichment.
//!
//! This module provides:
//! - AI provider abstraction (Gemini, OpenAI)
//! - Prompt template system with Handlebars
//! - Lenient decoding of model responses into task fields

pub mod prompts;
pub mod provider;
pub mod schemas;

// Provider implementations
pub mod gemini;
pub mod openai;

// Re-exports
pub use gemini::GeminiProvider;
pub use openai::OpenAIProvider;
pub use prompts::{PromptManager, PromptTemplate};
pub use provider::{
    extract_json_array, extract_json_object, AIMessage, AIProvider, AIResponse, AIRole,
    GenerateOptions, TokenUsage,
};
