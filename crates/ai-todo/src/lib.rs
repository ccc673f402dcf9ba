#![warn(clippy::pedantic)]
// Allow common pedantic lints that don't affect correctness
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]

//! # AI To-Do
//!
//! A small personal task tracker with optional natural-language enrichment.
//!
//! This crate provides:
//! - Tasks with due dates, priorities, tags and subtasks
//! - JSON file storage (`tasks.json`)
//! - AI enrichment through Gemini or OpenAI: free text to task fields,
//!   subtask breakdown and priority suggestions, with a plain-text fallback
//! - A web page with a JSON API, and a CLI
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ai_todo::{FileStorage, TaskDraft, TasksDomain};
//!
//! let domain = TasksDomain::new(Arc::new(FileStorage::new("tasks.json")));
//! let task = domain.add_task(TaskDraft::from_text("Buy milk")).await?;
//! domain.set_done(&task.id, true).await?;
//! ```

// Core entities
pub mod entities;

// Error types
pub mod errors;

// Storage layer
pub mod storage;

// Domain facades
pub mod domain;

// Runtime configuration
pub mod config;

// AI integration
pub mod ai;

// HTTP server
pub mod server;

// Terminal UI helpers
pub mod ui;

// Re-export key types for convenience
pub use config::{AiConfig, Config, ProviderKind, ServerConfig};
pub use domain::{EnrichRequest, Enrichment, EnrichmentAdapter, TasksDomain};
pub use entities::{
    PrioritySuggestion, Subtask, Task, TaskDraft, TaskFilter, TaskPriority, TaskStats, TaskUpdate,
};
pub use errors::{EnrichError, EnrichResult, TodoError, TodoResult};
pub use storage::{FileStorage, MemoryStorage, Storage};

// Re-export AI types
pub use ai::{
    AIMessage, AIProvider, AIResponse, AIRole, GeminiProvider, GenerateOptions, OpenAIProvider,
    PromptManager, PromptTemplate, TokenUsage,
};
