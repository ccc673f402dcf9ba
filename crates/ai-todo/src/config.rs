//! Runtime configuration.
//!
//! Defaults come from the environment; the CLI overrides individual fields.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::warn;

use crate::ai::{
    gemini::GEMINI_API_KEY_ENV, openai::OPENAI_API_KEY_ENV, AIProvider, GeminiProvider,
    OpenAIProvider,
};
use crate::domain::EnrichmentAdapter;
use crate::errors::TodoError;
use crate::storage::DEFAULT_DATA_FILE;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8501;

/// Default bind address
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default provider request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Supported AI backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    OpenAI,
}

impl ProviderKind {
    /// Environment variable holding this provider's key.
    pub fn api_key_env_var(self) -> &'static str {
        match self {
            Self::Gemini => GEMINI_API_KEY_ENV,
            Self::OpenAI => OPENAI_API_KEY_ENV,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gemini => write!(f, "gemini"),
            Self::OpenAI => write!(f, "openai"),
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            other => Err(TodoError::ConfigError {
                reason: format!("unknown AI provider '{other}' (expected gemini or openai)"),
            }),
        }
    }
}

/// AI enrichment settings.
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// Which backend to call
    pub provider: ProviderKind,
    /// API key; `None` disables enrichment
    pub api_key: Option<String>,
    /// Model override
    pub model: Option<String>,
    /// Endpoint override
    pub base_url: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl AiConfig {
    /// Settings for `provider`, reading its key from the environment.
    pub fn for_provider(provider: ProviderKind) -> Self {
        Self {
            provider,
            api_key: non_empty_var(provider.api_key_env_var()),
            model: non_empty_var("AI_TODO_MODEL"),
            base_url: non_empty_var("AI_TODO_API_BASE"),
            timeout: env::var("AI_TODO_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS), Duration::from_secs),
        }
    }

    /// Build the configured provider.
    ///
    /// A provider is returned even without a key so that status output can
    /// name the missing variable; it reports itself as not configured.
    pub fn build_provider(&self) -> Arc<dyn AIProvider> {
        let key = self.api_key.clone().unwrap_or_default();
        match self.provider {
            ProviderKind::Gemini => {
                let mut provider = GeminiProvider::new(key).with_timeout(self.timeout);
                if let Some(url) = &self.base_url {
                    provider = provider.with_base_url(url.as_str());
                }
                Arc::new(provider)
            }
            ProviderKind::OpenAI => {
                let mut provider = OpenAIProvider::new(key).with_timeout(self.timeout);
                if let Some(url) = &self.base_url {
                    provider = provider.with_base_url(url.as_str());
                }
                Arc::new(provider)
            }
        }
    }

    /// Build the enrichment adapter for these settings.
    pub fn build_adapter(&self) -> EnrichmentAdapter {
        EnrichmentAdapter::new(self.build_provider(), self.model.clone())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self::for_provider(provider_or_default(non_empty_var("AI_TODO_PROVIDER").as_deref()))
    }
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// `host:port` for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: env::var("AI_TODO_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: env::var("AI_TODO_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PORT),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Task store file
    pub data_file: PathBuf,
    pub ai: AiConfig,
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: env::var("AI_TODO_DATA_FILE")
                .map_or_else(|_| PathBuf::from(DEFAULT_DATA_FILE), PathBuf::from),
            ai: AiConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Parse a provider name, falling back to the default with a warning.
fn provider_or_default(raw: Option<&str>) -> ProviderKind {
    let Some(raw) = raw else {
        return ProviderKind::default();
    };
    raw.parse().unwrap_or_else(|e| {
        warn!(error = %e, fallback = %ProviderKind::default(), "Ignoring AI_TODO_PROVIDER");
        ProviderKind::default()
    })
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
