//! AI classifier integration for Support Triage.
//!
//! Supports:
//! - **Ollama**: local runtime via `/api/generate`
//! - **Cerebras**: hosted, OpenAI-compatible chat completions
//! - **OpenRouter**: hosted, OpenAI-compatible chat completions
//!
//! Every backend implements [`RemoteClassifier`]; the orchestrator never
//! knows which one it is talking to.

pub mod chat;
pub mod ollama;
pub mod prompt;
pub mod provider;

pub use chat::{ChatClassifier, ChatEndpoint};
pub use ollama::{OllamaClassifier, RuntimeStatus, check_ollama_status};
pub use provider::RemoteClassifier;

use std::sync::Arc;
use std::time::Duration;

use crate::error::LlmError;

/// Supported AI backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Ollama,
    Cerebras,
    OpenRouter,
}

impl std::fmt::Display for LlmBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ollama => write!(f, "ollama"),
            Self::Cerebras => write!(f, "cerebras"),
            Self::OpenRouter => write!(f, "openrouter"),
        }
    }
}

impl std::str::FromStr for LlmBackend {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "cerebras" => Ok(Self::Cerebras),
            "openrouter" => Ok(Self::OpenRouter),
            other => Err(format!("Unknown AI provider: {}", other)),
        }
    }
}

/// Configuration for creating a remote classifier.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    /// Required for hosted backends, ignored by Ollama.
    pub api_key: Option<secrecy::SecretString>,
    /// Override the backend's default model.
    pub model: Option<String>,
    /// Override the backend's default base URL.
    pub base_url: Option<String>,
    /// Transport-level request timeout.
    pub timeout: Duration,
}

impl LlmConfig {
    pub fn new(backend: LlmBackend) -> Self {
        Self {
            backend,
            api_key: None,
            model: None,
            base_url: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Create a remote classifier from configuration.
pub fn create_classifier(config: &LlmConfig) -> Result<Arc<dyn RemoteClassifier>, LlmError> {
    let client = reqwest::Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| LlmError::Unreachable {
            provider: config.backend.to_string(),
            reason: format!("Failed to build HTTP client: {e}"),
        })?;

    match config.backend {
        LlmBackend::Ollama => {
            let base_url = config
                .base_url
                .clone()
                .unwrap_or_else(|| ollama::DEFAULT_OLLAMA_BASE_URL.to_string());
            let model = config
                .model
                .clone()
                .unwrap_or_else(|| ollama::DEFAULT_OLLAMA_MODEL.to_string());
            tracing::info!("Using Ollama at {} (model: {})", base_url, model);
            Ok(Arc::new(OllamaClassifier::new(client, base_url, model)))
        }
        LlmBackend::Cerebras => create_chat_classifier(client, ChatEndpoint::cerebras(), config),
        LlmBackend::OpenRouter => {
            create_chat_classifier(client, ChatEndpoint::openrouter(), config)
        }
    }
}

fn create_chat_classifier(
    client: reqwest::Client,
    mut endpoint: ChatEndpoint,
    config: &LlmConfig,
) -> Result<Arc<dyn RemoteClassifier>, LlmError> {
    let api_key = config.api_key.clone().ok_or_else(|| LlmError::Unauthorized {
        provider: endpoint.provider.clone(),
    })?;

    if let Some(ref base_url) = config.base_url {
        endpoint = endpoint.with_base_url(base_url.clone());
    }
    if let Some(ref model) = config.model {
        endpoint = endpoint.with_model(model.clone());
    }

    tracing::info!("Using {} (model: {})", endpoint.provider, endpoint.model);
    Ok(Arc::new(ChatClassifier::new(client, endpoint, api_key)))
}
