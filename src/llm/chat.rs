//! OpenAI-compatible chat-completions adapter.
//!
//! Cerebras and OpenRouter expose the same `/chat/completions` contract and
//! differ only in base URL, default model, token budget and a few headers.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LlmError;
use crate::llm::prompt;
use crate::llm::provider::{RemoteClassifier, check_status, transport_error};
use crate::pipeline::parse::parse_classification;
use crate::pipeline::types::RawClassification;

const TEMPERATURE: f32 = 0.1;

/// Per-provider settings for a chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct ChatEndpoint {
    /// Provider name for logs and errors.
    pub provider: String,
    /// Base URL, without the `/chat/completions` suffix.
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    /// Ask for `response_format: {"type": "json_object"}`.
    pub json_mode: bool,
    /// Extra request headers (attribution etc.).
    pub extra_headers: Vec<(String, String)>,
}

impl ChatEndpoint {
    /// Cerebras inference cloud.
    pub fn cerebras() -> Self {
        Self {
            provider: "cerebras".to_string(),
            base_url: "https://api.cerebras.ai/v1".to_string(),
            model: "llama-3.3-70b".to_string(),
            max_tokens: 150,
            json_mode: false,
            extra_headers: Vec::new(),
        }
    }

    /// OpenRouter (free-tier model by default).
    pub fn openrouter() -> Self {
        Self {
            provider: "openrouter".to_string(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "amazon/nova-2-lite-v1:free".to_string(),
            max_tokens: 200,
            json_mode: true,
            extra_headers: vec![
                ("HTTP-Referer".to_string(), "http://localhost".to_string()),
                ("X-Title".to_string(), "Support Triage".to_string()),
            ],
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Classifier backed by an OpenAI-compatible chat endpoint.
pub struct ChatClassifier {
    client: reqwest::Client,
    endpoint: ChatEndpoint,
    api_key: SecretString,
}

impl ChatClassifier {
    pub fn new(client: reqwest::Client, endpoint: ChatEndpoint, api_key: SecretString) -> Self {
        Self {
            client,
            endpoint,
            api_key,
        }
    }

    fn request_body<'a>(&'a self, text: &str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.endpoint.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: prompt::system_prompt(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt::user_prompt(text),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: self.endpoint.max_tokens,
            stream: false,
            response_format: self
                .endpoint
                .json_mode
                .then_some(ResponseFormat { kind: "json_object" }),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl RemoteClassifier for ChatClassifier {
    fn name(&self) -> &str {
        &self.endpoint.provider
    }

    async fn classify_remote(&self, text: &str) -> Result<RawClassification, LlmError> {
        let provider = self.endpoint.provider.as_str();

        let mut request = self
            .client
            .post(self.endpoint.completions_url())
            .bearer_auth(self.api_key.expose_secret())
            .json(&self.request_body(text));
        for (name, value) in &self.endpoint.extra_headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let resp = request
            .send()
            .await
            .map_err(|e| transport_error(provider, e))?;

        let resp = check_status(provider, resp).await?;

        let data: ChatResponse = resp.json().await.map_err(|e| LlmError::Upstream {
            provider: provider.to_string(),
            status: None,
            reason: format!("malformed response body: {e}"),
        })?;

        let content = data
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| LlmError::Upstream {
                provider: provider.to_string(),
                status: None,
                reason: "no content in response".to_string(),
            })?;

        debug!(
            provider,
            model = %self.endpoint.model,
            answer_len = content.len(),
            "Chat provider answered"
        );
        Ok(parse_classification(&content))
    }
}
