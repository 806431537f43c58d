//! Ollama adapter: local model runtime via `/api/generate`.
//!
//! Also provides the runtime status probe (`/api/tags`) shown on the
//! operator's AI check page.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LlmError;
use crate::llm::prompt;
use crate::llm::provider::{RemoteClassifier, check_status, transport_error};
use crate::pipeline::parse::parse_classification;
use crate::pipeline::types::RawClassification;

const PROVIDER: &str = "ollama";

/// Default local Ollama endpoint.
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Default local model.
pub const DEFAULT_OLLAMA_MODEL: &str = "phi3.5";

/// Low temperature + fixed seed for repeatable answers.
const TEMPERATURE: f32 = 0.1;
const SEED: u32 = 42;
const NUM_PREDICT: u32 = 100;

/// Classifier backed by a local Ollama runtime.
pub struct OllamaClassifier {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClassifier {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    format: &'static str,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    seed: u32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

#[async_trait]
impl RemoteClassifier for OllamaClassifier {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn classify_remote(&self, text: &str) -> Result<RawClassification, LlmError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt: prompt::completion_prompt(text),
            stream: false,
            format: "json",
            options: GenerateOptions {
                temperature: TEMPERATURE,
                seed: SEED,
                num_predict: NUM_PREDICT,
            },
        };

        let resp = self
            .client
            .post(self.generate_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        let resp = check_status(PROVIDER, resp).await?;

        let data: GenerateResponse = resp.json().await.map_err(|e| LlmError::Upstream {
            provider: PROVIDER.to_string(),
            status: None,
            reason: format!("malformed response body: {e}"),
        })?;

        let answer = data.response.ok_or_else(|| LlmError::Upstream {
            provider: PROVIDER.to_string(),
            status: None,
            reason: "response field missing".to_string(),
        })?;

        debug!(model = %self.model, answer_len = answer.len(), "Ollama answered");
        Ok(parse_classification(&answer))
    }
}

// ── Status probe ────────────────────────────────────────────────────

/// Availability of a local model runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeStatus {
    pub is_running: bool,
    pub models: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

/// Probe an Ollama runtime. Never fails; problems are reported in the status.
pub async fn check_ollama_status(client: &reqwest::Client, base_url: &str) -> RuntimeStatus {
    let url = format!("{}/api/tags", base_url.trim_end_matches('/'));

    match client.get(&url).send().await {
        Ok(resp) if resp.status().is_success() => {
            let models = resp
                .json::<TagsResponse>()
                .await
                .map(|tags| tags.models.into_iter().map(|m| m.name).collect())
                .unwrap_or_default();
            RuntimeStatus {
                is_running: true,
                models,
                error: None,
            }
        }
        Ok(resp) => {
            debug!(status = %resp.status(), "Ollama status probe got non-success");
            RuntimeStatus {
                is_running: false,
                models: Vec::new(),
                error: Some("Ollama not responding".to_string()),
            }
        }
        Err(e) => {
            debug!(error = %e, "Ollama status probe failed to connect");
            RuntimeStatus {
                is_running: false,
                models: Vec::new(),
                error: Some("Cannot connect to Ollama. Is it running?".to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let c = OllamaClassifier::new(reqwest::Client::new(), "http://localhost:11434/", "phi3.5");
        assert_eq!(c.generate_url(), "http://localhost:11434/api/generate");
        assert_eq!(c.name(), "ollama");
    }

    #[test]
    fn generate_request_shape() {
        let body = GenerateRequest {
            model: "phi3.5",
            prompt: "p".into(),
            stream: false,
            format: "json",
            options: GenerateOptions {
                temperature: TEMPERATURE,
                seed: SEED,
                num_predict: NUM_PREDICT,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["format"], "json");
        assert_eq!(json["options"]["seed"], 42);
        assert_eq!(json["options"]["num_predict"], 100);
    }

    #[test]
    fn runtime_status_serialization_omits_missing_error() {
        let status = RuntimeStatus {
            is_running: true,
            models: vec!["phi3.5:latest".into()],
            error: None,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["isRunning"], true);
        assert!(json.get("is_running").is_none());
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn status_probe_reports_unreachable_runtime() {
        // Port 9 (discard) on localhost is not an HTTP server.
        let status = check_ollama_status(&reqwest::Client::new(), "http://127.0.0.1:9").await;
        assert!(!status.is_running);
        assert!(status.models.is_empty());
        assert!(status.error.is_some());
    }
}
