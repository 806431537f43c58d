//! Configuration types.
//!
//! Everything is read from environment variables; unset variables fall back
//! to defaults, malformed ones are errors.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig, ollama::DEFAULT_OLLAMA_BASE_URL};
use crate::pipeline::processor::DEFAULT_MAX_CONCURRENT_ESCALATIONS;
use crate::pipeline::types::TriageMode;

/// Service configuration.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// Default triage mode for startup and requests that don't name one.
    pub mode: TriageMode,
    /// Which AI backend to escalate to.
    pub provider: LlmBackend,
    pub model: Option<String>,
    /// Base URL override for the AI backend.
    pub base_url: Option<String>,
    pub cerebras_api_key: Option<SecretString>,
    pub openrouter_api_key: Option<SecretString>,
    /// Ollama runtime used by the status probe (and the Ollama backend).
    pub ollama_base_url: String,
    /// Cap on concurrent AI escalations during batch triage.
    pub max_concurrent: usize,
    pub ai_timeout: Duration,
    pub http_port: u16,
    /// JSON inbox to load instead of the demo inbox.
    pub inbox_path: Option<PathBuf>,
    /// Directory for daily rolling log files.
    pub log_dir: Option<PathBuf>,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            mode: TriageMode::AiAssisted,
            provider: LlmBackend::Cerebras,
            model: None,
            base_url: None,
            cerebras_api_key: None,
            openrouter_api_key: None,
            ollama_base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT_ESCALATIONS,
            ai_timeout: Duration::from_secs(30),
            http_port: 8080,
            inbox_path: None,
            log_dir: None,
        }
    }
}

impl TriageConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let mode = parse_var(&get, "TRIAGE_MODE")?.unwrap_or(defaults.mode);
        let provider = parse_var(&get, "TRIAGE_AI_PROVIDER")?.unwrap_or(defaults.provider);

        let max_concurrent: usize =
            parse_var(&get, "TRIAGE_MAX_CONCURRENT")?.unwrap_or(defaults.max_concurrent);
        if max_concurrent == 0 {
            return Err(ConfigError::InvalidValue {
                key: "TRIAGE_MAX_CONCURRENT".into(),
                message: "must be at least 1".into(),
            });
        }

        let ai_timeout = parse_var::<u64, _>(&get, "TRIAGE_AI_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.ai_timeout);

        Ok(Self {
            mode,
            provider,
            model: get("TRIAGE_AI_MODEL"),
            base_url: get("TRIAGE_AI_BASE_URL"),
            cerebras_api_key: get("CEREBRAS_API_KEY").map(SecretString::from),
            openrouter_api_key: get("OPENROUTER_API_KEY").map(SecretString::from),
            ollama_base_url: get("OLLAMA_BASE_URL").unwrap_or(defaults.ollama_base_url),
            max_concurrent,
            ai_timeout,
            http_port: parse_var(&get, "TRIAGE_HTTP_PORT")?.unwrap_or(defaults.http_port),
            inbox_path: get("TRIAGE_INBOX_PATH").map(PathBuf::from),
            log_dir: get("TRIAGE_LOG_DIR").map(PathBuf::from),
        })
    }

    /// AI backend configuration.
    ///
    /// Built in keyword mode too, so operators can switch modes at runtime.
    /// Hosted backends without their API key are a `MissingEnvVar` error;
    /// callers degrade to keyword-only triage.
    pub fn llm_config(&self) -> Result<LlmConfig, ConfigError> {
        let api_key = match self.provider {
            LlmBackend::Ollama => None,
            LlmBackend::Cerebras => Some(
                self.cerebras_api_key
                    .clone()
                    .ok_or_else(|| ConfigError::MissingEnvVar("CEREBRAS_API_KEY".into()))?,
            ),
            LlmBackend::OpenRouter => Some(
                self.openrouter_api_key
                    .clone()
                    .ok_or_else(|| ConfigError::MissingEnvVar("OPENROUTER_API_KEY".into()))?,
            ),
        };

        let base_url = match self.provider {
            LlmBackend::Ollama => self
                .base_url
                .clone()
                .or_else(|| Some(self.ollama_base_url.clone())),
            _ => self.base_url.clone(),
        };

        Ok(LlmConfig {
            backend: self.provider,
            api_key,
            model: self.model.clone(),
            base_url,
            timeout: self.ai_timeout,
        })
    }
}

fn parse_var<T, G>(get: &G, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })
        })
        .transpose()
}
