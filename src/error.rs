//! Error types for Support Triage.

use serde::{Deserialize, Serialize};

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Rate-limit metadata reported by an AI provider.
///
/// Purely informational: the orchestrator falls back to keywords and the
/// operator-facing layer may show [`RateLimitInfo::describe`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitInfo {
    /// Provider message, e.g. "Free daily limit reached".
    pub message: String,
    /// `X-RateLimit-Limit` header, if sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
    /// `X-RateLimit-Remaining` header, if sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<String>,
    /// `X-RateLimit-Reset` header, if sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset: Option<String>,
}

impl RateLimitInfo {
    /// Human-readable notice for the operator.
    pub fn describe(&self) -> String {
        let mut notice = format!("Rate limit reached: {}.", self.message);
        if let Some(ref remaining) = self.remaining {
            notice.push_str(&format!(" Remaining: {remaining}."));
        }
        if let Some(ref reset) = self.reset {
            notice.push_str(&format!(" Resets at: {reset}."));
        }
        notice.push_str(" Using keyword fallback.");
        notice
    }
}

/// AI classifier provider errors.
///
/// The orchestrator treats every variant as "unavailable" and falls back to
/// the keyword result. Only `RateLimited` carries data worth showing.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} rate limited: {}", .info.message)]
    RateLimited { provider: String, info: RateLimitInfo },

    #[error("Authentication failed for provider {provider}")]
    Unauthorized { provider: String },

    #[error("Provider {provider} returned an error{}: {reason}", .status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    Upstream {
        provider: String,
        status: Option<u16>,
        reason: String,
    },

    #[error("Provider {provider} unreachable: {reason}")]
    Unreachable { provider: String, reason: String },
}

impl LlmError {
    /// Rate-limit metadata, when this is a rate-limit failure.
    pub fn rate_limit_info(&self) -> Option<&RateLimitInfo> {
        match self {
            Self::RateLimited { info, .. } => Some(info),
            _ => None,
        }
    }

    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "rate_limited",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Upstream { .. } => "upstream_error",
            Self::Unreachable { .. } => "unreachable",
        }
    }
}

/// Ticket store errors.
#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    #[error("Ticket {id} not found")]
    NotFound { id: String },
}

/// Errors while loading an inbox file.
#[derive(Debug, thiserror::Error)]
pub enum InboxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid inbox JSON: {0}")]
    Json(#[from] serde_json::Error),
}
