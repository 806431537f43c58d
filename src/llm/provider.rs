//! The remote classifier capability and shared HTTP error mapping.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;

use crate::error::{LlmError, RateLimitInfo};
use crate::pipeline::types::RawClassification;

/// Default rate-limit message when the provider sends none.
const DEFAULT_RATE_LIMIT_MESSAGE: &str = "Free daily limit reached";

/// Max characters of an error body kept in `LlmError::Upstream`.
const ERROR_BODY_PREVIEW_CHARS: usize = 300;

/// An AI classifier reachable over the network.
///
/// Implementations send the message text to a hosted (or local) language
/// model and return whatever it answered as an untrusted candidate. The
/// caller validates the candidate and owns every fallback decision.
#[async_trait]
pub trait RemoteClassifier: Send + Sync {
    /// Provider name for logs (e.g. "ollama", "cerebras").
    fn name(&self) -> &str;

    /// Ask the provider to classify `text`.
    async fn classify_remote(&self, text: &str) -> Result<RawClassification, LlmError>;
}

/// Map a transport failure to `Unreachable`.
pub(crate) fn transport_error(provider: &str, e: reqwest::Error) -> LlmError {
    LlmError::Unreachable {
        provider: provider.to_string(),
        reason: e.to_string(),
    }
}

/// Turn a non-success response into the matching `LlmError`.
///
/// Returns the response unchanged when the status is 2xx.
pub(crate) async fn check_status(
    provider: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, LlmError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            let headers = resp.headers().clone();
            let body = resp.text().await.unwrap_or_default();
            let info = rate_limit_info(&headers, &body);
            tracing::warn!(
                provider,
                remaining = info.remaining.as_deref().unwrap_or("unknown"),
                reset = info.reset.as_deref().unwrap_or("unknown"),
                "Provider rate limit hit"
            );
            Err(LlmError::RateLimited {
                provider: provider.to_string(),
                info,
            })
        }
        StatusCode::UNAUTHORIZED => Err(LlmError::Unauthorized {
            provider: provider.to_string(),
        }),
        _ => {
            let body = resp.text().await.unwrap_or_default();
            Err(LlmError::Upstream {
                provider: provider.to_string(),
                status: Some(status.as_u16()),
                reason: body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect(),
            })
        }
    }
}

/// Build rate-limit metadata from `X-RateLimit-*` headers and the error body.
pub(crate) fn rate_limit_info(headers: &HeaderMap, body: &str) -> RateLimitInfo {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
    };

    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.get("message"))
                .and_then(|m| m.as_str())
                .map(|s| s.to_string())
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_RATE_LIMIT_MESSAGE.to_string());

    RateLimitInfo {
        message,
        limit: header("x-ratelimit-limit"),
        remaining: header("x-ratelimit-remaining"),
        reset: header("x-ratelimit-reset"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn rate_limit_info_reads_headers_and_nested_message() {
        let mut headers = HeaderMap::new();
        headers.insert("X-RateLimit-Limit", HeaderValue::from_static("50"));
        headers.insert("X-RateLimit-Remaining", HeaderValue::from_static("0"));
        headers.insert("X-RateLimit-Reset", HeaderValue::from_static("1736985600000"));

        let info = rate_limit_info(
            &headers,
            r#"{"error": {"message": "Rate limit exceeded: free-models-per-day"}}"#,
        );
        assert_eq!(info.message, "Rate limit exceeded: free-models-per-day");
        assert_eq!(info.limit.as_deref(), Some("50"));
        assert_eq!(info.remaining.as_deref(), Some("0"));
        assert_eq!(info.reset.as_deref(), Some("1736985600000"));
    }

    #[test]
    fn rate_limit_info_defaults_message() {
        let info = rate_limit_info(&HeaderMap::new(), "not json");
        assert_eq!(info.message, DEFAULT_RATE_LIMIT_MESSAGE);
        assert!(info.limit.is_none());

        let info = rate_limit_info(&HeaderMap::new(), r#"{"message": ""}"#);
        assert_eq!(info.message, DEFAULT_RATE_LIMIT_MESSAGE);
    }

    #[test]
    fn rate_limit_info_reads_flat_message() {
        let info = rate_limit_info(&HeaderMap::new(), r#"{"message": "slow down"}"#);
        assert_eq!(info.message, "slow down");
    }
}
