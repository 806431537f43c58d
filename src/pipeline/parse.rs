//! Tolerant parsing of AI classifier answers.
//!
//! Models are asked for a bare `{"category": "...", "priority": "..."}` object
//! but often wrap it in prose or markdown. Strategies, loosest last:
//! 1. the span from the first `{` to the last `}`, parsed as JSON
//! 2. a regex scrape of `category` / `priority` key-value pairs
//! 3. an empty candidate (normalizes to General/Medium)

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::pipeline::types::RawClassification;

static CATEGORY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)["']?category["']?\s*:\s*["']([^"']+)["']"#).expect("valid regex")
});

static PRIORITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)["']?priority["']?\s*:\s*["']([^"']+)["']"#).expect("valid regex")
});

/// Max characters of raw answer to include in logs.
const LOG_PREVIEW_CHARS: usize = 200;

/// Parse an AI answer into an untrusted candidate. Never fails.
pub fn parse_classification(text: &str) -> RawClassification {
    let json_str = extract_json_object(text);

    match serde_json::from_str::<serde_json::Value>(json_str) {
        Ok(serde_json::Value::Object(map)) => {
            let field = |key: &str| {
                map.get(key)
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())
            };
            return RawClassification {
                category: field("category"),
                priority: field("priority"),
            };
        }
        Ok(other) => {
            warn!(kind = json_kind(&other), "AI answer is JSON but not an object");
        }
        Err(e) => {
            warn!(
                error = %e,
                raw_response = %preview(text),
                "AI answer is not valid JSON, scraping key/value pairs"
            );
        }
    }

    let scraped = scrape_fields(text);
    if scraped.is_empty() {
        warn!(raw_response = %preview(text), "No classification found in AI answer");
    }
    scraped
}

/// Extract the outermost `{...}` span (first `{` to last `}`).
fn extract_json_object(text: &str) -> &str {
    let trimmed = text.trim();

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && end > start
    {
        return &trimmed[start..=end];
    }

    trimmed
}

fn scrape_fields(text: &str) -> RawClassification {
    let capture = |re: &Regex| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    };
    RawClassification {
        category: capture(&CATEGORY_PATTERN),
        priority: capture(&PRIORITY_PATTERN),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn preview(text: &str) -> String {
    text.chars().take(LOG_PREVIEW_CHARS).collect()
}
