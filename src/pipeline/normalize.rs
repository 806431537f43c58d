//! Validation gate between untrusted AI output and typed tickets.
//!
//! Values outside the closed enumerations are silently replaced:
//! category → `General`, priority → `Medium`.

use tracing::debug;

use crate::pipeline::types::{Category, ClassificationResult, Priority, RawClassification};

/// Coerce an untrusted candidate into a valid classification.
pub fn normalize(raw: &RawClassification) -> ClassificationResult {
    let category = match raw.category.as_deref().map(str::parse::<Category>) {
        Some(Ok(category)) => category,
        other => {
            debug!(raw = ?raw.category, present = other.is_some(), "Category defaulted to General");
            Category::General
        }
    };

    let priority = match raw.priority.as_deref().map(str::parse::<Priority>) {
        Some(Ok(priority)) => priority,
        other => {
            debug!(raw = ?raw.priority, present = other.is_some(), "Priority defaulted to Medium");
            Priority::Medium
        }
    };

    ClassificationResult { category, priority }
}
