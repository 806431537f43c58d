//! Shared types for the triage pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RateLimitInfo;

// ── Closed enumerations ─────────────────────────────────────────────

/// Ticket category. Exactly one per message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Bug,
    Billing,
    #[serde(rename = "Feature Request")]
    FeatureRequest,
    General,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Self::Bug,
        Self::Billing,
        Self::FeatureRequest,
        Self::General,
    ];

    /// Wire string, e.g. `"Feature Request"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bug => "Bug",
            Self::Billing => "Billing",
            Self::FeatureRequest => "Feature Request",
            Self::General => "General",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Bug" => Ok(Self::Bug),
            "Billing" => Ok(Self::Billing),
            "Feature Request" => Ok(Self::FeatureRequest),
            "General" => Ok(Self::General),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

/// Ticket priority, ordered High > Medium > Low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Self::High, Self::Medium, Self::Low];

    /// Sort rank: High=3, Medium=2, Low=1.
    pub fn rank(&self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "High" => Ok(Self::High),
            "Medium" => Ok(Self::Medium),
            "Low" => Ok(Self::Low),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

/// Operator-managed ticket status. Never set by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    New,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
}

impl Status {
    pub const ALL: [Status; 3] = [Self::New, Self::InProgress, Self::Resolved];

    /// Sort rank: New=3, In Progress=2, Resolved=1.
    pub fn rank(&self) -> u8 {
        match self {
            Self::New => 3,
            Self::InProgress => 2,
            Self::Resolved => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(Self::New),
            "In Progress" => Ok(Self::InProgress),
            "Resolved" => Ok(Self::Resolved),
            _ => Err(format!("Unknown status: {}", s)),
        }
    }
}

// ── Inbound message ─────────────────────────────────────────────────

/// A customer-support message as ingested. Never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique ID (from the inbox, or a generated UUID).
    pub id: String,
    /// Customer display name.
    pub customer_name: String,
    /// Customer email address.
    pub email: String,
    /// Free-text message body.
    #[serde(alias = "message")]
    pub body: String,
    /// When the message was received.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message with a generated ID.
    pub fn new(
        customer_name: impl Into<String>,
        email: impl Into<String>,
        body: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            customer_name: customer_name.into(),
            email: email.into(),
            body: body.into(),
            timestamp,
        }
    }

    /// Replace the generated ID with a caller-supplied one.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

// ── Classification values ───────────────────────────────────────────

/// A validated (category, priority) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: Category,
    pub priority: Priority,
}

impl ClassificationResult {
    pub fn new(category: Category, priority: Priority) -> Self {
        Self { category, priority }
    }
}

impl Default for ClassificationResult {
    /// `{General, Medium}`, the answer when nothing usable was found.
    fn default() -> Self {
        Self {
            category: Category::General,
            priority: Priority::Medium,
        }
    }
}

/// Untrusted classification candidate from an AI provider.
///
/// Fields are whatever strings the provider produced (or nothing at all).
/// Only [`crate::pipeline::normalize::normalize`] turns this into a
/// [`ClassificationResult`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawClassification {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
}

impl RawClassification {
    pub fn new(category: impl Into<String>, priority: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            priority: Some(priority.into()),
        }
    }

    /// Neither field present.
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.priority.is_none()
    }
}

impl From<ClassificationResult> for RawClassification {
    fn from(result: ClassificationResult) -> Self {
        Self::new(result.category.as_str(), result.priority.as_str())
    }
}

// ── Mode selector ───────────────────────────────────────────────────

/// Operator choice between keyword-only and AI-assisted triage.
///
/// Persisted by the presentation layer as `"keyword"` / `"ai"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageMode {
    Keyword,
    #[default]
    #[serde(rename = "ai")]
    AiAssisted,
}

impl std::fmt::Display for TriageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Keyword => write!(f, "keyword"),
            Self::AiAssisted => write!(f, "ai"),
        }
    }
}

impl std::str::FromStr for TriageMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keyword" => Ok(Self::Keyword),
            "ai" => Ok(Self::AiAssisted),
            other => Err(format!("Unknown triage mode: {}", other)),
        }
    }
}

// ── Triage outcome ──────────────────────────────────────────────────

/// Which path produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageSource {
    /// Keyword result used directly (trusted, or keyword mode).
    Keyword,
    /// AI answer, normalized.
    Remote,
    /// Escalation failed; keyword result used instead.
    Fallback,
}

impl TriageSource {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Remote => "remote",
            Self::Fallback => "fallback",
        }
    }
}

/// Result of one triage call, with the path taken.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriageOutcome {
    pub result: ClassificationResult,
    pub source: TriageSource,
    /// Present when the escalation was refused by a provider rate limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triage_source_labels() {
        assert_eq!(TriageSource::Keyword.label(), "keyword");
        assert_eq!(TriageSource::Remote.label(), "remote");
        assert_eq!(TriageSource::Fallback.label(), "fallback");
    }

    #[test]
    fn enum_wire_strings_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        for priority in Priority::ALL {
            assert_eq!(priority.to_string().parse::<Priority>().unwrap(), priority);
        }
        for status in Status::ALL {
            assert_eq!(status.to_string().parse::<Status>().unwrap(), status);
        }
    }

    #[test]
    fn enum_parsing_is_exact() {
        assert!("bug".parse::<Category>().is_err());
        assert!("FeatureRequest".parse::<Category>().is_err());
        assert!("high".parse::<Priority>().is_err());
        assert!("in progress".parse::<Status>().is_err());
    }

    #[test]
    fn ranks_are_ordered() {
        assert!(Priority::High.rank() > Priority::Medium.rank());
        assert!(Priority::Medium.rank() > Priority::Low.rank());
        assert!(Status::New.rank() > Status::InProgress.rank());
        assert!(Status::InProgress.rank() > Status::Resolved.rank());
    }

    #[test]
    fn serde_uses_display_strings() {
        let json = serde_json::to_value(Category::FeatureRequest).unwrap();
        assert_eq!(json, "Feature Request");
        let json = serde_json::to_value(Status::InProgress).unwrap();
        assert_eq!(json, "In Progress");
        let status: Status = serde_json::from_str("\"Resolved\"").unwrap();
        assert_eq!(status, Status::Resolved);
    }

    #[test]
    fn triage_mode_parses_persisted_values() {
        assert_eq!("ai".parse::<TriageMode>().unwrap(), TriageMode::AiAssisted);
        assert_eq!("Keyword".parse::<TriageMode>().unwrap(), TriageMode::Keyword);
        assert!("fast".parse::<TriageMode>().is_err());
        assert_eq!(TriageMode::default(), TriageMode::AiAssisted);
        assert_eq!(serde_json::to_value(TriageMode::AiAssisted).unwrap(), "ai");
        assert_eq!(serde_json::to_value(TriageMode::Keyword).unwrap(), "keyword");
    }

    #[test]
    fn message_accepts_message_field_alias() {
        let msg: Message = serde_json::from_value(serde_json::json!({
            "id": "1",
            "customer_name": "John Smith",
            "email": "john@example.com",
            "message": "My invoice is wrong",
            "timestamp": "2024-01-15T09:30:00Z"
        }))
        .unwrap();
        assert_eq!(msg.body, "My invoice is wrong");
    }

    #[test]
    fn message_new_generates_id() {
        let a = Message::new("A", "a@x.com", "hi", Utc::now());
        let b = Message::new("B", "b@x.com", "hi", Utc::now());
        assert_ne!(a.id, b.id);
        assert_eq!(a.clone().with_id("7").id, "7");
    }

    #[test]
    fn raw_from_result_keeps_wire_strings() {
        let raw = RawClassification::from(ClassificationResult::new(
            Category::FeatureRequest,
            Priority::Low,
        ));
        assert_eq!(raw.category.as_deref(), Some("Feature Request"));
        assert_eq!(raw.priority.as_deref(), Some("Low"));
        assert!(RawClassification::default().is_empty());
    }
}
