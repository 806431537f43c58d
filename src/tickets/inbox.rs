//! Inbox sources: the built-in demo inbox and JSON inbox files.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use tracing::info;
use uuid::Uuid;

use crate::error::InboxError;
use crate::pipeline::types::Message;

/// One entry of an inbox file. `id` is optional; camelCase keys are accepted.
#[derive(Debug, Deserialize)]
struct InboxEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(alias = "customerName")]
    customer_name: String,
    email: String,
    #[serde(alias = "message")]
    body: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    timestamp: DateTime<Utc>,
}

impl From<InboxEntry> for Message {
    fn from(entry: InboxEntry) -> Self {
        Message {
            id: entry.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            customer_name: entry.customer_name,
            email: entry.email,
            body: entry.body,
            timestamp: entry.timestamp,
        }
    }
}

/// RFC 3339, or a bare `YYYY-MM-DDTHH:MM:SS` read as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("Invalid timestamp '{}': {}", raw, e))
}

/// Parse an inbox from a JSON array.
pub fn parse_inbox(json: &str) -> Result<Vec<Message>, InboxError> {
    let entries: Vec<InboxEntry> = serde_json::from_str(json)?;
    Ok(entries.into_iter().map(Message::from).collect())
}

/// Load an inbox file (JSON array of messages).
pub fn load_inbox(path: &Path) -> Result<Vec<Message>, InboxError> {
    let json = std::fs::read_to_string(path)?;
    let messages = parse_inbox(&json)?;
    info!(path = %path.display(), count = messages.len(), "Loaded inbox");
    Ok(messages)
}

const DEMO_INBOX: &[(&str, &str, &str, &str, &str)] = &[
    (
        "1",
        "John Smith",
        "john@example.com",
        "My invoice is wrong for last month – I was charged twice.",
        "2024-01-15T09:30:00",
    ),
    (
        "2",
        "Sarah Johnson",
        "sarah@company.com",
        "The app keeps crashing when I try to upload a large PDF file. This is urgent!",
        "2024-01-15T10:15:00",
    ),
    (
        "3",
        "Alex Chen",
        "alex@startup.io",
        "Can you add support for dark mode in the next release? Would love to have this feature.",
        "2024-01-15T11:00:00",
    ),
    (
        "4",
        "Maria Garcia",
        "maria@business.com",
        "I need help with my account settings. Not sure how to update my profile picture.",
        "2024-01-15T11:45:00",
    ),
    (
        "5",
        "Robert Wilson",
        "robert@tech.co",
        "Payment failed but money was deducted from my account. Please check ASAP.",
        "2024-01-15T12:30:00",
    ),
    (
        "6",
        "Emma Davis",
        "emma@design.com",
        "Export function is not working. Getting \"server error\" message every time.",
        "2024-01-15T13:20:00",
    ),
    (
        "7",
        "David Miller",
        "david@enterprise.net",
        "Would be great if we could schedule reports to be sent automatically.",
        "2024-01-15T14:10:00",
    ),
    (
        "8",
        "Lisa Wang",
        "lisa@consulting.com",
        "Question about your pricing plans. Can we get a custom quote?",
        "2024-01-15T15:00:00",
    ),
    (
        "9",
        "Tom Baker",
        "tom@shop.com",
        "Login page is broken on mobile Safari. Can't access my account.",
        "2024-01-15T15:45:00",
    ),
    (
        "10",
        "Sophia Lee",
        "sophia@creative.org",
        "Monthly subscription renewed but I was charged the wrong amount.",
        "2024-01-15T16:30:00",
    ),
    (
        "11",
        "James Taylor",
        "james@studio.com",
        "Suggestion: Add keyboard shortcuts for power users.",
        "2024-01-15T17:15:00",
    ),
    (
        "12",
        "Olivia Brown",
        "olivia@healthcare.net",
        "How do I reset my password? Forgot my login credentials.",
        "2024-01-15T18:00:00",
    ),
    (
        "13",
        "Michael Clark",
        "michael@finance.com",
        "Data sync is failing between devices. Last sync was 2 days ago.",
        "2024-01-15T19:30:00",
    ),
    (
        "14",
        "Jessica White",
        "jessica@edu.edu",
        "Received duplicate invoices for November and December.",
        "2024-01-15T20:15:00",
    ),
    (
        "15",
        "Daniel Harris",
        "daniel@gaming.com",
        "Would love to see integration with Slack for notifications.",
        "2024-01-15T21:00:00",
    ),
    (
        "16",
        "Rachel Kim",
        "rachel@marketing.com",
        "The analytics dashboard is loading very slowly today. Takes over 30 seconds.",
        "2024-01-15T22:30:00",
    ),
    (
        "17",
        "Kevin Patel",
        "kevin@retail.com",
        "Can we get an annual billing option with discount? Considering upgrading our plan.",
        "2024-01-15T23:15:00",
    ),
    (
        "18",
        "Amanda Scott",
        "amanda@nonprofit.org",
        "Request: Add two-factor authentication for enhanced security.",
        "2024-01-16T08:00:00",
    ),
];

/// The built-in demonstration inbox (18 messages).
pub fn demo_inbox() -> Vec<Message> {
    DEMO_INBOX
        .iter()
        .map(|&(id, name, email, body, ts)| Message {
            id: id.to_string(),
            customer_name: name.to_string(),
            email: email.to_string(),
            body: body.to_string(),
            timestamp: parse_timestamp(ts).unwrap_or_default(),
        })
        .collect()
}
