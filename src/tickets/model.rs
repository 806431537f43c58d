//! Ticket data model and store events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RateLimitInfo;
use crate::pipeline::types::{Category, ClassificationResult, Message, Priority, Status};

/// A triaged support message.
///
/// Category and priority are fixed at construction; only the status changes
/// afterwards, and only by operator action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ticket {
    #[serde(flatten)]
    message: Message,
    category: Category,
    priority: Priority,
    status: Status,
}

impl Ticket {
    /// Build a ticket from a message and its validated classification.
    pub fn from_triage(message: Message, classification: ClassificationResult) -> Self {
        Self {
            message,
            category: classification.category,
            priority: classification.priority,
            status: Status::New,
        }
    }

    pub fn id(&self) -> &str {
        &self.message.id
    }

    pub fn customer_name(&self) -> &str {
        &self.message.customer_name
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.message.timestamp
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn classification(&self) -> ClassificationResult {
        ClassificationResult::new(self.category, self.priority)
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    /// Builder-style status for fixtures and re-imports.
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }
}

/// Event pushed to WebSocket subscribers of the ticket store.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TicketEvent {
    /// Full ticket list (on connect, after re-triage, after bulk updates).
    TicketsSync { tickets: Vec<Ticket> },
    /// One ticket changed status.
    StatusChanged { id: String, status: Status },
    /// An AI provider refused requests during triage.
    RateLimited { info: RateLimitInfo, notice: String },
}

/// Operator action sent by a WebSocket client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TicketAction {
    SetStatus { id: String, status: Status },
    ResetAll,
    ResolveAll,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ticket() -> Ticket {
        let message = Message {
            id: "2".into(),
            customer_name: "Sarah Johnson".into(),
            email: "sarah@company.com".into(),
            body: "The app keeps crashing".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 10, 15, 0).unwrap(),
        };
        Ticket::from_triage(
            message,
            ClassificationResult::new(Category::Bug, Priority::High),
        )
    }

    #[test]
    fn new_tickets_start_new() {
        let t = ticket();
        assert_eq!(t.status(), Status::New);
        assert_eq!(t.id(), "2");
        assert_eq!(t.customer_name(), "Sarah Johnson");
    }

    #[test]
    fn status_change_keeps_classification() {
        let mut t = ticket();
        let before = t.classification();
        t.set_status(Status::InProgress);
        assert_eq!(t.status(), Status::InProgress);
        assert_eq!(t.classification(), before);
    }

    #[test]
    fn serializes_flat() {
        let json = serde_json::to_value(ticket()).unwrap();
        assert_eq!(json["id"], "2");
        assert_eq!(json["customer_name"], "Sarah Johnson");
        assert_eq!(json["body"], "The app keeps crashing");
        assert_eq!(json["category"], "Bug");
        assert_eq!(json["priority"], "High");
        assert_eq!(json["status"], "New");
        assert!(json.get("message").is_none());
    }

    #[test]
    fn events_are_tagged() {
        let event = TicketEvent::StatusChanged {
            id: "2".into(),
            status: Status::Resolved,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "status_changed");
        assert_eq!(json["status"], "Resolved");
    }

    #[test]
    fn actions_parse_wire_values() {
        let action: TicketAction =
            serde_json::from_str(r#"{"action": "set_status", "id": "4", "status": "In Progress"}"#)
                .unwrap();
        assert!(matches!(
            action,
            TicketAction::SetStatus { ref id, status: Status::InProgress } if id == "4"
        ));
        let action: TicketAction = serde_json::from_str(r#"{"action": "reset_all"}"#).unwrap();
        assert!(matches!(action, TicketAction::ResetAll));
        assert!(
            serde_json::from_str::<TicketAction>(
                r#"{"action": "set_status", "id": "4", "status": "Done"}"#
            )
            .is_err()
        );
    }
}
