//! Ticket store: in-memory ticket list with broadcast to WebSocket clients.

use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};

use crate::error::{RateLimitInfo, TicketError};
use crate::pipeline::types::Status;
use crate::tickets::filter::TicketFilter;
use crate::tickets::model::{Ticket, TicketEvent};
use crate::tickets::sort::{SortDirection, SortField, sort_tickets};
use crate::tickets::summary::Summary;

/// Default broadcast channel capacity.
const DEFAULT_BROADCAST_CAPACITY: usize = 256;

pub struct TicketStore {
    tickets: RwLock<Vec<Ticket>>,
    last_rate_limit: RwLock<Option<RateLimitInfo>>,
    tx: broadcast::Sender<TicketEvent>,
}

impl TicketStore {
    pub fn new() -> Arc<Self> {
        let (tx, _rx) = broadcast::channel(DEFAULT_BROADCAST_CAPACITY);
        Arc::new(Self {
            tickets: RwLock::new(Vec::new()),
            last_rate_limit: RwLock::new(None),
            tx,
        })
    }

    /// Subscribe to ticket events. Each WS client calls this.
    pub fn subscribe(&self) -> broadcast::Receiver<TicketEvent> {
        self.tx.subscribe()
    }

    /// Replace the whole ticket list (after a triage run) and broadcast it.
    pub async fn replace_all(&self, tickets: Vec<Ticket>) {
        info!(count = tickets.len(), "Ticket list replaced");
        let event = TicketEvent::TicketsSync {
            tickets: tickets.clone(),
        };
        {
            let mut current = self.tickets.write().await;
            *current = tickets;
        }
        // Ok if no receivers are listening yet
        let _ = self.tx.send(event);
    }

    /// All tickets in stored order.
    pub async fn all(&self) -> Vec<Ticket> {
        self.tickets.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Ticket> {
        let tickets = self.tickets.read().await;
        tickets.iter().find(|t| t.id() == id).cloned()
    }

    /// Filtered and ordered view, leaving the stored order alone.
    pub async fn list(
        &self,
        filter: &TicketFilter,
        field: SortField,
        direction: SortDirection,
    ) -> Vec<Ticket> {
        let tickets = self.tickets.read().await;
        let filtered = filter.apply(&tickets);
        sort_tickets(&filtered, field, direction)
    }

    /// Change one ticket's status. Setting the current status again is a no-op
    /// that still succeeds.
    pub async fn set_status(&self, id: &str, status: Status) -> Result<Ticket, TicketError> {
        let mut tickets = self.tickets.write().await;

        let Some(ticket) = tickets.iter_mut().find(|t| t.id() == id) else {
            warn!(ticket_id = %id, "Status change for unknown ticket");
            return Err(TicketError::NotFound { id: id.to_string() });
        };

        if ticket.status() == status {
            debug!(ticket_id = %id, status = %status, "Status unchanged");
            return Ok(ticket.clone());
        }

        let from = ticket.status();
        ticket.set_status(status);
        let updated = ticket.clone();

        info!(ticket_id = %id, from = %from, to = %status, "Ticket status changed");

        let _ = self.tx.send(TicketEvent::StatusChanged {
            id: id.to_string(),
            status,
        });

        Ok(updated)
    }

    /// Set every ticket back to New. Returns the number of tickets.
    pub async fn reset_all(&self) -> usize {
        self.set_all(Status::New).await
    }

    /// Mark every ticket Resolved. Returns the number of tickets.
    pub async fn resolve_all(&self) -> usize {
        self.set_all(Status::Resolved).await
    }

    async fn set_all(&self, status: Status) -> usize {
        let snapshot = {
            let mut tickets = self.tickets.write().await;
            for ticket in tickets.iter_mut() {
                ticket.set_status(status);
            }
            tickets.clone()
        };

        info!(count = snapshot.len(), status = %status, "Bulk status change");

        let count = snapshot.len();
        let _ = self.tx.send(TicketEvent::TicketsSync { tickets: snapshot });
        count
    }

    pub async fn summary(&self) -> Summary {
        let tickets = self.tickets.read().await;
        Summary::from_tickets(&tickets)
    }

    /// Remember the latest rate-limit notice and broadcast it.
    pub async fn record_rate_limit(&self, info: RateLimitInfo) {
        let notice = info.describe();
        warn!(notice = %notice, "AI provider rate limit recorded");
        {
            let mut last = self.last_rate_limit.write().await;
            *last = Some(info.clone());
        }
        let _ = self.tx.send(TicketEvent::RateLimited { info, notice });
    }

    pub async fn last_rate_limit(&self) -> Option<RateLimitInfo> {
        self.last_rate_limit.read().await.clone()
    }

    pub async fn clear_rate_limit(&self) {
        *self.last_rate_limit.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::pipeline::types::{Category, ClassificationResult, Message, Priority};

    fn ticket(id: &str, category: Category, priority: Priority, hour: u32) -> Ticket {
        let message = Message {
            id: id.into(),
            customer_name: format!("Customer {id}"),
            email: format!("{id}@example.com"),
            body: "body".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, hour, 0, 0).unwrap(),
        };
        Ticket::from_triage(message, ClassificationResult::new(category, priority))
    }

    async fn seeded() -> Arc<TicketStore> {
        let store = TicketStore::new();
        store
            .replace_all(vec![
                ticket("1", Category::General, Priority::Low, 9),
                ticket("2", Category::Bug, Priority::High, 10),
                ticket("3", Category::Billing, Priority::High, 11),
            ])
            .await;
        store
    }

    #[tokio::test]
    async fn replace_and_get() {
        let store = seeded().await;
        assert_eq!(store.all().await.len(), 3);
        assert_eq!(store.get("2").await.unwrap().category(), Category::Bug);
        assert!(store.get("99").await.is_none());
    }

    #[tokio::test]
    async fn set_status_updates_only_status() {
        let store = seeded().await;
        let before = store.get("2").await.unwrap();

        let updated = store.set_status("2", Status::InProgress).await.unwrap();
        assert_eq!(updated.status(), Status::InProgress);
        assert_eq!(updated.classification(), before.classification());
        assert_eq!(store.get("2").await.unwrap().status(), Status::InProgress);
    }

    #[tokio::test]
    async fn set_status_unknown_id_fails() {
        let store = seeded().await;
        let err = store.set_status("nope", Status::Resolved).await.unwrap_err();
        assert!(matches!(err, TicketError::NotFound { ref id } if id == "nope"));
    }

    #[tokio::test]
    async fn status_change_is_broadcast() {
        let store = seeded().await;
        let mut rx = store.subscribe();

        store.set_status("1", Status::Resolved).await.unwrap();

        match rx.recv().await.unwrap() {
            TicketEvent::StatusChanged { id, status } => {
                assert_eq!(id, "1");
                assert_eq!(status, Status::Resolved);
            }
            other => panic!("Expected StatusChanged, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn same_status_is_not_broadcast() {
        let store = seeded().await;
        let mut rx = store.subscribe();
        store.set_status("1", Status::New).await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn bulk_reset_and_resolve() {
        let store = seeded().await;
        assert_eq!(store.resolve_all().await, 3);
        assert_eq!(store.summary().await.resolution_rate, 100);

        assert_eq!(store.reset_all().await, 3);
        let summary = store.summary().await;
        assert_eq!(summary.by_status.new, 3);
        assert_eq!(summary.resolution_rate, 0);
    }

    #[tokio::test]
    async fn list_filters_and_sorts() {
        let store = seeded().await;
        let high = store
            .list(
                &TicketFilter {
                    priority: Some(Priority::High),
                    ..Default::default()
                },
                SortField::Priority,
                SortDirection::Desc,
            )
            .await;
        let ids: Vec<&str> = high.iter().map(|t| t.id()).collect();
        // Same priority: most recent first
        assert_eq!(ids, vec!["3", "2"]);

        // Stored order untouched
        let all: Vec<String> = store.all().await.iter().map(|t| t.id().to_string()).collect();
        assert_eq!(all, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn rate_limit_is_remembered_and_broadcast() {
        let store = TicketStore::new();
        let mut rx = store.subscribe();
        assert!(store.last_rate_limit().await.is_none());

        let info = RateLimitInfo {
            message: "Free daily limit reached".into(),
            remaining: Some("0".into()),
            ..Default::default()
        };
        store.record_rate_limit(info.clone()).await;

        assert_eq!(store.last_rate_limit().await, Some(info));
        match rx.recv().await.unwrap() {
            TicketEvent::RateLimited { notice, .. } => {
                assert!(notice.contains("Free daily limit reached"));
            }
            other => panic!("Expected RateLimited, got {:?}", other),
        }

        store.clear_rate_limit().await;
        assert!(store.last_rate_limit().await.is_none());
    }
}
