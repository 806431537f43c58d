//! Ticket filtering by category, priority and status.

use serde::Deserialize;

use crate::pipeline::types::{Category, Priority, Status};
use crate::tickets::model::Ticket;

/// Equality filter; unset fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct TicketFilter {
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
}

impl TicketFilter {
    pub fn matches(&self, ticket: &Ticket) -> bool {
        self.category.is_none_or(|c| ticket.category() == c)
            && self.priority.is_none_or(|p| ticket.priority() == p)
            && self.status.is_none_or(|s| ticket.status() == s)
    }

    /// Filter a slice, keeping input order.
    pub fn apply(&self, tickets: &[Ticket]) -> Vec<Ticket> {
        tickets.iter().filter(|t| self.matches(t)).cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.priority.is_none() && self.status.is_none()
    }
}
