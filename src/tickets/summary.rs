//! Dashboard-style counts over a ticket list.

use serde::Serialize;

use crate::pipeline::types::{Category, Priority, Status};
use crate::tickets::model::Ticket;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub bug: usize,
    pub billing: usize,
    pub feature_request: usize,
    pub general: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub new: usize,
    pub in_progress: usize,
    pub resolved: usize,
}

/// Totals by category, priority and status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub by_category: CategoryCounts,
    pub by_priority: PriorityCounts,
    pub by_status: StatusCounts,
    /// Resolved share of all tickets, rounded percent. 0 for an empty list.
    pub resolution_rate: u32,
}

impl Summary {
    pub fn from_tickets(tickets: &[Ticket]) -> Self {
        let mut summary = Self {
            total: tickets.len(),
            ..Default::default()
        };

        for ticket in tickets {
            match ticket.category() {
                Category::Bug => summary.by_category.bug += 1,
                Category::Billing => summary.by_category.billing += 1,
                Category::FeatureRequest => summary.by_category.feature_request += 1,
                Category::General => summary.by_category.general += 1,
            }
            match ticket.priority() {
                Priority::High => summary.by_priority.high += 1,
                Priority::Medium => summary.by_priority.medium += 1,
                Priority::Low => summary.by_priority.low += 1,
            }
            match ticket.status() {
                Status::New => summary.by_status.new += 1,
                Status::InProgress => summary.by_status.in_progress += 1,
                Status::Resolved => summary.by_status.resolved += 1,
            }
        }

        if summary.total > 0 {
            let rate = summary.by_status.resolved as f64 / summary.total as f64 * 100.0;
            summary.resolution_rate = rate.round() as u32;
        }

        summary
    }
}
