//! Ordering engine for ticket lists.
//!
//! The primary key honours the requested direction. Ties on the primary key
//! always fall back to higher priority first, then most recent first; that
//! tie-break never flips with the direction.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::tickets::model::Ticket;

/// Field to order tickets by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Priority,
    Date,
    Status,
    Category,
    Customer,
}

impl std::fmt::Display for SortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Priority => write!(f, "priority"),
            Self::Date => write!(f, "date"),
            Self::Status => write!(f, "status"),
            Self::Category => write!(f, "category"),
            Self::Customer => write!(f, "customer"),
        }
    }
}

impl std::str::FromStr for SortField {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "priority" => Ok(Self::Priority),
            "date" => Ok(Self::Date),
            "status" => Ok(Self::Status),
            "category" => Ok(Self::Category),
            "customer" => Ok(Self::Customer),
            _ => Err(format!("Unknown sort field: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(format!("Unknown sort direction: {}", s)),
        }
    }
}

/// Return a sorted copy of `tickets`. The input is left untouched.
pub fn sort_tickets(tickets: &[Ticket], field: SortField, direction: SortDirection) -> Vec<Ticket> {
    let mut sorted = tickets.to_vec();
    sorted.sort_by(|a, b| compare(a, b, field, direction));
    sorted
}

/// Full comparator: directed primary key, then the fixed tie-break.
pub fn compare(a: &Ticket, b: &Ticket, field: SortField, direction: SortDirection) -> Ordering {
    let primary = primary_key(a, b, field);
    let primary = match direction {
        SortDirection::Asc => primary,
        SortDirection::Desc => primary.reverse(),
    };
    primary.then_with(|| tie_break(a, b))
}

fn primary_key(a: &Ticket, b: &Ticket, field: SortField) -> Ordering {
    match field {
        SortField::Priority => a.priority().rank().cmp(&b.priority().rank()),
        SortField::Date => a.timestamp().cmp(&b.timestamp()),
        SortField::Status => a.status().rank().cmp(&b.status().rank()),
        SortField::Category => a
            .category()
            .as_str()
            .to_lowercase()
            .cmp(&b.category().as_str().to_lowercase()),
        SortField::Customer => a
            .customer_name()
            .to_lowercase()
            .cmp(&b.customer_name().to_lowercase()),
    }
}

fn tie_break(a: &Ticket, b: &Ticket) -> Ordering {
    b.priority()
        .rank()
        .cmp(&a.priority().rank())
        .then_with(|| b.timestamp().cmp(&a.timestamp()))
}
