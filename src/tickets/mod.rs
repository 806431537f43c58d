//! Tickets: triaged messages, their ordering, and the operator surface.
//!
//! - `model`: `Ticket` and the events broadcast to WebSocket clients
//! - `filter` / `sort`: the dashboard's list view (filter, then order)
//! - `store`: in-memory ticket list with broadcast fan-out
//! - `inbox`: message sources (demo inbox, JSON files)
//! - `routes`: Axum REST + WebSocket endpoints

pub mod filter;
pub mod inbox;
pub mod model;
pub mod routes;
pub mod sort;
pub mod store;
pub mod summary;

pub use filter::TicketFilter;
pub use model::{Ticket, TicketAction, TicketEvent};
pub use sort::{SortDirection, SortField, sort_tickets};
pub use store::TicketStore;
pub use summary::Summary;
