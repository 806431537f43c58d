//! Support Triage: hybrid keyword/AI classification of customer-support messages.

pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod tickets;
