//! Triage processor: the hybrid keyword/AI orchestrator.
//!
//! **Core invariant: every message gets a valid category and priority.**
//! No failure on the AI path ever reaches the caller.
//!
//! Flow per message:
//! 1. Keyword rules (fast, no I/O), always run
//! 2. Bug/Billing keyword matches are trusted and returned as-is
//! 3. General/Feature Request escalate to the remote classifier
//! 4. The AI answer is normalized; any failure falls back to step 1's result

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::error::RateLimitInfo;
use crate::llm::RemoteClassifier;
use crate::pipeline::normalize::normalize;
use crate::pipeline::rules::KeywordClassifier;
use crate::pipeline::types::{
    Category, ClassificationResult, Message, TriageMode, TriageOutcome, TriageSource,
};
use crate::tickets::model::Ticket;

/// Default cap on in-flight AI escalations during batch triage.
pub const DEFAULT_MAX_CONCURRENT_ESCALATIONS: usize = 4;

/// Result of triaging a batch of messages.
#[derive(Debug, Clone)]
pub struct TriageBatch {
    /// One ticket per input message, in input order.
    pub tickets: Vec<Ticket>,
    /// Rate-limit notices hit along the way (informational).
    pub rate_limits: Vec<RateLimitInfo>,
}

/// Hybrid triage orchestrator.
pub struct TriageProcessor {
    rules: KeywordClassifier,
    remote: Option<Arc<dyn RemoteClassifier>>,
    max_concurrent: usize,
}

impl TriageProcessor {
    /// Create a new processor. `remote = None` means keyword-only regardless of mode.
    pub fn new(
        rules: KeywordClassifier,
        remote: Option<Arc<dyn RemoteClassifier>>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            rules,
            remote,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Keyword-only processor (no AI provider configured).
    pub fn keyword_only() -> Self {
        Self::new(
            KeywordClassifier::default_rules(),
            None,
            DEFAULT_MAX_CONCURRENT_ESCALATIONS,
        )
    }

    /// Whether an AI provider is configured.
    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Name of the configured AI provider, if any.
    pub fn remote_name(&self) -> Option<&str> {
        self.remote.as_deref().map(|r| r.name())
    }

    /// Classify one message body.
    pub async fn triage(&self, text: &str, mode: TriageMode) -> ClassificationResult {
        self.triage_traced(text, mode).await.result
    }

    /// Classify one message body, reporting which path produced the result.
    pub async fn triage_traced(&self, text: &str, mode: TriageMode) -> TriageOutcome {
        let keyword = self.rules.classify(text);

        let remote = match (mode, &self.remote) {
            (TriageMode::AiAssisted, Some(remote)) => remote,
            _ => {
                return TriageOutcome {
                    result: keyword,
                    source: TriageSource::Keyword,
                    rate_limit: None,
                };
            }
        };

        if is_trusted(&keyword) {
            debug!(
                category = %keyword.category,
                "Keyword match trusted, skipping AI escalation"
            );
            return TriageOutcome {
                result: keyword,
                source: TriageSource::Keyword,
                rate_limit: None,
            };
        }

        debug!(
            provider = remote.name(),
            keyword_category = %keyword.category,
            "Escalating to AI classifier"
        );

        match remote.classify_remote(text).await {
            Ok(raw) => {
                let result = normalize(&raw);
                debug!(
                    category = %result.category,
                    priority = %result.priority,
                    "AI classification normalized"
                );
                TriageOutcome {
                    result,
                    source: TriageSource::Remote,
                    rate_limit: None,
                }
            }
            Err(e) => {
                warn!(
                    provider = remote.name(),
                    error = %e,
                    kind = e.label(),
                    "AI classification failed, falling back to keywords"
                );
                TriageOutcome {
                    result: keyword,
                    source: TriageSource::Fallback,
                    rate_limit: e.rate_limit_info().cloned(),
                }
            }
        }
    }

    /// Triage a batch of messages into tickets.
    ///
    /// Messages are triaged concurrently, at most `max_concurrent` at a time.
    /// The output has one ticket per input, in input order.
    pub async fn triage_batch(&self, messages: Vec<Message>, mode: TriageMode) -> TriageBatch {
        let count = messages.len();
        info!(count, mode = %mode, "Triaging message batch");

        let outcomes: Vec<(Message, TriageOutcome)> = stream::iter(messages)
            .map(|message| async move {
                let outcome = self.triage_traced(&message.body, mode).await;
                (message, outcome)
            })
            .buffered(self.max_concurrent)
            .collect()
            .await;

        let mut tickets = Vec::with_capacity(count);
        let mut rate_limits = Vec::new();
        let mut escalated = 0;
        let mut fallbacks = 0;

        for (message, outcome) in outcomes {
            debug!(message_id = %message.id, source = outcome.source.label(), "Message triaged");
            match outcome.source {
                TriageSource::Remote => escalated += 1,
                TriageSource::Fallback => {
                    escalated += 1;
                    fallbacks += 1;
                }
                TriageSource::Keyword => {}
            }
            if let Some(info) = outcome.rate_limit {
                rate_limits.push(info);
            }
            tickets.push(Ticket::from_triage(message, outcome.result));
        }

        info!(
            triaged = tickets.len(),
            escalated,
            fallbacks,
            rate_limited = rate_limits.len(),
            "Batch triage complete"
        );

        TriageBatch {
            tickets,
            rate_limits,
        }
    }

    /// Synchronous keyword-only batch.
    pub fn keyword_tickets(&self, messages: Vec<Message>) -> Vec<Ticket> {
        messages
            .into_iter()
            .map(|message| {
                let result = self.rules.classify(&message.body);
                Ticket::from_triage(message, result)
            })
            .collect()
    }
}

/// Bug and Billing keyword matches are considered unambiguous.
fn is_trusted(keyword: &ClassificationResult) -> bool {
    matches!(keyword.category, Category::Bug | Category::Billing)
}
