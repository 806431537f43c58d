//! Keyword rules engine: the fast, deterministic classifier.
//!
//! Runs on every message before any AI call:
//! - category rules are tested in order, first match wins (Bug, Billing,
//!   Feature Request; otherwise General)
//! - priority phrases are tested in order, first match wins (High, Low;
//!   otherwise Medium)
//! - the category then overrides the priority: Bug and Billing are always
//!   High, Feature Request is always Low, General keeps the phrase result
//!
//! Matching is plain substring search over the lower-cased text.

use std::sync::LazyLock;

use tracing::debug;

use crate::pipeline::types::{Category, ClassificationResult, Priority};

/// A category rule: any keyword present assigns the category.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub category: Category,
    pub keywords: Vec<String>,
}

/// A priority rule: any phrase present assigns the priority.
#[derive(Debug, Clone)]
pub struct PriorityRule {
    pub priority: Priority,
    pub phrases: Vec<String>,
}

/// Keyword classifier over ordered substring rules.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    category_rules: Vec<CategoryRule>,
    priority_rules: Vec<PriorityRule>,
}

static DEFAULT_CLASSIFIER: LazyLock<KeywordClassifier> =
    LazyLock::new(KeywordClassifier::default_rules);

/// Classify with the default rule set.
pub fn classify_keywords(text: &str) -> ClassificationResult {
    DEFAULT_CLASSIFIER.classify(text)
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl KeywordClassifier {
    /// Create a classifier with the standard support-desk rules.
    pub fn default_rules() -> Self {
        let category_rules = vec![
            CategoryRule {
                category: Category::Bug,
                keywords: words(&[
                    "crash",
                    "error",
                    "bug",
                    "not working",
                    "broken",
                    "fail",
                    "issue",
                    "problem",
                ]),
            },
            CategoryRule {
                category: Category::Billing,
                keywords: words(&[
                    "invoice", "charge", "bill", "payment", "price", "cost", "refund", "deduct",
                ]),
            },
            CategoryRule {
                category: Category::FeatureRequest,
                keywords: words(&[
                    "feature",
                    "add",
                    "request",
                    "suggest",
                    "would like",
                    "could you",
                    "wish",
                    "integration",
                ]),
            },
        ];

        let priority_rules = vec![
            PriorityRule {
                priority: Priority::High,
                phrases: words(&[
                    "urgent",
                    "asap",
                    "emergency",
                    "immediately",
                    "critical",
                    "right away",
                ]),
            },
            PriorityRule {
                priority: Priority::Low,
                phrases: words(&[
                    "when you have time",
                    "no rush",
                    "low priority",
                    "whenever",
                    "suggestion",
                    "nice to have",
                ]),
            },
        ];

        Self {
            category_rules,
            priority_rules,
        }
    }

    /// Create a classifier with no rules (everything is General/Medium).
    pub fn empty() -> Self {
        Self {
            category_rules: Vec::new(),
            priority_rules: Vec::new(),
        }
    }

    /// Classify a message body. Total: never fails, no I/O.
    pub fn classify(&self, text: &str) -> ClassificationResult {
        let lower = text.to_lowercase();

        let category = self
            .category_rules
            .iter()
            .find(|rule| rule.keywords.iter().any(|k| lower.contains(k.as_str())))
            .map(|rule| rule.category)
            .unwrap_or(Category::General);

        let phrase_priority = self
            .priority_rules
            .iter()
            .find(|rule| rule.phrases.iter().any(|p| lower.contains(p.as_str())))
            .map(|rule| rule.priority)
            .unwrap_or(Priority::Medium);

        // Category wins over any priority phrase.
        let priority = match category {
            Category::Bug | Category::Billing => Priority::High,
            Category::FeatureRequest => Priority::Low,
            Category::General => phrase_priority,
        };

        debug!(
            category = %category,
            priority = %priority,
            phrase_priority = %phrase_priority,
            "Keyword classification"
        );

        ClassificationResult { category, priority }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::default_rules()
    }
}
