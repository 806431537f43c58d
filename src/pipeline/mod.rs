//! Message triage pipeline.
//!
//! Every inbound support message flows through:
//! 1. `KeywordClassifier::classify()`: ordered substring rules (no I/O)
//! 2. `TriageProcessor::triage()`: escalates ambiguous results to the
//!    configured `RemoteClassifier`
//! 3. `parse_classification()` + `normalize()`: turn whatever the AI said
//!    into a valid `ClassificationResult`
//!
//! **No failure path leaves a message unclassified.**

pub mod normalize;
pub mod parse;
pub mod processor;
pub mod rules;
pub mod types;
