//! Message classification
//!
//! The intent and sentiment classifiers are the pluggable heuristic layer in
//! front of the policy evaluator: the decision table consumes their output
//! and never inspects raw text itself, so a model-backed classifier can be
//! swapped in without touching the table.

mod intent;
mod sentiment;

pub use intent::{IntentClassifier, KeywordIntentClassifier, MessageSignals};
pub use sentiment::{KeywordSentimentClassifier, SentimentClassifier};
