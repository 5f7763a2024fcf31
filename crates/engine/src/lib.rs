//! TriageCore Engine
//!
//! Turns one customer support message into a validated triage `Resolution`:
//!
//! 1. Classify the message into intent signals and sentiment
//! 2. Gather evidence from the selected providers, bounded by timeouts
//! 3. Evaluate the policy decision table over the evidence
//! 4. Compile and validate the outgoing resolution
//!
//! The pipeline is deterministic end to end: identical message, evidence,
//! and configuration always produce the same decision fields.

pub mod compiler;
mod engine;
pub mod orchestrator;
pub mod policy;
pub mod providers;
pub mod retrieval;

pub use compiler::{ResolutionCompiler, ResponseComposer, TemplateComposer};
pub use engine::TriageEngine;
pub use orchestrator::ToolOrchestrator;
pub use providers::{CustomerDirectory, KnowledgeIndex, StatusFeed};
pub use retrieval::KnowledgeStore;
