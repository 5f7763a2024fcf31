//! TriageCore Common Library
//!
//! Shared code for the triage engine including:
//! - Domain model and resolution schema
//! - Error types and handling
//! - Configuration management
//! - Intent and sentiment classifiers
//! - Embedding client abstraction
//! - Metrics naming and tracing setup

pub mod classify;
pub mod config;
pub mod embeddings;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod telemetry;

// Re-export commonly used types
pub use config::AppConfig;
pub use embeddings::Embedder;
pub use errors::{EngineError, Result};
pub use model::{EvidenceBundle, PolicyDraft, Resolution};

/// Default embedding dimension for the local hashing embedder
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 256;
