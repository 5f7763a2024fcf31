//! Error types for TriageCore
//!
//! Provides:
//! - Distinct error types for the engine's failure taxonomy
//! - Machine-readable error codes for host handling
//! - A shared `Result` alias
//!
//! Provider failures never surface here from the orchestrator; they are
//! captured as data in `EvidenceBundle.failed`. The variants below are for
//! conditions the caller must decide on.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Provider;

/// Result type alias using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Evidence errors (1xxx)
    ProviderUnavailable,
    EvidenceTimeout,

    // Contract errors (2xxx)
    SchemaViolation,

    // Internal errors (9xxx)
    ConfigurationError,
    EmbeddingError,
    InternalError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ProviderUnavailable => 1001,
            ErrorCode::EvidenceTimeout => 1002,
            ErrorCode::SchemaViolation => 2001,
            ErrorCode::ConfigurationError => 9001,
            ErrorCode::EmbeddingError => 9002,
            ErrorCode::InternalError => 9003,
        }
    }
}

/// Engine error taxonomy
#[derive(Error, Debug)]
pub enum EngineError {
    /// Recoverable: a single evidence provider could not be reached. The
    /// orchestrator degrades this into bundle data; it only escapes through
    /// adapters used outside the orchestrator.
    #[error("provider {provider} unavailable: {detail}")]
    ProviderUnavailable { provider: Provider, detail: String },

    /// Recoverable: the overall evidence deadline elapsed. The caller decides
    /// whether to proceed with partial evidence or abort.
    #[error("evidence gathering exceeded {deadline_ms}ms deadline")]
    EvidenceTimeout { deadline_ms: u64 },

    /// Fatal: a compiled resolution violated a cross-field constraint. This
    /// signals a gap in the policy table, never a runtime condition to
    /// swallow.
    #[error("schema violation: {detail}")]
    SchemaViolation { detail: String },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("embedding error: {message}")]
    Embedding { message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Wraps any unhandled failure, surfaced as a single opaque error
    // with detail
    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl EngineError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::ProviderUnavailable { .. } => ErrorCode::ProviderUnavailable,
            EngineError::EvidenceTimeout { .. } => ErrorCode::EvidenceTimeout,
            EngineError::SchemaViolation { .. } => ErrorCode::SchemaViolation,
            EngineError::Configuration { .. } => ErrorCode::ConfigurationError,
            EngineError::Embedding { .. } => ErrorCode::EmbeddingError,
            EngineError::Serialization(_) | EngineError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Recoverable errors can be degraded into evidence data; fatal ones must
    /// propagate to the host.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::ProviderUnavailable { .. } | EngineError::EvidenceTimeout { .. }
        )
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Internal(err.into())
    }
}
