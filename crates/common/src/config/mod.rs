//! Configuration management for TriageCore
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{env}, config/local)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Evidence orchestration configuration
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Knowledge retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Policy evaluator configuration
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Embedding provider configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OrchestratorConfig {
    /// Per-provider call timeout in milliseconds
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout_ms: u64,

    /// Overall evidence-gathering deadline in milliseconds
    #[serde(default = "default_overall_deadline")]
    pub overall_deadline_ms: u64,

    /// Proceed with partial evidence when the overall deadline elapses.
    /// When false, the engine surfaces `EvidenceTimeout` to the caller.
    #[serde(default = "default_proceed_on_partial")]
    pub proceed_on_partial: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    /// Target chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between adjacent chunks in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Minimum chunk size (smaller chunks are dropped)
    #[serde(default = "default_min_chunk_size")]
    pub min_chunk_size: usize,

    /// Snippets returned per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

/// Reference date for the refund eligibility window.
///
/// The upstream policy manual is ambiguous between "initial charge" and
/// "renewal date", so the choice is a parameter rather than a constant.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RefundWindowReference {
    LastCharge,
    LastRenewal,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PolicyConfig {
    /// Refund eligibility window in days
    #[serde(default = "default_refund_window_days")]
    pub refund_window_days: i64,

    /// Which profile timestamp anchors the refund window
    #[serde(default = "default_refund_window_reference")]
    pub refund_window_reference: RefundWindowReference,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    /// Embedding provider: hashing, openai
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    /// API key for remote embedding services
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// Model to use
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Request timeout in seconds
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries
    #[serde(default = "default_embedding_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_provider_timeout() -> u64 { 2000 }
fn default_overall_deadline() -> u64 { 5000 }
fn default_proceed_on_partial() -> bool { true }
fn default_chunk_size() -> usize { 300 }
fn default_chunk_overlap() -> usize { 50 }
fn default_min_chunk_size() -> usize { 40 }
fn default_top_k() -> usize { 3 }
fn default_refund_window_days() -> i64 { 7 }
fn default_refund_window_reference() -> RefundWindowReference { RefundWindowReference::LastCharge }
fn default_embedding_provider() -> String { "hashing".to_string() }
fn default_embedding_model() -> String { "text-embedding-3-small".to_string() }
fn default_embedding_dimension() -> usize { crate::DEFAULT_EMBEDDING_DIMENSION }
fn default_embedding_timeout() -> u64 { 30 }
fn default_embedding_retries() -> u32 { 3 }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_service_name() -> String { "triagecore".to_string() }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__ORCHESTRATOR__OVERALL_DEADLINE_MS=3000
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Per-provider timeout as Duration
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.orchestrator.provider_timeout_ms)
    }

    /// Overall gather deadline as Duration
    pub fn overall_deadline(&self) -> Duration {
        Duration::from_millis(self.orchestrator.overall_deadline_ms)
    }

    /// Refund window as a chrono Duration
    pub fn refund_window(&self) -> chrono::Duration {
        chrono::Duration::days(self.policy.refund_window_days)
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            provider_timeout_ms: default_provider_timeout(),
            overall_deadline_ms: default_overall_deadline(),
            proceed_on_partial: default_proceed_on_partial(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            min_chunk_size: default_min_chunk_size(),
            top_k: default_top_k(),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            refund_window_days: default_refund_window_days(),
            refund_window_reference: default_refund_window_reference(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            api_key: None,
            api_base: None,
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            timeout_secs: default_embedding_timeout(),
            max_retries: default_embedding_retries(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            service_name: default_service_name(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            orchestrator: OrchestratorConfig::default(),
            retrieval: RetrievalConfig::default(),
            policy: PolicyConfig::default(),
            embedding: EmbeddingConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}
