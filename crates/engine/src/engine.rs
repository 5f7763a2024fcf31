//! Engine facade
//!
//! `TriageEngine` owns the full pipeline for one message: classify, gather
//! evidence, evaluate policy, compile the resolution. Engines are cheap to
//! share behind an `Arc` and hold no per-request state.

use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};
use uuid::Uuid;

use triagecore_common::classify::{
    IntentClassifier, KeywordIntentClassifier, KeywordSentimentClassifier, SentimentClassifier,
};
use triagecore_common::config::AppConfig;
use triagecore_common::embeddings::create_embedder;
use triagecore_common::errors::{EngineError, Result};
use triagecore_common::metrics::{triage_duration_seconds, triage_requests_total};
use triagecore_common::model::Resolution;

use crate::compiler::ResolutionCompiler;
use crate::orchestrator::ToolOrchestrator;
use crate::policy::{decide, PolicyContext};
use crate::providers::{CustomerDirectory, InMemoryDirectory, KnowledgeIndex, StaticStatusFeed, StatusFeed};
use crate::retrieval::KnowledgeStore;

/// The triage pipeline, assembled once and reused across requests
pub struct TriageEngine {
    config: Arc<AppConfig>,
    orchestrator: ToolOrchestrator,
    intent: Box<dyn IntentClassifier>,
    sentiment: Box<dyn SentimentClassifier>,
    compiler: ResolutionCompiler,
}

impl TriageEngine {
    /// Assemble an engine over the given providers with the default keyword
    /// classifiers and template composer.
    pub fn new(
        config: Arc<AppConfig>,
        directory: Arc<dyn CustomerDirectory>,
        status: Arc<dyn StatusFeed>,
        knowledge: Arc<dyn KnowledgeIndex>,
    ) -> Self {
        let orchestrator = ToolOrchestrator::new(directory, status, knowledge, &config);
        Self {
            config,
            orchestrator,
            intent: Box::new(KeywordIntentClassifier),
            sentiment: Box::new(KeywordSentimentClassifier),
            compiler: ResolutionCompiler::default(),
        }
    }

    /// Engine over the built-in demo dataset: in-memory directory, static
    /// status feed, and the bundled knowledge corpus.
    pub fn with_demo_providers(config: Arc<AppConfig>) -> Result<Self> {
        let embedder = create_embedder(&config.embedding)?;
        let knowledge = Arc::new(KnowledgeStore::with_demo_corpus(
            config.retrieval.clone(),
            embedder,
        ));
        Ok(Self::new(
            config,
            Arc::new(InMemoryDirectory::with_demo_data()),
            Arc::new(StaticStatusFeed::with_demo_data()),
            knowledge,
        ))
    }

    /// Swap in a different intent classifier
    pub fn with_intent_classifier(mut self, intent: Box<dyn IntentClassifier>) -> Self {
        self.intent = intent;
        self
    }

    /// Swap in a different sentiment classifier
    pub fn with_sentiment_classifier(mut self, sentiment: Box<dyn SentimentClassifier>) -> Self {
        self.sentiment = sentiment;
        self
    }

    /// Swap in a different resolution compiler
    pub fn with_compiler(mut self, compiler: ResolutionCompiler) -> Self {
        self.compiler = compiler;
        self
    }

    /// Triage one customer message into a validated `Resolution`.
    ///
    /// Fails only on an internal fault: an elapsed evidence deadline when
    /// partial evidence is disallowed, or a compiled resolution that breaks
    /// the schema. Degraded evidence alone never fails a call.
    #[instrument(skip_all, fields(request_id = %Uuid::new_v4(), customer_id = %customer_id))]
    pub async fn triage(&self, customer_id: &str, message: &str) -> Result<Resolution> {
        let started = Instant::now();
        counter!(triage_requests_total()).increment(1);

        let signals = self.intent.classify(message);
        let sentiment = self.sentiment.classify(message);

        let bundle = self.orchestrator.gather(customer_id, message, &signals).await;
        if bundle.deadline_exceeded && !self.config.orchestrator.proceed_on_partial {
            return Err(EngineError::EvidenceTimeout {
                deadline_ms: self.config.orchestrator.overall_deadline_ms,
            });
        }

        let ctx = PolicyContext::from_config(&self.config, bundle.gathered_at);
        let draft = decide(&signals, &bundle, &ctx);
        let resolution = self.compiler.compile(draft, sentiment, &bundle)?;

        histogram!(triage_duration_seconds()).record(started.elapsed().as_secs_f64());
        info!(
            action = %resolution.action,
            urgency = %resolution.urgency,
            issue_type = %resolution.issue_type,
            tools = resolution.executed_tools.len(),
            "Message triaged"
        );
        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use triagecore_common::model::{
        Action, CustomerRecord, Department, IssueType, Sentiment, Urgency,
    };

    fn demo_engine() -> TriageEngine {
        TriageEngine::with_demo_providers(Arc::new(AppConfig::default())).unwrap()
    }

    #[tokio::test]
    async fn test_outage_report_escalates_to_engineering() {
        let engine = demo_engine();
        let resolution = engine
            .triage(
                "cust_02",
                "Our whole team in Thailand is getting Error 500, the app is down!",
            )
            .await
            .unwrap();

        assert_eq!(resolution.urgency, Urgency::Critical);
        assert_eq!(resolution.action, Action::EscalateToHuman);
        assert_eq!(resolution.target_department, Some(Department::Engineering));
        assert!(resolution
            .executed_tools
            .contains(&"get_customer_profile".to_string()));
        assert!(resolution
            .executed_tools
            .contains(&"check_system_status".to_string()));
    }

    #[tokio::test]
    async fn test_pro_refund_within_window_goes_to_billing() {
        // Demo customer cust_03 was charged 3 days ago
        let engine = demo_engine();
        let resolution = engine
            .triage("cust_03", "I would like a refund for my last charge")
            .await
            .unwrap();

        assert_eq!(resolution.action, Action::EscalateToHuman);
        assert_eq!(resolution.target_department, Some(Department::Billing));
        assert_eq!(resolution.issue_type, IssueType::Billing);
    }

    #[tokio::test]
    async fn test_free_plan_refund_is_auto_answered() {
        let engine = demo_engine();
        let resolution = engine
            .triage("cust_01", "Can I get a refund please?")
            .await
            .unwrap();

        assert_eq!(resolution.action, Action::AutoRespond);
        assert_eq!(resolution.target_department, None);
        assert_eq!(resolution.urgency, Urgency::Low);

        // Wire shape stays stable for downstream consumers
        let json = serde_json::to_value(&resolution).unwrap();
        assert_eq!(json["action"], "auto_respond");
        assert!(json["target_department"].is_null());
    }

    #[tokio::test]
    async fn test_unknown_customer_still_resolves() {
        let engine = demo_engine();
        let resolution = engine
            .triage("cust_99", "How do I enable dark mode?")
            .await
            .unwrap();

        assert_eq!(resolution.action, Action::AutoRespond);
        assert!(resolution.user_response.to_lowercase().contains("dark"));
    }

    #[tokio::test]
    async fn test_frustrated_tone_shapes_reply_not_decision() {
        let engine = demo_engine();
        let calm = engine
            .triage("cust_01", "Can I get a refund please?")
            .await
            .unwrap();
        let angry = engine
            .triage("cust_01", "This is RIDICULOUS, I demand a refund right now!!")
            .await
            .unwrap();

        assert_eq!(calm.action, angry.action);
        assert_eq!(calm.urgency, angry.urgency);
        assert_eq!(angry.sentiment, Sentiment::Frustrated);
        assert!(angry.user_response.starts_with("I'm sorry"));
    }

    #[tokio::test]
    async fn test_identical_input_gives_identical_decision() {
        let engine = demo_engine();
        let message = "I want a refund for the outage, how do I claim it?";

        let first = engine.triage("cust_03", message).await.unwrap();
        let second = engine.triage("cust_03", message).await.unwrap();

        assert_eq!(first.action, second.action);
        assert_eq!(first.urgency, second.urgency);
        assert_eq!(first.issue_type, second.issue_type);
        assert_eq!(first.target_department, second.target_department);
        assert_eq!(first.executed_tools, second.executed_tools);
    }

    struct StalledDirectory;

    #[async_trait]
    impl CustomerDirectory for StalledDirectory {
        async fn lookup(&self, _customer_id: &str) -> triagecore_common::errors::Result<CustomerRecord> {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            Ok(CustomerRecord::NotFound)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_strict_deadline_surfaces_timeout() {
        let mut config = AppConfig::default();
        // Per-call budget above the overall deadline so the shared deadline
        // is what fires
        config.orchestrator.provider_timeout_ms = 10_000;
        config.orchestrator.overall_deadline_ms = 100;
        config.orchestrator.proceed_on_partial = false;

        let config = Arc::new(config);
        let embedder = create_embedder(&config.embedding).unwrap();
        let knowledge = Arc::new(KnowledgeStore::with_demo_corpus(
            config.retrieval.clone(),
            embedder,
        ));
        let engine = TriageEngine::new(
            Arc::clone(&config),
            Arc::new(StalledDirectory),
            Arc::new(StaticStatusFeed::with_demo_data()),
            knowledge,
        );

        let result = engine.triage("cust_01", "hello").await;
        assert!(matches!(
            result,
            Err(EngineError::EvidenceTimeout { deadline_ms: 100 })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lenient_deadline_decides_on_partial_evidence() {
        let mut config = AppConfig::default();
        config.orchestrator.provider_timeout_ms = 10_000;
        config.orchestrator.overall_deadline_ms = 100;
        config.orchestrator.proceed_on_partial = true;

        let config = Arc::new(config);
        let embedder = create_embedder(&config.embedding).unwrap();
        let knowledge = Arc::new(KnowledgeStore::with_demo_corpus(
            config.retrieval.clone(),
            embedder,
        ));
        let engine = TriageEngine::new(
            Arc::clone(&config),
            Arc::new(StalledDirectory),
            Arc::new(StaticStatusFeed::with_demo_data()),
            knowledge,
        );

        let resolution = engine.triage("cust_01", "hello").await.unwrap();
        // Directory never answered, so the lookup cannot appear as executed
        assert!(!resolution
            .executed_tools
            .contains(&"get_customer_profile".to_string()));
        assert!(resolution.reasoning_trace.contains("deadline"));
    }
}
