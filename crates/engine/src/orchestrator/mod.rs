//! Evidence orchestration
//!
//! Fans out to the evidence providers selected by the message signals,
//! bounded by a per-provider timeout and an overall gather deadline. Provider
//! failures are recorded in the bundle and never abort the gather; the policy
//! evaluator decides with whatever evidence arrived.

use metrics::counter;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{timeout, timeout_at, Duration, Instant};
use tracing::{debug, warn};
use triagecore_common::classify::MessageSignals;
use triagecore_common::config::AppConfig;
use triagecore_common::metrics::provider_failures_total;
use triagecore_common::model::{EvidenceBundle, FailureKind, Provider};

use crate::providers::{CustomerDirectory, KnowledgeIndex, StatusFeed};

/// Region queried when the message names none. The feed resolves it to the
/// global fallback state.
const DEFAULT_REGION: &str = "global";

type ProviderOutcome<T> = std::result::Result<T, (FailureKind, String)>;

/// Outcome of draining one provider task against the shared deadline
enum Drained<T> {
    Value(T),
    Failed(FailureKind, String),
    DeadlineElapsed,
}

/// Coordinates evidence gathering for one triage call.
///
/// The customer directory is always consulted; the status feed and knowledge
/// index only when the message signals warrant it. Selected providers run
/// concurrently.
pub struct ToolOrchestrator {
    directory: Arc<dyn CustomerDirectory>,
    status: Arc<dyn StatusFeed>,
    knowledge: Arc<dyn KnowledgeIndex>,
    provider_timeout: Duration,
    overall_deadline: Duration,
    top_k: usize,
}

impl ToolOrchestrator {
    pub fn new(
        directory: Arc<dyn CustomerDirectory>,
        status: Arc<dyn StatusFeed>,
        knowledge: Arc<dyn KnowledgeIndex>,
        config: &AppConfig,
    ) -> Self {
        Self {
            directory,
            status,
            knowledge,
            provider_timeout: config.provider_timeout(),
            overall_deadline: config.overall_deadline(),
            top_k: config.retrieval.top_k,
        }
    }

    /// Gather evidence for one message. Infallible by construction: provider
    /// errors and timeouts become recorded failures, and an elapsed overall
    /// deadline sets `deadline_exceeded` on the returned bundle.
    pub async fn gather(
        &self,
        customer_id: &str,
        message: &str,
        signals: &MessageSignals,
    ) -> EvidenceBundle {
        let deadline = Instant::now() + self.overall_deadline;
        let mut bundle = EvidenceBundle::new(chrono::Utc::now());

        let directory_task = self.spawn_directory(customer_id);
        let status_task = signals
            .wants_status_check()
            .then(|| self.spawn_status(signals));
        let knowledge_task = signals
            .wants_knowledge_lookup()
            .then(|| self.spawn_knowledge(message));

        match drain(directory_task, deadline).await {
            Drained::Value(record) => {
                bundle.customer = record;
                bundle.record_success(Provider::CustomerDirectory);
            }
            Drained::Failed(kind, detail) => {
                record_failure(&mut bundle, Provider::CustomerDirectory, kind, detail);
            }
            Drained::DeadlineElapsed => {
                record_deadline(&mut bundle, Provider::CustomerDirectory);
            }
        }

        if let Some(task) = status_task {
            match drain(task, deadline).await {
                Drained::Value(report) => {
                    bundle.status = Some(report);
                    bundle.record_success(Provider::StatusFeed);
                }
                Drained::Failed(kind, detail) => {
                    record_failure(&mut bundle, Provider::StatusFeed, kind, detail);
                }
                Drained::DeadlineElapsed => {
                    record_deadline(&mut bundle, Provider::StatusFeed);
                }
            }
        }

        if let Some(task) = knowledge_task {
            match drain(task, deadline).await {
                Drained::Value(snippets) => {
                    bundle.snippets = snippets;
                    bundle.record_success(Provider::KnowledgeIndex);
                }
                Drained::Failed(kind, detail) => {
                    record_failure(&mut bundle, Provider::KnowledgeIndex, kind, detail);
                }
                Drained::DeadlineElapsed => {
                    record_deadline(&mut bundle, Provider::KnowledgeIndex);
                }
            }
        }

        debug!(
            queried = bundle.queried.len(),
            failed = bundle.failed.len(),
            deadline_exceeded = bundle.deadline_exceeded,
            "Evidence gather complete"
        );
        bundle
    }

    fn spawn_directory(&self, customer_id: &str) -> JoinHandle<ProviderOutcome<triagecore_common::model::CustomerRecord>> {
        let directory = Arc::clone(&self.directory);
        let customer_id = customer_id.to_string();
        let per_call = self.provider_timeout;
        tokio::spawn(async move {
            bound(per_call, directory.lookup(&customer_id)).await
        })
    }

    fn spawn_status(&self, signals: &MessageSignals) -> JoinHandle<ProviderOutcome<triagecore_common::model::StatusReport>> {
        let feed = Arc::clone(&self.status);
        let region = signals
            .region_hint
            .clone()
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        let per_call = self.provider_timeout;
        tokio::spawn(async move { bound(per_call, feed.check(&region)).await })
    }

    fn spawn_knowledge(&self, message: &str) -> JoinHandle<ProviderOutcome<Vec<triagecore_common::model::KnowledgeSnippet>>> {
        let index = Arc::clone(&self.knowledge);
        let query = message.to_string();
        let k = self.top_k;
        let per_call = self.provider_timeout;
        tokio::spawn(async move { bound(per_call, index.search(&query, k)).await })
    }
}

/// Apply the per-provider timeout to one call
async fn bound<T, F>(per_call: Duration, call: F) -> ProviderOutcome<T>
where
    F: std::future::Future<Output = triagecore_common::errors::Result<T>>,
{
    match timeout(per_call, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err((FailureKind::Unavailable, e.to_string())),
        Err(_) => Err((
            FailureKind::Timeout,
            format!("no reply within {}ms", per_call.as_millis()),
        )),
    }
}

/// Await one provider task up to the shared deadline, aborting it if the
/// deadline elapses first.
async fn drain<T: Send + 'static>(
    mut handle: JoinHandle<ProviderOutcome<T>>,
    deadline: Instant,
) -> Drained<T> {
    match timeout_at(deadline, &mut handle).await {
        Ok(Ok(Ok(value))) => Drained::Value(value),
        Ok(Ok(Err((kind, detail)))) => Drained::Failed(kind, detail),
        Ok(Err(join_error)) => Drained::Failed(
            FailureKind::Unavailable,
            format!("provider task aborted: {}", join_error),
        ),
        Err(_) => {
            handle.abort();
            Drained::DeadlineElapsed
        }
    }
}

fn record_failure(bundle: &mut EvidenceBundle, provider: Provider, kind: FailureKind, detail: String) {
    warn!(provider = %provider, kind = %kind, detail = %detail, "Evidence provider failed");
    counter!(
        provider_failures_total(),
        "provider" => provider.wire_name(),
        "kind" => kind.to_string()
    )
    .increment(1);
    bundle.record_failure(provider, kind, detail);
}

fn record_deadline(bundle: &mut EvidenceBundle, provider: Provider) {
    bundle.deadline_exceeded = true;
    record_failure(
        bundle,
        provider,
        FailureKind::Timeout,
        "overall evidence deadline elapsed".to_string(),
    );
}
