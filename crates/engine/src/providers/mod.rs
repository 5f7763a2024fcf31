//! Evidence provider interfaces and in-memory adapters
//!
//! The engine consumes three abstract providers; it never implements the real
//! backing services. The in-memory adapters here seed the demo dataset and
//! back the test suite.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use triagecore_common::errors::Result;
use triagecore_common::model::{
    CustomerProfile, CustomerRecord, KnowledgeSnippet, PlanTier, ServiceState, StatusReport,
};

/// Customer directory lookup
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// Look up a customer. An unknown id is `CustomerRecord::NotFound`, not
    /// an error; `Err` means the directory itself was unreachable.
    async fn lookup(&self, customer_id: &str) -> Result<CustomerRecord>;
}

/// Live system status feed
#[async_trait]
pub trait StatusFeed: Send + Sync {
    /// Check status for a free-form region mention. Unknown regions resolve
    /// to `ServiceState::Unknown`, never an error.
    async fn check(&self, region: &str) -> Result<StatusReport>;
}

/// Indexed knowledge corpus
#[async_trait]
pub trait KnowledgeIndex: Send + Sync {
    /// Return the top-k most relevant snippets. An empty or unavailable
    /// corpus yields an empty sequence.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<KnowledgeSnippet>>;
}

/// Map free-form region mentions onto internal region keys.
/// Unrecognized input returns `None`; the feed then falls back to the
/// global state.
pub fn normalize_region(input: &str) -> Option<&'static str> {
    let region = input.to_lowercase();
    if region.contains("asia") || region.contains("thailand") || region.contains("pacific") {
        Some("asia-pacific")
    } else if region.contains("us") || region.contains("america") {
        Some("us-east")
    } else if region.contains("eu") || region.contains("europe") {
        Some("eu-west")
    } else {
        None
    }
}

/// In-memory customer directory
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    customers: HashMap<String, CustomerProfile>,
}

impl InMemoryDirectory {
    pub fn new(customers: impl IntoIterator<Item = CustomerProfile>) -> Self {
        Self {
            customers: customers.into_iter().map(|c| (c.id.clone(), c)).collect(),
        }
    }

    /// Demo directory: one customer per plan tier
    pub fn with_demo_data() -> Self {
        let now = Utc::now();
        Self::new([
            CustomerProfile {
                id: "cust_01".into(),
                name: "Sarah Jenkins".into(),
                plan: PlanTier::Free,
                region: "US".into(),
                tenure_months: 4,
                last_charge_at: None,
                last_renewal_at: None,
            },
            CustomerProfile {
                id: "cust_02".into(),
                name: "TechFlow Enterprise Ltd.".into(),
                plan: PlanTier::Enterprise,
                region: "Asia".into(),
                tenure_months: 24,
                last_charge_at: Some(now - Duration::days(20)),
                last_renewal_at: Some(now - Duration::days(20)),
            },
            CustomerProfile {
                id: "cust_03".into(),
                name: "John Doe".into(),
                plan: PlanTier::Pro,
                region: "EU".into(),
                tenure_months: 12,
                last_charge_at: Some(now - Duration::days(3)),
                last_renewal_at: Some(now - Duration::days(3)),
            },
        ])
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryDirectory {
    async fn lookup(&self, customer_id: &str) -> Result<CustomerRecord> {
        Ok(self
            .customers
            .get(customer_id)
            .cloned()
            .map(CustomerRecord::Found)
            .unwrap_or(CustomerRecord::NotFound))
    }
}

/// Per-region entry in the static feed
#[derive(Debug, Clone)]
pub struct RegionStatus {
    pub state: ServiceState,
    pub latency_ms: u32,
    pub message: String,
}

/// Static status feed backed by a fixed region table
#[derive(Debug)]
pub struct StaticStatusFeed {
    regions: HashMap<&'static str, RegionStatus>,
    global_state: ServiceState,
}

impl StaticStatusFeed {
    pub fn new(
        regions: HashMap<&'static str, RegionStatus>,
        global_state: ServiceState,
    ) -> Self {
        Self {
            regions,
            global_state,
        }
    }

    /// Demo feed: us-east and eu-west healthy, asia-pacific in a major outage
    pub fn with_demo_data() -> Self {
        let mut regions = HashMap::new();
        regions.insert(
            "us-east",
            RegionStatus {
                state: ServiceState::Operational,
                latency_ms: 45,
                message: "All systems functioning normally.".into(),
            },
        );
        regions.insert(
            "eu-west",
            RegionStatus {
                state: ServiceState::Operational,
                latency_ms: 60,
                message: "All systems functioning normally.".into(),
            },
        );
        regions.insert(
            "asia-pacific",
            RegionStatus {
                state: ServiceState::MajorOutage,
                latency_ms: 5000,
                message: "CRITICAL: High rate of 500 Internal Server Errors detected in Bangkok and Singapore nodes.".into(),
            },
        );
        Self::new(regions, ServiceState::PartialOutage)
    }
}

#[async_trait]
impl StatusFeed for StaticStatusFeed {
    async fn check(&self, region: &str) -> Result<StatusReport> {
        let report = match normalize_region(region).and_then(|key| {
            self.regions.get(key).map(|status| (key, status))
        }) {
            Some((key, status)) => StatusReport {
                region: key.to_string(),
                state: status.state,
                latency_ms: Some(status.latency_ms),
                message: status.message.clone(),
                global_state: self.global_state,
            },
            None => StatusReport {
                region: region.to_string(),
                state: ServiceState::Unknown,
                latency_ms: None,
                message: format!(
                    "Status unknown for this region (global status: {})",
                    self.global_state
                ),
                global_state: self.global_state,
            },
        };

        tracing::debug!(region = %report.region, state = %report.state, "Status feed consulted");
        Ok(report)
    }
}
