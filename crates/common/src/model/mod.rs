//! Core domain types for ticket triage
//!
//! Everything here is created fresh per incoming message and discarded after
//! the `Resolution` is returned. The field names and enum spellings of
//! `Resolution` are the externally-compatible schema that downstream systems
//! (ticket creation, UI) depend on and must not change shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Subscription plan tier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Free,
    Pro,
    Enterprise,
}

impl PlanTier {
    /// Paid tiers are eligible for the refund-window escalation path
    pub fn is_paid(&self) -> bool {
        !matches!(self, PlanTier::Free)
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanTier::Free => write!(f, "free"),
            PlanTier::Pro => write!(f, "pro"),
            PlanTier::Enterprise => write!(f, "enterprise"),
        }
    }
}

/// Immutable customer snapshot fetched per request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerProfile {
    /// Customer identifier as known to the directory
    pub id: String,

    /// Display name
    pub name: String,

    /// Plan tier
    pub plan: PlanTier,

    /// Home region (free-form, e.g. "Asia", "US")
    pub region: String,

    /// Account age in months
    pub tenure_months: u32,

    /// Timestamp of the most recent charge (refund-window evidence)
    pub last_charge_at: Option<DateTime<Utc>>,

    /// Timestamp of the most recent renewal
    pub last_renewal_at: Option<DateTime<Utc>>,
}

/// Directory lookup outcome. An absent customer is a valid state,
/// not a fatal error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CustomerRecord {
    Found(CustomerProfile),
    NotFound,
}

impl CustomerRecord {
    pub fn profile(&self) -> Option<&CustomerProfile> {
        match self {
            CustomerRecord::Found(p) => Some(p),
            CustomerRecord::NotFound => None,
        }
    }

    /// Plan tier with the conservative default for unknown customers
    pub fn plan_or_default(&self) -> PlanTier {
        self.profile().map(|p| p.plan).unwrap_or(PlanTier::Free)
    }
}

/// Operational state of a service region
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    Operational,
    PartialOutage,
    MajorOutage,
    Unknown,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceState::Operational => write!(f, "operational"),
            ServiceState::PartialOutage => write!(f, "partial_outage"),
            ServiceState::MajorOutage => write!(f, "major_outage"),
            ServiceState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Point-in-time status for one region, derived per request and never
/// cached across requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    /// Normalized region key the feed resolved the lookup to
    pub region: String,

    /// State for that region
    pub state: ServiceState,

    /// Latency indicator, when the feed reports one
    pub latency_ms: Option<u32>,

    /// Human-readable status message
    pub message: String,

    /// Global fallback state
    pub global_state: ServiceState,
}

/// A ranked fragment of indexed reference text relevant to a query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeSnippet {
    /// Fragment text
    pub content: String,

    /// Relevance rank (0 = most relevant)
    pub rank: usize,

    /// Similarity score (0.0 - 1.0)
    pub score: f32,
}

/// Evidence providers the orchestrator can invoke
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    CustomerDirectory,
    StatusFeed,
    KnowledgeIndex,
}

impl Provider {
    /// Canonical tool name used in `executed_tools` and logs. These match the
    /// names downstream systems already key on.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Provider::CustomerDirectory => "get_customer_profile",
            Provider::StatusFeed => "check_system_status",
            Provider::KnowledgeIndex => "search_knowledge_base",
        }
    }

    /// All known providers, in canonical order
    pub fn all() -> [Provider; 3] {
        [
            Provider::CustomerDirectory,
            Provider::StatusFeed,
            Provider::KnowledgeIndex,
        ]
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// How a provider call failed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Provider returned an error
    Unavailable,
    /// Provider exceeded its per-call timeout
    Timeout,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Unavailable => write!(f, "unavailable"),
            FailureKind::Timeout => write!(f, "timeout"),
        }
    }
}

/// A recorded provider failure. Failures are data, not exceptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderFailure {
    pub provider: Provider,
    pub kind: FailureKind,
    pub detail: String,
}

/// Aggregated evidence for one triage call.
///
/// Invariant: a provider appears in exactly one of {queried, failed,
/// not-invoked}. Use `record_success` / `record_failure` to keep it that way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceBundle {
    /// Customer lookup outcome
    pub customer: CustomerRecord,

    /// Status report, when the feed was consulted
    pub status: Option<StatusReport>,

    /// Knowledge matches, empty when the index was not consulted or found
    /// nothing
    pub snippets: Vec<KnowledgeSnippet>,

    /// Providers that completed successfully, in invocation order
    pub queried: Vec<Provider>,

    /// Providers that were invoked but failed
    pub failed: Vec<ProviderFailure>,

    /// Wall-clock time the gather started; the refund window is computed
    /// against this
    pub gathered_at: DateTime<Utc>,

    /// Overall gather deadline elapsed before all lookups finished
    pub deadline_exceeded: bool,
}

impl EvidenceBundle {
    pub fn new(gathered_at: DateTime<Utc>) -> Self {
        Self {
            customer: CustomerRecord::NotFound,
            status: None,
            snippets: Vec::new(),
            queried: Vec::new(),
            failed: Vec::new(),
            gathered_at,
            deadline_exceeded: false,
        }
    }

    /// Record a successful, non-degraded invocation
    pub fn record_success(&mut self, provider: Provider) {
        debug_assert!(!self.was_invoked(provider), "provider recorded twice");
        self.queried.push(provider);
    }

    /// Record a failed invocation
    pub fn record_failure(&mut self, provider: Provider, kind: FailureKind, detail: String) {
        debug_assert!(!self.was_invoked(provider), "provider recorded twice");
        self.failed.push(ProviderFailure {
            provider,
            kind,
            detail,
        });
    }

    pub fn was_invoked(&self, provider: Provider) -> bool {
        self.queried.contains(&provider) || self.failed.iter().any(|f| f.provider == provider)
    }

    /// Region state with the degraded-evidence fallback: a missing or failed
    /// status lookup reads as `Unknown`.
    pub fn service_state(&self) -> ServiceState {
        self.status
            .as_ref()
            .map(|s| s.state)
            .unwrap_or(ServiceState::Unknown)
    }
}

/// Ticket urgency
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Urgency::Low => write!(f, "low"),
            Urgency::Medium => write!(f, "medium"),
            Urgency::High => write!(f, "high"),
            Urgency::Critical => write!(f, "critical"),
        }
    }
}

/// Issue category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IssueType {
    Billing,
    Technical,
    #[serde(rename = "Feature Request")]
    FeatureRequest,
    #[serde(rename = "General Inquiry")]
    GeneralInquiry,
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueType::Billing => write!(f, "Billing"),
            IssueType::Technical => write!(f, "Technical"),
            IssueType::FeatureRequest => write!(f, "Feature Request"),
            IssueType::GeneralInquiry => write!(f, "General Inquiry"),
        }
    }
}

/// Implied customer sentiment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
    Frustrated,
}

impl Sentiment {
    /// Whether the user-facing reply should open with an acknowledgement
    pub fn warrants_empathy(&self) -> bool {
        matches!(self, Sentiment::Negative | Sentiment::Frustrated)
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Neutral => write!(f, "neutral"),
            Sentiment::Negative => write!(f, "negative"),
            Sentiment::Frustrated => write!(f, "frustrated"),
        }
    }
}

/// Recommended next action
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    AutoRespond,
    RouteToSpecialist,
    EscalateToHuman,
}

impl Action {
    /// Actions that hand the ticket to a department
    pub fn requires_department(&self) -> bool {
        !matches!(self, Action::AutoRespond)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::AutoRespond => write!(f, "auto_respond"),
            Action::RouteToSpecialist => write!(f, "route_to_specialist"),
            Action::EscalateToHuman => write!(f, "escalate_to_human"),
        }
    }
}

/// Department a ticket can be handed to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Department {
    Billing,
    Sales,
    Support,
    Engineering,
    Product,
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Department::Billing => write!(f, "Billing"),
            Department::Sales => write!(f, "Sales"),
            Department::Support => write!(f, "Support"),
            Department::Engineering => write!(f, "Engineering"),
            Department::Product => write!(f, "Product"),
        }
    }
}

/// Which decision-matrix rule produced a draft. Drives response templating;
/// listed in precedence order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PolicyRule {
    /// Confirmed major outage or security/data-loss report
    OutageOrSecurity,
    /// Enterprise customer with a technical issue
    EnterpriseTechnical,
    /// Legal threat or bank-dispute language
    LegalDispute,
    /// Refund request on the free plan
    RefundFreePlan,
    /// Paid refund request inside the eligibility window
    RefundWithinWindow,
    /// Paid refund request outside the eligibility window
    RefundOutsideWindow,
    /// Feature request addressed by the knowledge base
    FeatureAddressed,
    /// How-to or inquiry answered from the knowledge base
    KnowledgeAnswer,
    /// No rule matched; hand to a specialist
    Fallback,
}

/// Pre-narrative decision produced by the policy evaluator.
///
/// Invariant: `target_department` is `Some` iff `action` hands the ticket to
/// a department (escalate or route).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDraft {
    pub urgency: Urgency,
    pub issue_type: IssueType,
    pub action: Action,
    pub target_department: Option<Department>,

    /// The rule that fired
    pub rule: PolicyRule,

    /// Short statement of which rule fired and the evidence behind it
    pub rationale: String,
}

impl PolicyDraft {
    /// Cross-field consistency check
    pub fn is_consistent(&self) -> bool {
        self.target_department.is_some() == self.action.requires_department()
    }
}

/// The full externally-visible triage contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub urgency: Urgency,
    pub issue_type: IssueType,
    pub sentiment: Sentiment,
    pub action: Action,
    pub target_department: Option<Department>,

    /// FOR STAFF: concise, fact-based summary of the issue
    pub internal_ticket_note: String,

    /// FOR USER: polite, empathetic response addressing the user directly
    pub user_response: String,

    /// Exact tool names invoked successfully, in invocation order,
    /// duplicate-free
    pub executed_tools: Vec<String>,

    /// Concise summary of the logic used to make the decision
    pub reasoning_trace: String,
}
