//! Policy evaluator
//!
//! A pure decision table mapping gathered evidence and message signals to a
//! `PolicyDraft`. Rules are evaluated in precedence order, first match wins,
//! and the function is total over any valid evidence bundle: degraded
//! evidence falls through to lower-precedence rules, it never aborts a
//! decision.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use triagecore_common::classify::MessageSignals;
use triagecore_common::config::{AppConfig, RefundWindowReference};
use triagecore_common::model::{
    Action, CustomerProfile, Department, EvidenceBundle, IssueType, PlanTier, PolicyDraft,
    PolicyRule, ServiceState, Urgency,
};

/// Per-request policy parameters. `now` is captured once per request
/// (the bundle's gather time), so the refund window is stable within a call.
#[derive(Debug, Clone)]
pub struct PolicyContext {
    pub now: DateTime<Utc>,
    pub refund_window: Duration,
    pub window_reference: RefundWindowReference,
}

impl PolicyContext {
    pub fn from_config(config: &AppConfig, now: DateTime<Utc>) -> Self {
        Self {
            now,
            refund_window: config.refund_window(),
            window_reference: config.policy.refund_window_reference,
        }
    }
}

/// Issue category from topical signals. Billing and Technical take precedence
/// over the softer categories when a message is ambiguous.
fn derive_issue_type(signals: &MessageSignals, state: ServiceState) -> IssueType {
    if signals.security || state == ServiceState::MajorOutage {
        IssueType::Technical
    } else if signals.billing {
        IssueType::Billing
    } else if signals.technical {
        IssueType::Technical
    } else if signals.feature_request {
        IssueType::FeatureRequest
    } else {
        IssueType::GeneralInquiry
    }
}

fn refund_reference(
    profile: &CustomerProfile,
    reference: RefundWindowReference,
) -> Option<DateTime<Utc>> {
    match reference {
        RefundWindowReference::LastCharge => profile.last_charge_at,
        RefundWindowReference::LastRenewal => profile.last_renewal_at,
    }
}

/// Map evidence and signals to a draft decision.
///
/// Deterministic and side-effect free: identical inputs always produce an
/// identical draft.
pub fn decide(
    signals: &MessageSignals,
    evidence: &EvidenceBundle,
    ctx: &PolicyContext,
) -> PolicyDraft {
    let plan = evidence.customer.plan_or_default();
    let customer_known = evidence.customer.profile().is_some();
    let state = evidence.service_state();
    let issue_type = derive_issue_type(signals, state);

    let plan_note = if customer_known {
        format!("plan={}", plan)
    } else {
        "customer not found, defaulting to plan=free".to_string()
    };

    let draft = evaluate_rules(signals, evidence, ctx, plan, state, issue_type, &plan_note);
    debug!(rule = ?draft.rule, action = %draft.action, urgency = %draft.urgency, "Policy decision");
    draft
}

#[allow(clippy::too_many_arguments)]
fn evaluate_rules(
    signals: &MessageSignals,
    evidence: &EvidenceBundle,
    ctx: &PolicyContext,
    plan: PlanTier,
    state: ServiceState,
    issue_type: IssueType,
    plan_note: &str,
) -> PolicyDraft {
    // Rule 1: confirmed major outage or security/data-loss report.
    // Always wins, even over refund requests.
    if state == ServiceState::MajorOutage || signals.security {
        let trigger = if state == ServiceState::MajorOutage {
            let region = evidence
                .status
                .as_ref()
                .map(|s| s.region.as_str())
                .unwrap_or("unknown");
            format!("status=major_outage in {}", region)
        } else {
            "security/data-loss language in message".to_string()
        };
        return PolicyDraft {
            urgency: Urgency::Critical,
            issue_type: IssueType::Technical,
            action: Action::EscalateToHuman,
            target_department: Some(Department::Engineering),
            rule: PolicyRule::OutageOrSecurity,
            rationale: format!("{}; takes precedence over all other rules ({})", trigger, plan_note),
        };
    }

    // Rule 2: enterprise technical issues and legal/bank-dispute language
    if plan == PlanTier::Enterprise && signals.technical {
        return PolicyDraft {
            urgency: Urgency::High,
            issue_type: IssueType::Technical,
            action: Action::EscalateToHuman,
            target_department: Some(Department::Engineering),
            rule: PolicyRule::EnterpriseTechnical,
            rationale: format!("technical issue reported on {}", plan_note),
        };
    }
    if signals.legal_dispute {
        return PolicyDraft {
            urgency: Urgency::High,
            issue_type: IssueType::Billing,
            action: Action::EscalateToHuman,
            target_department: Some(Department::Billing),
            rule: PolicyRule::LegalDispute,
            rationale: format!("legal threat or bank-dispute language ({})", plan_note),
        };
    }

    // Rules 3-4: refund requests by plan and eligibility window
    if signals.refund {
        if plan == PlanTier::Free {
            return PolicyDraft {
                urgency: Urgency::Low,
                issue_type: IssueType::Billing,
                action: Action::AutoRespond,
                target_department: None,
                rule: PolicyRule::RefundFreePlan,
                rationale: format!("refund request on {}; free tier is not refundable", plan_note),
            };
        }

        let escalation_urgency = if plan == PlanTier::Enterprise {
            Urgency::High
        } else {
            Urgency::Medium
        };

        let reference = evidence
            .customer
            .profile()
            .and_then(|p| refund_reference(p, ctx.window_reference));

        return match reference {
            Some(reference_at) => {
                let elapsed = ctx.now - reference_at;
                if elapsed <= ctx.refund_window {
                    PolicyDraft {
                        urgency: escalation_urgency,
                        issue_type: IssueType::Billing,
                        action: Action::EscalateToHuman,
                        target_department: Some(Department::Billing),
                        rule: PolicyRule::RefundWithinWindow,
                        rationale: format!(
                            "refund requested {} day(s) after charge, within the {}-day window ({})",
                            elapsed.num_days(),
                            ctx.refund_window.num_days(),
                            plan_note
                        ),
                    }
                } else {
                    PolicyDraft {
                        urgency: Urgency::Medium,
                        issue_type: IssueType::Billing,
                        action: Action::AutoRespond,
                        target_department: None,
                        rule: PolicyRule::RefundOutsideWindow,
                        rationale: format!(
                            "refund requested {} day(s) after charge, outside the {}-day window ({})",
                            elapsed.num_days(),
                            ctx.refund_window.num_days(),
                            plan_note
                        ),
                    }
                }
            }
            // No reference timestamp on file: let a human verify rather
            // than auto-deny a paid customer
            None => PolicyDraft {
                urgency: escalation_urgency,
                issue_type: IssueType::Billing,
                action: Action::EscalateToHuman,
                target_department: Some(Department::Billing),
                rule: PolicyRule::RefundWithinWindow,
                rationale: format!(
                    "refund request on {} with no charge timestamp on file; escalating for manual verification",
                    plan_note
                ),
            },
        };
    }

    // Rule 5: feature request the knowledge base already addresses
    if signals.feature_request && !evidence.snippets.is_empty() {
        return PolicyDraft {
            urgency: Urgency::Low,
            issue_type: IssueType::FeatureRequest,
            action: Action::AutoRespond,
            target_department: None,
            rule: PolicyRule::FeatureAddressed,
            rationale: "feature request already covered by the knowledge base; Product owns the roadmap item".to_string(),
        };
    }

    // Rule 6: how-to / inquiry answered from the knowledge base
    if (signals.how_to || signals.billing) && !signals.technical && !evidence.snippets.is_empty() {
        let urgency = if signals.billing && plan.is_paid() {
            Urgency::Medium
        } else {
            Urgency::Low
        };
        return PolicyDraft {
            urgency,
            issue_type,
            action: Action::AutoRespond,
            target_department: None,
            rule: PolicyRule::KnowledgeAnswer,
            rationale: format!("question answered by knowledge base match ({})", plan_note),
        };
    }

    // Rule 7: nothing matched; hand to a specialist
    let urgency = if plan == PlanTier::Free && issue_type == IssueType::GeneralInquiry {
        Urgency::Low
    } else {
        Urgency::Medium
    };
    let rationale = if evidence.snippets.is_empty() && signals.wants_knowledge_lookup() {
        format!("no knowledge base coverage for the question ({})", plan_note)
    } else {
        format!("no decision rule matched ({})", plan_note)
    };
    PolicyDraft {
        urgency,
        issue_type,
        action: Action::RouteToSpecialist,
        target_department: Some(Department::Support),
        rule: PolicyRule::Fallback,
        rationale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triagecore_common::classify::{IntentClassifier, KeywordIntentClassifier};
    use triagecore_common::model::{CustomerRecord, KnowledgeSnippet, Provider, StatusReport};

    fn signals(message: &str) -> MessageSignals {
        KeywordIntentClassifier.classify(message)
    }

    fn profile(plan: PlanTier, charge_days_ago: Option<i64>) -> CustomerProfile {
        let charged = charge_days_ago.map(|d| Utc::now() - Duration::days(d));
        CustomerProfile {
            id: "cust_test".into(),
            name: "Test Customer".into(),
            plan,
            region: "EU".into(),
            tenure_months: 12,
            last_charge_at: charged,
            last_renewal_at: charged,
        }
    }

    fn bundle(customer: CustomerRecord) -> EvidenceBundle {
        let mut bundle = EvidenceBundle::new(Utc::now());
        bundle.customer = customer;
        bundle.record_success(Provider::CustomerDirectory);
        bundle
    }

    fn with_status(mut bundle: EvidenceBundle, state: ServiceState) -> EvidenceBundle {
        bundle.status = Some(StatusReport {
            region: "asia-pacific".into(),
            state,
            latency_ms: Some(5000),
            message: "status feed entry".into(),
            global_state: ServiceState::PartialOutage,
        });
        bundle.record_success(Provider::StatusFeed);
        bundle
    }

    fn with_snippets(mut bundle: EvidenceBundle) -> EvidenceBundle {
        bundle.snippets = vec![KnowledgeSnippet {
            content: "Refunds are available within 7 days of the initial charge.".into(),
            rank: 0,
            score: 0.8,
        }];
        bundle.record_success(Provider::KnowledgeIndex);
        bundle
    }

    fn ctx() -> PolicyContext {
        PolicyContext {
            now: Utc::now(),
            refund_window: Duration::days(7),
            window_reference: RefundWindowReference::LastCharge,
        }
    }

    #[test]
    fn test_major_outage_overrides_everything() {
        // Enterprise refund request during a major outage still escalates
        // to Engineering at critical urgency
        let evidence = with_status(
            bundle(CustomerRecord::Found(profile(PlanTier::Enterprise, Some(3)))),
            ServiceState::MajorOutage,
        );
        let draft = decide(&signals("refund please"), &evidence, &ctx());

        assert_eq!(draft.action, Action::EscalateToHuman);
        assert_eq!(draft.target_department, Some(Department::Engineering));
        assert_eq!(draft.urgency, Urgency::Critical);
        assert_eq!(draft.rule, PolicyRule::OutageOrSecurity);
        assert!(draft.is_consistent());
    }

    #[test]
    fn test_security_report_is_critical() {
        let evidence = bundle(CustomerRecord::Found(profile(PlanTier::Free, None)));
        let draft = decide(
            &signals("I think my account was hacked and my data was stolen"),
            &evidence,
            &ctx(),
        );

        assert_eq!(draft.urgency, Urgency::Critical);
        assert_eq!(draft.issue_type, IssueType::Technical);
        assert_eq!(draft.rule, PolicyRule::OutageOrSecurity);
    }

    #[test]
    fn test_enterprise_technical_escalates_high() {
        let evidence = bundle(CustomerRecord::Found(profile(PlanTier::Enterprise, None)));
        let draft = decide(&signals("the dashboard is broken for our team"), &evidence, &ctx());

        assert_eq!(draft.urgency, Urgency::High);
        assert_eq!(draft.action, Action::EscalateToHuman);
        assert_eq!(draft.target_department, Some(Department::Engineering));
    }

    #[test]
    fn test_legal_threat_escalates_to_billing() {
        let evidence = bundle(CustomerRecord::Found(profile(PlanTier::Free, None)));
        let draft = decide(
            &signals("refund me or I will start a dispute with my bank"),
            &evidence,
            &ctx(),
        );

        assert_eq!(draft.urgency, Urgency::High);
        assert_eq!(draft.target_department, Some(Department::Billing));
        assert_eq!(draft.rule, PolicyRule::LegalDispute);
    }

    #[test]
    fn test_free_plan_refund_is_denied() {
        let evidence = bundle(CustomerRecord::Found(profile(PlanTier::Free, None)));
        let draft = decide(&signals("I want a refund"), &evidence, &ctx());

        assert_eq!(draft.action, Action::AutoRespond);
        assert_eq!(draft.target_department, None);
        assert_eq!(draft.urgency, Urgency::Low);
        assert_eq!(draft.rule, PolicyRule::RefundFreePlan);

        // Extra evidence does not change the outcome
        let with_kb = with_snippets(bundle(CustomerRecord::Found(profile(PlanTier::Free, None))));
        let draft = decide(&signals("I want a refund"), &with_kb, &ctx());
        assert_eq!(draft.action, Action::AutoRespond);
        assert_eq!(draft.rule, PolicyRule::RefundFreePlan);
    }

    #[test]
    fn test_unknown_customer_treated_as_free_for_refunds() {
        let evidence = bundle(CustomerRecord::NotFound);
        let draft = decide(&signals("I want a refund"), &evidence, &ctx());

        assert_eq!(draft.action, Action::AutoRespond);
        assert_eq!(draft.rule, PolicyRule::RefundFreePlan);
        assert!(draft.rationale.contains("customer not found"));
    }

    #[test]
    fn test_pro_refund_within_window_escalates() {
        let evidence = bundle(CustomerRecord::Found(profile(PlanTier::Pro, Some(3))));
        let draft = decide(&signals("I want a refund"), &evidence, &ctx());

        assert_eq!(draft.action, Action::EscalateToHuman);
        assert_eq!(draft.target_department, Some(Department::Billing));
        assert_eq!(draft.urgency, Urgency::Medium);
        assert_eq!(draft.rule, PolicyRule::RefundWithinWindow);
    }

    #[test]
    fn test_enterprise_refund_within_window_is_high() {
        let evidence = bundle(CustomerRecord::Found(profile(PlanTier::Enterprise, Some(2))));
        let draft = decide(&signals("I want a refund"), &evidence, &ctx());

        assert_eq!(draft.urgency, Urgency::High);
        assert_eq!(draft.action, Action::EscalateToHuman);
    }

    #[test]
    fn test_pro_refund_outside_window_is_denied() {
        let evidence = bundle(CustomerRecord::Found(profile(PlanTier::Pro, Some(10))));
        let draft = decide(&signals("I want a refund"), &evidence, &ctx());

        assert_eq!(draft.action, Action::AutoRespond);
        assert_eq!(draft.target_department, None);
        assert_eq!(draft.rule, PolicyRule::RefundOutsideWindow);
    }

    #[test]
    fn test_paid_refund_without_timestamp_escalates() {
        let evidence = bundle(CustomerRecord::Found(profile(PlanTier::Pro, None)));
        let draft = decide(&signals("I want a refund"), &evidence, &ctx());

        assert_eq!(draft.action, Action::EscalateToHuman);
        assert!(draft.rationale.contains("manual verification"));
    }

    #[test]
    fn test_window_reference_is_configurable() {
        let mut profile = profile(PlanTier::Pro, Some(10));
        profile.last_renewal_at = Some(Utc::now() - Duration::days(2));
        let evidence = bundle(CustomerRecord::Found(profile));

        let renewal_ctx = PolicyContext {
            window_reference: RefundWindowReference::LastRenewal,
            ..ctx()
        };
        let draft = decide(&signals("I want a refund"), &evidence, &renewal_ctx);

        // Outside the charge window but inside the renewal window
        assert_eq!(draft.rule, PolicyRule::RefundWithinWindow);
    }

    #[test]
    fn test_feature_request_covered_by_kb() {
        let evidence = with_snippets(bundle(CustomerRecord::Found(profile(PlanTier::Free, None))));
        let draft = decide(
            &signals("please add a dark mode toggle to the app"),
            &evidence,
            &ctx(),
        );

        assert_eq!(draft.action, Action::AutoRespond);
        assert_eq!(draft.target_department, None);
        assert_eq!(draft.issue_type, IssueType::FeatureRequest);
        assert_eq!(draft.rule, PolicyRule::FeatureAddressed);
    }

    #[test]
    fn test_how_to_with_kb_answer() {
        let evidence = with_snippets(bundle(CustomerRecord::Found(profile(PlanTier::Free, None))));
        let draft = decide(&signals("How do I export my projects?"), &evidence, &ctx());

        assert_eq!(draft.action, Action::AutoRespond);
        assert_eq!(draft.urgency, Urgency::Low);
        assert_eq!(draft.rule, PolicyRule::KnowledgeAnswer);
    }

    #[test]
    fn test_unanswered_question_routes_to_specialist() {
        let evidence = bundle(CustomerRecord::Found(profile(PlanTier::Pro, None)));
        let draft = decide(
            &signals("How do I configure the SSO integration?"),
            &evidence,
            &ctx(),
        );

        assert_eq!(draft.action, Action::RouteToSpecialist);
        assert_eq!(draft.target_department, Some(Department::Support));
        assert_eq!(draft.urgency, Urgency::Medium);
    }

    #[test]
    fn test_free_general_inquiry_is_low_urgency() {
        let evidence = bundle(CustomerRecord::Found(profile(PlanTier::Free, None)));
        let draft = decide(&signals("Tell me about your company"), &evidence, &ctx());

        assert_eq!(draft.urgency, Urgency::Low);
        assert_eq!(draft.action, Action::RouteToSpecialist);
    }

    #[test]
    fn test_unknown_region_status_falls_through() {
        // A status lookup that resolved to `unknown` must not trip the
        // outage rule or panic
        let evidence = with_status(
            bundle(CustomerRecord::Found(profile(PlanTier::Pro, None))),
            ServiceState::Unknown,
        );
        let draft = decide(&signals("the app is slow in my region"), &evidence, &ctx());

        assert_ne!(draft.rule, PolicyRule::OutageOrSecurity);
        assert!(draft.is_consistent());
    }

    #[test]
    fn test_all_drafts_are_consistent() {
        let messages = [
            "I want a refund",
            "the app is down",
            "How do I export?",
            "please add dark mode",
            "my account was hacked",
            "I will sue you",
            "hello there",
        ];
        let customers = [
            CustomerRecord::NotFound,
            CustomerRecord::Found(profile(PlanTier::Free, None)),
            CustomerRecord::Found(profile(PlanTier::Pro, Some(3))),
            CustomerRecord::Found(profile(PlanTier::Enterprise, Some(30))),
        ];

        for message in messages {
            for customer in &customers {
                let draft = decide(&signals(message), &bundle(customer.clone()), &ctx());
                assert!(
                    draft.is_consistent(),
                    "inconsistent draft for {:?}: {:?}",
                    message,
                    draft
                );
            }
        }
    }
}
