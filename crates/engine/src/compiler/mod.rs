//! Resolution compilation
//!
//! Turns a policy draft plus evidence into the externally-visible
//! `Resolution`: staff-facing note, user-facing reply, executed tool list,
//! and reasoning trace. Every compiled resolution is validated against the
//! schema invariants before it leaves the engine.

use tracing::trace;
use triagecore_common::errors::{EngineError, Result};
use triagecore_common::model::{
    EvidenceBundle, PolicyDraft, PolicyRule, Resolution, Sentiment,
};

/// Produces the user-facing reply text. Swappable so a generative composer
/// can replace the templates without touching compilation or validation.
pub trait ResponseComposer: Send + Sync {
    fn compose(&self, draft: &PolicyDraft, sentiment: Sentiment, evidence: &EvidenceBundle)
        -> String;
}

/// Deterministic template-based composer.
///
/// Replies acknowledge and describe next steps but never promise an outcome;
/// a refund reply says the request is under review, not that it is granted.
#[derive(Debug, Default)]
pub struct TemplateComposer;

impl TemplateComposer {
    fn opener(sentiment: Sentiment) -> &'static str {
        if sentiment.warrants_empathy() {
            "I'm sorry for the trouble this has caused, and thank you for flagging it. "
        } else {
            "Thank you for reaching out. "
        }
    }

    fn body(draft: &PolicyDraft, evidence: &EvidenceBundle) -> String {
        let top_snippet = evidence.snippets.first().map(|s| s.content.as_str());
        match draft.rule {
            PolicyRule::OutageOrSecurity => {
                "We are treating this as a critical issue. Our engineering team has been \
                 alerted and is investigating with the highest priority. We will post updates \
                 on our status page as soon as we know more."
                    .to_string()
            }
            PolicyRule::EnterpriseTechnical => {
                "I have escalated this directly to our engineering team, who will review \
                 the technical details and follow up with you shortly."
                    .to_string()
            }
            PolicyRule::LegalDispute => {
                "I have forwarded your message to our billing team for urgent review. \
                 A team member will be in touch with you about the next steps."
                    .to_string()
            }
            PolicyRule::RefundFreePlan => {
                "Our records show your account is on the free plan, which has no paid \
                 charges, so a refund does not apply here. If you believe you were charged, \
                 please reply with the charge details and we will look into it."
                    .to_string()
            }
            PolicyRule::RefundWithinWindow => {
                "I have passed your refund request to our billing team, who will review it \
                 against your recent charge and follow up with the outcome."
                    .to_string()
            }
            PolicyRule::RefundOutsideWindow => {
                let mut body = String::from(
                    "Unfortunately your request falls outside the refund eligibility window \
                     described in our policy, so we are unable to process it automatically.",
                );
                if let Some(snippet) = top_snippet {
                    body.push_str(" For reference: ");
                    body.push_str(snippet);
                }
                body.push_str(" If you feel your situation is exceptional, reply and a billing specialist will take a look.");
                body
            }
            PolicyRule::FeatureAddressed => {
                let mut body = String::from("Good news, this is already covered. ");
                if let Some(snippet) = top_snippet {
                    body.push_str(snippet);
                } else {
                    body.push_str("Please check our documentation for the details.");
                }
                body
            }
            PolicyRule::KnowledgeAnswer => {
                let mut body = String::from("Here is what our documentation says: ");
                if let Some(snippet) = top_snippet {
                    body.push_str(snippet);
                } else {
                    body.push_str("please see our help center for the full details.");
                }
                body
            }
            PolicyRule::Fallback => {
                "I have routed your question to a support specialist, who will get back to \
                 you as soon as possible."
                    .to_string()
            }
        }
    }
}

impl ResponseComposer for TemplateComposer {
    fn compose(
        &self,
        draft: &PolicyDraft,
        sentiment: Sentiment,
        evidence: &EvidenceBundle,
    ) -> String {
        format!("{}{}", Self::opener(sentiment), Self::body(draft, evidence))
    }
}

/// Compiles validated resolutions out of drafts and evidence
pub struct ResolutionCompiler {
    composer: Box<dyn ResponseComposer>,
}

impl Default for ResolutionCompiler {
    fn default() -> Self {
        Self::new(Box::new(TemplateComposer))
    }
}

impl ResolutionCompiler {
    pub fn new(composer: Box<dyn ResponseComposer>) -> Self {
        Self { composer }
    }

    /// Assemble and validate the resolution. Fails with `SchemaViolation` if
    /// the draft breaks a cross-field invariant.
    pub fn compile(
        &self,
        draft: PolicyDraft,
        sentiment: Sentiment,
        evidence: &EvidenceBundle,
    ) -> Result<Resolution> {
        let user_response = self.composer.compose(&draft, sentiment, evidence);
        let internal_ticket_note = internal_note(&draft, evidence);
        let reasoning_trace = reasoning_trace(&draft, evidence);
        let executed_tools = evidence
            .queried
            .iter()
            .map(|p| p.wire_name().to_string())
            .collect();

        let resolution = Resolution {
            urgency: draft.urgency,
            issue_type: draft.issue_type,
            sentiment,
            action: draft.action,
            target_department: draft.target_department,
            internal_ticket_note,
            user_response,
            executed_tools,
            reasoning_trace,
        };
        validate(&resolution)?;
        trace!(action = %resolution.action, "Resolution compiled");
        Ok(resolution)
    }
}

/// Staff-facing summary: evidence facts only, no narrative
fn internal_note(draft: &PolicyDraft, evidence: &EvidenceBundle) -> String {
    let customer = match evidence.customer.profile() {
        Some(profile) => format!(
            "{} ({}, plan={}, region={})",
            profile.name, profile.id, profile.plan, profile.region
        ),
        None => "unknown customer".to_string(),
    };

    let mut note = format!(
        "{} | {} | urgency={} | action={}",
        customer, draft.issue_type, draft.urgency, draft.action
    );
    if let Some(department) = draft.target_department {
        note.push_str(&format!(" -> {}", department));
    }
    if let Some(status) = &evidence.status {
        note.push_str(&format!(" | status[{}]={}", status.region, status.state));
    }
    if !evidence.snippets.is_empty() {
        note.push_str(&format!(" | kb_matches={}", evidence.snippets.len()));
    }
    for failure in &evidence.failed {
        note.push_str(&format!(
            " | DEGRADED {}={}",
            failure.provider, failure.kind
        ));
    }
    note
}

/// Concise account of which rule fired and on what evidence
fn reasoning_trace(draft: &PolicyDraft, evidence: &EvidenceBundle) -> String {
    let consulted: Vec<&str> = evidence.queried.iter().map(|p| p.wire_name()).collect();
    let mut trace = format!(
        "{}; evidence from [{}]",
        draft.rationale,
        consulted.join(", ")
    );
    if !evidence.failed.is_empty() {
        let failed: Vec<String> = evidence
            .failed
            .iter()
            .map(|f| format!("{} ({})", f.provider, f.kind))
            .collect();
        trace.push_str(&format!("; degraded: [{}]", failed.join(", ")));
    }
    if evidence.deadline_exceeded {
        trace.push_str("; evidence gathering hit the overall deadline");
    }
    trace
}

/// Schema invariants every outgoing resolution must satisfy
fn validate(resolution: &Resolution) -> Result<()> {
    if resolution.target_department.is_some() != resolution.action.requires_department() {
        return Err(EngineError::SchemaViolation {
            detail: format!(
                "action {} is inconsistent with target_department {:?}",
                resolution.action, resolution.target_department
            ),
        });
    }
    let mut tools = resolution.executed_tools.clone();
    tools.sort();
    tools.dedup();
    if tools.len() != resolution.executed_tools.len() {
        return Err(EngineError::SchemaViolation {
            detail: "executed_tools contains duplicates".to_string(),
        });
    }
    if resolution.user_response.trim().is_empty() || resolution.internal_ticket_note.trim().is_empty()
    {
        return Err(EngineError::SchemaViolation {
            detail: "empty response or ticket note".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use triagecore_common::model::{
        Action, CustomerProfile, CustomerRecord, Department, IssueType, KnowledgeSnippet,
        PlanTier, Provider, Urgency,
    };

    fn draft(rule: PolicyRule, action: Action, department: Option<Department>) -> PolicyDraft {
        PolicyDraft {
            urgency: Urgency::Medium,
            issue_type: IssueType::Billing,
            action,
            target_department: department,
            rule,
            rationale: "test rationale".into(),
        }
    }

    fn evidence() -> EvidenceBundle {
        let mut bundle = EvidenceBundle::new(Utc::now());
        bundle.customer = CustomerRecord::Found(CustomerProfile {
            id: "cust_03".into(),
            name: "John Doe".into(),
            plan: PlanTier::Pro,
            region: "EU".into(),
            tenure_months: 12,
            last_charge_at: None,
            last_renewal_at: None,
        });
        bundle.record_success(Provider::CustomerDirectory);
        bundle.snippets = vec![KnowledgeSnippet {
            content: "Refunds are available within 7 days of the initial charge.".into(),
            rank: 0,
            score: 0.8,
        }];
        bundle.record_success(Provider::KnowledgeIndex);
        bundle
    }

    #[test]
    fn test_executed_tools_match_successful_providers() {
        let compiler = ResolutionCompiler::default();
        let resolution = compiler
            .compile(
                draft(PolicyRule::RefundWithinWindow, Action::EscalateToHuman, Some(Department::Billing)),
                Sentiment::Neutral,
                &evidence(),
            )
            .unwrap();

        assert_eq!(
            resolution.executed_tools,
            vec!["get_customer_profile", "search_knowledge_base"]
        );
    }

    #[test]
    fn test_inconsistent_draft_is_rejected() {
        let compiler = ResolutionCompiler::default();
        let result = compiler.compile(
            draft(PolicyRule::KnowledgeAnswer, Action::AutoRespond, Some(Department::Billing)),
            Sentiment::Neutral,
            &evidence(),
        );

        assert!(matches!(result, Err(EngineError::SchemaViolation { .. })));
    }

    #[test]
    fn test_empathetic_opener_for_frustrated_sentiment() {
        let compiler = ResolutionCompiler::default();
        let frustrated = compiler
            .compile(
                draft(PolicyRule::Fallback, Action::RouteToSpecialist, Some(Department::Support)),
                Sentiment::Frustrated,
                &evidence(),
            )
            .unwrap();
        let neutral = compiler
            .compile(
                draft(PolicyRule::Fallback, Action::RouteToSpecialist, Some(Department::Support)),
                Sentiment::Neutral,
                &evidence(),
            )
            .unwrap();

        assert!(frustrated.user_response.starts_with("I'm sorry"));
        assert!(neutral.user_response.starts_with("Thank you"));
    }

    #[test]
    fn test_replies_never_promise_outcomes() {
        let compiler = ResolutionCompiler::default();
        let cases = [
            (PolicyRule::OutageOrSecurity, Action::EscalateToHuman, Some(Department::Engineering)),
            (PolicyRule::RefundWithinWindow, Action::EscalateToHuman, Some(Department::Billing)),
            (PolicyRule::RefundOutsideWindow, Action::AutoRespond, None),
            (PolicyRule::Fallback, Action::RouteToSpecialist, Some(Department::Support)),
        ];

        for (rule, action, department) in cases {
            let resolution = compiler
                .compile(draft(rule, action, department), Sentiment::Negative, &evidence())
                .unwrap();
            let reply = resolution.user_response.to_lowercase();
            assert!(!reply.contains("guarantee"), "{:?}: {}", rule, reply);
            assert!(!reply.contains("will be refunded"), "{:?}: {}", rule, reply);
            assert!(!reply.contains("you will receive"), "{:?}: {}", rule, reply);
        }
    }

    #[test]
    fn test_knowledge_answer_cites_snippet() {
        let compiler = ResolutionCompiler::default();
        let resolution = compiler
            .compile(
                draft(PolicyRule::KnowledgeAnswer, Action::AutoRespond, None),
                Sentiment::Neutral,
                &evidence(),
            )
            .unwrap();

        assert!(resolution.user_response.contains("within 7 days"));
    }

    #[test]
    fn test_internal_note_records_degraded_evidence() {
        let mut bundle = evidence();
        bundle.record_failure(
            Provider::StatusFeed,
            triagecore_common::model::FailureKind::Timeout,
            "no reply within 2000ms".into(),
        );

        let compiler = ResolutionCompiler::default();
        let resolution = compiler
            .compile(
                draft(PolicyRule::Fallback, Action::RouteToSpecialist, Some(Department::Support)),
                Sentiment::Neutral,
                &bundle,
            )
            .unwrap();

        assert!(resolution.internal_ticket_note.contains("DEGRADED"));
        assert!(resolution.reasoning_trace.contains("degraded"));
        assert!(resolution.internal_ticket_note.contains("John Doe"));
    }
}
