//! Built-in support knowledge base
//!
//! One document per policy-manual section, so chunking keeps topical
//! boundaries and tests exercise the retrieval path without external data.

/// Default support knowledge corpus
pub const DEMO_CORPUS: &[&str] = &[
    // Billing & subscriptions
    "Subscription tiers. Free Tier: basic access, limited to 5 projects, community \
support only with a response time of 48-72 hours, no export features. Pro Tier: \
unlimited projects, advanced export to PDF and CSV, priority email support under \
24 hours, cost $29.99 per month. Enterprise Tier: custom seats, dedicated account \
manager, 24/7 phone support, SLA guarantee of 99.9% uptime.",
    "Refund policy. General rule: refunds are limited to prevent abuse. Pro plan \
eligibility: a full refund is available if requested within 7 days of the initial \
charge or renewal date; requests made after 7 days are non-refundable. Enterprise \
plans are subject to the MSA and generally non-refundable unless there is a breach \
of SLA. Free tier: no refunds applicable. Process: contact billing@company.com and \
allow 5-10 business days for funds to appear.",
    "Billing disputes and double charges. If duplicate charges occur, for example \
by clicking Pay twice, contact support immediately. Warning: initiating a \
chargeback or dispute with your bank will result in immediate account suspension. \
We strongly recommend contacting support first.",
    // Technical troubleshooting
    "System requirements and settings. Supported browsers: Chrome, Firefox, Safari \
version 14 and above. Dark mode support: there is currently no manual toggle in \
the app. The app automatically syncs with your operating system theme; if your \
Mac or Windows is dark, the app will be dark. A manual scheduler is planned for \
Q3 2026.",
    "Common error codes. Error 403 Forbidden: free users trying to access Pro \
features such as export; the solution is to upgrade. Error 500 Internal Server \
Error: a server-side issue. Check status.company.com; if the status page shows \
operational but the error persists for more than 15 minutes, treat it as a \
critical incident. Enterprise users should use the emergency line.",
    // Service level agreement
    "Priority matrix. Low: how-to questions and feature requests, handled by \
auto-response. Medium: bug reports from Pro users and billing disputes under \
$100, routed to a specialist. High: service unavailability for Pro users and \
billing disputes over $100 or legal threats, escalated. Critical: total system \
outage or data breach, immediate escalation to Engineering.",
    "Regional information. Asia-Pacific users in Thailand and Vietnam may \
experience higher latency during peak hours, 14:00 to 16:00 UTC+7, due to local \
ISP throttling. This is not a server outage unless Error 500 is observed.",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corpus_covers_core_policies() {
        let joined = DEMO_CORPUS.join(" ");
        assert!(joined.contains("7 days"));
        assert!(joined.contains("chargeback"));
        assert!(joined.contains("Dark mode"));
    }
}
