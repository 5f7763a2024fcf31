//! Intent detection over support-message text
//!
//! Keyword/pattern heuristics classify what a message is about so the
//! orchestrator knows which evidence providers to consult. This stays
//! deliberately coarse; precision comes from the evidence itself.

use regex_lite::Regex;
use std::sync::OnceLock;

/// Signals extracted from one message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageSignals {
    /// Technical/outage concern (errors, "down", "not working")
    pub technical: bool,

    /// Security or data-loss language
    pub security: bool,

    /// Refund request
    pub refund: bool,

    /// Legal threat or bank-dispute language
    pub legal_dispute: bool,

    /// Request for new functionality
    pub feature_request: bool,

    /// How-to / documentation question
    pub how_to: bool,

    /// Billing topic (invoices, charges, subscriptions)
    pub billing: bool,

    /// Raw region mention, if the message names one
    pub region_hint: Option<String>,
}

impl MessageSignals {
    /// The status feed is worth consulting for technical or security reports
    pub fn wants_status_check(&self) -> bool {
        self.technical || self.security
    }

    /// The knowledge index is worth consulting for policy/how-to/feature
    /// questions. Independent of `wants_status_check`; both may hold.
    pub fn wants_knowledge_lookup(&self) -> bool {
        self.refund || self.billing || self.feature_request || self.how_to
    }
}

/// Classifier seam. Implementations must be deterministic for a given
/// message.
pub trait IntentClassifier: Send + Sync {
    fn classify(&self, message: &str) -> MessageSignals;
}

/// Default keyword-based classifier
#[derive(Debug, Default)]
pub struct KeywordIntentClassifier;

fn error_code_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\berror\s*[45]\d\d\b|\b[45]\d\d\s+error\b").unwrap())
}

const TECHNICAL_TERMS: &[&str] = &[
    "down", "outage", "not working", "doesn't work", "does not work", "broken",
    "crash", "bug", "can't log in", "cannot log in", "login", "timeout",
    "unavailable", "slow", "latency",
];

const SECURITY_TERMS: &[&str] = &[
    "security", "hacked", "breach", "data loss", "lost my data", "lost data",
    "leaked", "stolen", "unauthorized",
];

const REFUND_TERMS: &[&str] = &["refund", "money back", "reimburse"];

const LEGAL_TERMS: &[&str] = &[
    "lawyer", "legal", "sue", "lawsuit", "attorney", "chargeback",
    "charge back", "dispute with my bank", "bank dispute", "report you",
];

const FEATURE_TERMS: &[&str] = &[
    "feature request", "add support", "please add", "would be great if",
    "wish the app", "can you add", "dark mode toggle", "roadmap",
];

const HOW_TO_TERMS: &[&str] = &[
    "how do i", "how to", "how can i", "where do i", "where can i", "can i",
    "what is the", "is it possible",
];

const BILLING_TERMS: &[&str] = &[
    "invoice", "charged", "charge", "billing", "subscription", "payment",
    "price", "upgrade", "downgrade", "double charge",
];

// (mention, canonical hint) pairs; first match wins
const REGION_MENTIONS: &[(&str, &str)] = &[
    ("thailand", "asia"),
    ("singapore", "asia"),
    ("vietnam", "asia"),
    ("bangkok", "asia"),
    ("asia", "asia"),
    ("america", "us"),
    ("usa", "us"),
    ("us-east", "us"),
    ("united states", "us"),
    ("europe", "eu"),
    ("germany", "eu"),
    ("france", "eu"),
    ("eu-west", "eu"),
];

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

impl IntentClassifier for KeywordIntentClassifier {
    fn classify(&self, message: &str) -> MessageSignals {
        let text = message.to_lowercase();

        let technical = contains_any(&text, TECHNICAL_TERMS)
            || error_code_pattern().is_match(&text);
        let security = contains_any(&text, SECURITY_TERMS);
        let refund = contains_any(&text, REFUND_TERMS);
        let legal_dispute = contains_any(&text, LEGAL_TERMS);
        let feature_request = contains_any(&text, FEATURE_TERMS);
        let how_to = contains_any(&text, HOW_TO_TERMS) || text.trim_end().ends_with('?');
        let billing = refund || legal_dispute || contains_any(&text, BILLING_TERMS);

        let region_hint = REGION_MENTIONS
            .iter()
            .find(|(mention, _)| text.contains(mention))
            .map(|(_, hint)| hint.to_string());

        MessageSignals {
            technical,
            security,
            refund,
            legal_dispute,
            feature_request,
            how_to,
            billing,
            region_hint,
        }
    }
}
