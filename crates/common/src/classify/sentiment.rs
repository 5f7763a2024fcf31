//! Lightweight affect classification
//!
//! Sentiment is derived independently of the decision fields; it only shapes
//! the tone of the user-facing reply.

use crate::model::Sentiment;

/// Classifier seam for sentiment detection
pub trait SentimentClassifier: Send + Sync {
    fn classify(&self, message: &str) -> Sentiment;
}

/// Default keyword-based affect classifier
#[derive(Debug, Default)]
pub struct KeywordSentimentClassifier;

const FRUSTRATED_TERMS: &[&str] = &[
    "unacceptable", "ridiculous", "furious", "angry", "fed up", "worst",
    "terrible", "immediately", "right now", "third time", "again and again",
    "sick of",
];

const NEGATIVE_TERMS: &[&str] = &[
    "disappointed", "unhappy", "frustrating", "problem", "issue", "broken",
    "not working", "doesn't work", "failed", "wrong", "bad",
];

const POSITIVE_TERMS: &[&str] = &[
    "thanks", "thank you", "love", "great", "awesome", "appreciate",
    "wonderful",
];

impl SentimentClassifier for KeywordSentimentClassifier {
    fn classify(&self, message: &str) -> Sentiment {
        let text = message.to_lowercase();

        let exclamations = message.matches('!').count();
        let shouting = message.len() > 12
            && message
                .chars()
                .filter(|c| c.is_alphabetic())
                .all(|c| c.is_uppercase());

        if FRUSTRATED_TERMS.iter().any(|t| text.contains(t)) || exclamations >= 2 || shouting {
            return Sentiment::Frustrated;
        }
        if NEGATIVE_TERMS.iter().any(|t| text.contains(t)) {
            return Sentiment::Negative;
        }
        if POSITIVE_TERMS.iter().any(|t| text.contains(t)) {
            return Sentiment::Positive;
        }
        Sentiment::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(message: &str) -> Sentiment {
        KeywordSentimentClassifier.classify(message)
    }

    #[test]
    fn test_frustrated() {
        assert_eq!(
            classify("This is UNACCEPTABLE, fix it immediately!!"),
            Sentiment::Frustrated
        );
        assert_eq!(
            classify("This is the third time the export has failed"),
            Sentiment::Frustrated
        );
    }

    #[test]
    fn test_negative() {
        assert_eq!(
            classify("The export feature is broken for me"),
            Sentiment::Negative
        );
    }

    #[test]
    fn test_positive() {
        assert_eq!(
            classify("Thanks for the quick fix last week"),
            Sentiment::Positive
        );
    }

    #[test]
    fn test_neutral() {
        assert_eq!(
            classify("How do I change my invoice address"),
            Sentiment::Neutral
        );
    }
}
