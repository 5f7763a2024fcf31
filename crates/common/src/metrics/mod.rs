//! Metrics and observability utilities
//!
//! Standardized metric names for the triage engine. Exporter wiring is the
//! host's concern; the engine only emits through the `metrics` facade.

use metrics::{describe_counter, describe_histogram, Unit};

/// Metrics prefix for all TriageCore metrics
pub const METRICS_PREFIX: &str = "triagecore";

/// Total triage calls
pub fn triage_requests_total() -> String {
    format!("{}_triage_requests_total", METRICS_PREFIX)
}

/// Total provider failures, labelled by provider and kind
pub fn provider_failures_total() -> String {
    format!("{}_provider_failures_total", METRICS_PREFIX)
}

/// End-to-end triage latency in seconds
pub fn triage_duration_seconds() -> String {
    format!("{}_triage_duration_seconds", METRICS_PREFIX)
}

/// Knowledge searches served
pub fn knowledge_searches_total() -> String {
    format!("{}_knowledge_searches_total", METRICS_PREFIX)
}

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        triage_requests_total(),
        Unit::Count,
        "Total number of triage calls"
    );

    describe_counter!(
        provider_failures_total(),
        Unit::Count,
        "Evidence provider failures by provider and kind"
    );

    describe_histogram!(
        triage_duration_seconds(),
        Unit::Seconds,
        "End-to-end triage latency in seconds"
    );

    describe_counter!(
        knowledge_searches_total(),
        Unit::Count,
        "Knowledge index searches served"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_are_prefixed() {
        assert!(triage_requests_total().starts_with(METRICS_PREFIX));
        assert!(provider_failures_total().starts_with(METRICS_PREFIX));
    }
}
