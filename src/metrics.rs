//! Prometheus metrics for tag query compilation
//!
//! Counts work done at query compile time. Per-value match cache activity is
//! tracked on each cache instead (see [`crate::tagquery::MatchCacheStats`]),
//! which keeps labelled metric lookups out of the per-metric hot path.

use lazy_static::lazy_static;
use prometheus::{register_counter, register_counter_vec, Counter, CounterVec, Encoder, TextEncoder};

lazy_static! {
    /// Expressions parsed successfully
    pub static ref EXPRESSIONS_PARSED: CounterVec = register_counter_vec!(
        "tagquery_expressions_parsed_total",
        "Tag query expressions parsed successfully",
        &["operator"]
    ).unwrap();

    /// Expressions rejected by the parser
    pub static ref PARSE_ERRORS: CounterVec = register_counter_vec!(
        "tagquery_parse_errors_total",
        "Tag query expressions rejected by the parser",
        &["kind"]
    ).unwrap();

    /// Metric definition filters built
    pub static ref FILTERS_BUILT: CounterVec = register_counter_vec!(
        "tagquery_filters_built_total",
        "Metric definition filters built from expressions",
        &["operator"]
    ).unwrap();

    /// Queries compiled
    pub static ref QUERIES_COMPILED: Counter = register_counter!(
        "tagquery_queries_compiled_total",
        "Tag queries compiled successfully"
    ).unwrap();
}

/// Record a parsed expression
pub fn record_parsed(operator: &str) {
    EXPRESSIONS_PARSED.with_label_values(&[operator]).inc();
}

/// Record a parse failure
pub fn record_parse_error(kind: &str) {
    PARSE_ERRORS.with_label_values(&[kind]).inc();
}

/// Record a filter construction
pub fn record_filter_built(operator: &str) {
    FILTERS_BUILT.with_label_values(&[operator]).inc();
}

/// Record a compiled query
pub fn record_query_compiled() {
    QUERIES_COMPILED.inc();
}

/// Gather all metrics in Prometheus text format
pub fn gather() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
