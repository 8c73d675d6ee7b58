//! Integration tests for tag query compilation and evaluation
//!
//! Exercises the public API the way a tag index does: parse expressions,
//! order them, build filters and fold per-index decisions.

use kuba_tagquery::tagquery::{
    parse_expression, parse_expressions, parse_query, ExpressionOperator, FilterDecision,
    MetricDefinitionFilter, MetricDefinitionFilters,
};
use kuba_tagquery::{Error, TagQueryConfig};
use rayon::prelude::*;

fn tags(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn test_parse_equal_scenario() {
    let e = parse_expression("host=web01").unwrap();
    assert_eq!(e.operator(), ExpressionOperator::Equal);
    assert_eq!(e.key(), "host");
    assert_eq!(e.value(), "web01");
    assert!(e.value_passes("web01"));
    assert!(!e.value_passes("web02"));
}

#[test]
fn test_parse_rejects_empty_key() {
    for text in ["", "=value"] {
        let err = parse_expression(text).unwrap_err();
        assert!(matches!(err, Error::InvalidExpression(_)), "{}", text);
        assert!(err.to_string().starts_with("Invalid expression"), "{}", text);
    }
}

#[test]
fn test_tag_key_scenarios() {
    let e = parse_expression("__tag^=ho").unwrap();
    assert_eq!(e.operator(), ExpressionOperator::PrefixTag);
    assert!(parse_expression("__tag!=x").is_err());
}

#[test]
fn test_parse_is_deterministic() {
    for text in ["a=b", "a!=~^b.*", "__tag=~x", "a^=", "a="] {
        let first = parse_expression(text).unwrap();
        for _ in 0..3 {
            assert_eq!(parse_expression(text).unwrap(), first);
        }
    }
}

#[test]
fn test_non_regex_round_trip() {
    let texts = ["a=b", "a!=b", "a^=b", "__tag^=b", "a!=", "a=", "a^="];
    let expressions = parse_expressions(&texts).unwrap();
    for (original, text) in expressions.iter().zip(expressions.strings()) {
        assert_eq!(&parse_expression(&text).unwrap(), original, "{}", text);
    }
}

#[test]
fn test_unanchored_regex_equivalent_to_anchored() {
    let unanchored = parse_expression("key=~foo").unwrap();
    let anchored = parse_expression("key=~^(?:foo)").unwrap();

    for candidate in ["foo", "foobar", "xfoo", "", "fo", "FOO", "bar.foo"] {
        assert_eq!(
            unanchored.value_passes(candidate),
            anchored.value_passes(candidate),
            "{}",
            candidate
        );
    }

    let unanchored = unanchored.metric_definition_filter(10);
    let anchored = anchored.metric_definition_filter(10);
    for value in ["foo", "foobar", "xfoo"] {
        let metric = tags(&[format!("key={}", value).as_str()]);
        assert_eq!(unanchored.filter("m", &metric), anchored.filter("m", &metric));
    }
}

// =============================================================================
// Decisions
// =============================================================================

#[test]
fn test_not_match_scenario() {
    let e = parse_expression("host!=~^web.*").unwrap();
    assert_eq!(e.operator(), ExpressionOperator::NotMatch);

    let filter = e.metric_definition_filter(100);
    assert_eq!(filter.filter("m", &tags(&["host=web01"])), FilterDecision::Fail);
    assert_eq!(filter.filter("m", &tags(&["env=prod"])), FilterDecision::None);
}

#[test]
fn test_not_match_default_decision() {
    assert_eq!(
        parse_expression("a!=~.*").unwrap().default_decision(),
        FilterDecision::Fail
    );
    assert_eq!(
        parse_expression("a!=~abc").unwrap().default_decision(),
        FilterDecision::Pass
    );
}

#[test]
fn test_combinator_short_circuit() {
    let mut filters = MetricDefinitionFilters::new();
    filters.push(|_: &str, _: &[String]| FilterDecision::None);
    filters.push(|_: &str, _: &[String]| FilterDecision::Fail);
    filters.push(|_: &str, _: &[String]| FilterDecision::Pass);
    assert_eq!(filters.filter("m", &[]), FilterDecision::Fail);

    let mut filters = MetricDefinitionFilters::new();
    filters.push(|_: &str, _: &[String]| FilterDecision::None);
    filters.push(|_: &str, _: &[String]| FilterDecision::None);
    assert_eq!(filters.filter("m", &[]), FilterDecision::None);
}

/// The metric tag index does not know `anothertag`, the meta tag index
/// assigns `anothertag=value` to every metric with `abc=cba`.
#[test]
fn test_primary_and_meta_index() {
    let e = parse_expression("anothertag!=value").unwrap();

    let mut filters = MetricDefinitionFilters::new();
    filters.push(e.metric_definition_filter(100));
    let meta_filter = e.metric_definition_filter(100);
    filters.push(move |name: &str, tags: &[String]| {
        if tags.iter().any(|t| t == "abc=cba") {
            let mut with_meta = tags.to_vec();
            with_meta.push("anothertag=value".to_string());
            meta_filter.filter(name, &with_meta)
        } else {
            FilterDecision::None
        }
    });
    let default = e.default_decision();

    // no index knows the tag: default decision of != is pass
    assert_eq!(
        filters.filter_or("m", &tags(&["some=value"]), default),
        FilterDecision::Pass
    );
    // primary index decides directly
    assert_eq!(
        filters.filter_or("m", &tags(&["anothertag=value"]), default),
        FilterDecision::Fail
    );
    // only the meta index knows
    assert_eq!(filters.filter("m", &tags(&["abc=cba"])), FilterDecision::Fail);
}

// =============================================================================
// Ordering
// =============================================================================

#[test]
fn test_sort_and_seed() {
    let mut expressions = parse_expressions(&["a!=~x", "b=y", "c!="]).unwrap();
    expressions.sort_by_filter_order();
    assert_eq!(expressions.strings(), vec!["b=y", "c!=", "a!=~x"]);

    let expressions = parse_expressions(&["a!=b", "c=~d", "e=f"]).unwrap();
    assert_eq!(expressions.find_initial_expression(), Some(2));

    let expressions = parse_expressions(&["a!=", "b=", "c^="]).unwrap();
    assert_eq!(expressions.find_initial_expression(), None);
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_concurrent_filtering_respects_cache_bound() {
    let config = TagQueryConfig { match_cache_size: 64 };
    let filter = parse_expression("host=~web[0-9]+")
        .unwrap()
        .metric_definition_filter(config.match_cache_size);

    let metrics: Vec<Vec<String>> = (0..10_000)
        .map(|i| {
            let host = if i % 2 == 0 { "web" } else { "db" };
            tags(&[format!("host={}{}", host, i % 500).as_str(), "env=prod"])
        })
        .collect();

    let passed = metrics
        .par_iter()
        .filter(|t| filter.filter("m", t) == FilterDecision::Pass)
        .count();
    assert_eq!(passed, 5_000);

    let stats = filter.cache_stats().unwrap();
    // a racing insert can overshoot the cap slightly
    let slack = rayon::current_num_threads();
    assert!(stats.matched_entries <= config.match_cache_size + slack);
    assert!(stats.missed_entries <= config.match_cache_size + slack);
    assert!(stats.hits > 0);
}

#[test]
fn test_query_filter_shared_across_threads() {
    let query = parse_query(&["dc=east", "host!=~db.*", "__tag^=ho"], 0).unwrap();
    let filter = query.filter_all(100);

    let accepted = (0..1_000)
        .into_par_iter()
        .filter(|i| {
            let host = if i % 4 == 0 { "db" } else { "web" };
            let metric = tags(&["dc=east", format!("host={}{}", host, i).as_str()]);
            filter.accepts("cpu.user", &metric)
        })
        .count();

    assert_eq!(accepted, 750);
}
