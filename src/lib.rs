//! Kuba Tag Query - tag expression engine for the Kuba time-series index
//!
//! This library compiles Graphite style tag queries into metric definition
//! filters:
//! - Strict, deterministic expression parsing
//! - Three valued decisions spanning primary and meta tag indexes
//! - Cost based ordering and seed expression selection
//! - Bounded concurrent caching of regex outcomes

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;

/// Configuration management with TOML support
pub mod config;

/// Prometheus metrics and telemetry
pub mod metrics;

/// Tag query expressions, filters and queries
pub mod tagquery;

// Re-export main types
pub use config::TagQueryConfig;
pub use error::{Error, Result, ValidationError};
pub use tagquery::{
    parse_expression, parse_expressions, parse_query, Expression, ExpressionOperator, Expressions,
    FilterDecision, MetricDefinitionFilter, MetricDefinitionFilters, Query,
};
