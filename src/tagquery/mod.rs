//! Tag Query Expressions
//!
//! Compiles Graphite style tag expressions such as `host!=~web.*` into
//! filters that tag indexes apply to metric definitions.
//!
//! # Flow
//!
//! ```text
//! "host=web01", "dc!=~us-.*"
//!      │
//!      ▼
//! ┌──────────────┐
//! │   Parse      │  text → Expression
//! └──────────────┘
//!      │
//!      ▼
//! ┌──────────────┐
//! │   Order      │  cheap filters first, pick the seed expression
//! └──────────────┘
//!      │
//!      ▼
//! ┌──────────────┐
//! │   Filter     │  (name, tags) → None / Fail / Pass per index
//! └──────────────┘
//! ```
//!
//! # Components
//!
//! - **operator**: the closed set of operators and their tokens
//! - **parser**: text to [`Expression`]
//! - **expression**: the expression variants and their shared contract
//! - **filter**: per-expression metric definition filters
//! - **cache**: bounded concurrent cache of regex outcomes
//! - **decision**: the three valued decision and the multi-index combinator
//! - **expressions**: cost ordering and seed selection
//! - **query**: validated conjunctions
//!
//! # Example
//!
//! ```rust
//! use kuba_tagquery::tagquery::{parse_expression, FilterDecision, MetricDefinitionFilter};
//!
//! let expression = parse_expression("host!=~^web.*").unwrap();
//! let filter = expression.metric_definition_filter(1000);
//!
//! let tags = vec!["host=web01".to_string()];
//! assert_eq!(filter.filter("cpu.user", &tags), FilterDecision::Fail);
//!
//! // this index knows nothing about host, another one might
//! let tags = vec!["env=prod".to_string()];
//! assert_eq!(filter.filter("cpu.user", &tags), FilterDecision::None);
//! assert_eq!(expression.default_decision(), FilterDecision::Pass);
//! ```

pub mod cache;
pub mod decision;
pub mod expression;
pub mod expressions;
pub mod filter;
pub mod operator;
pub mod parser;
pub mod query;
pub mod validate;

// Re-export main types
pub use cache::{MatchCache, MatchCacheStats};
pub use decision::{FilterDecision, MetricDefinitionFilter, MetricDefinitionFilters};
pub use expression::{
    expressions_are_equal, Expression, ExpressionCommon, RegexExpression, NAME_KEY, TAG_KEY,
};
pub use expressions::Expressions;
pub use filter::ExpressionFilter;
pub use operator::ExpressionOperator;
pub use parser::{parse_expression, parse_expressions};
pub use query::{parse_query, Query, QueryFilter};
pub use validate::validate_query_expression_tag_key;
