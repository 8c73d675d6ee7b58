//! Compiled tag queries
//!
//! A [`Query`] is a validated conjunction of expressions, sorted so cheap
//! filters run first, with the seed expression used to start index lookups
//! already chosen.

use tracing::debug;

use crate::error::{Error, Result};
use crate::metrics;

use super::decision::{FilterDecision, MetricDefinitionFilter};
use super::expression::{Expression, TAG_KEY};
use super::expressions::Expressions;
use super::filter::ExpressionFilter;
use super::parser::parse_expressions;

/// A validated tag query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    from: i64,
    expressions: Expressions,
    initial_expression: usize,
    tag_clause: Option<usize>,
}

impl Query {
    /// Build a query from parsed expressions
    ///
    /// `from` is the timestamp (seconds) before which metrics that have not
    /// been updated are excluded by the index layer.
    ///
    /// Fails if there are no expressions, more than one expression on
    /// `__tag`, or no expression that can seed an index lookup.
    pub fn new(mut expressions: Expressions, from: i64) -> Result<Self> {
        if expressions.is_empty() {
            return Err(Error::InvalidQuery("query has no expressions".to_string()));
        }

        expressions.sort_by_filter_order();

        let mut tag_clause = None;
        for (i, expression) in expressions.iter().enumerate() {
            if expression.key() != TAG_KEY {
                continue;
            }
            if tag_clause.is_some() {
                return Err(Error::InvalidQuery(format!(
                    "only one {} expression is allowed per query",
                    TAG_KEY
                )));
            }
            tag_clause = Some(i);
        }

        let initial_expression = expressions.find_initial_expression().ok_or_else(|| {
            Error::InvalidQuery(
                "query needs at least one expression requiring a non-empty value".to_string(),
            )
        })?;

        debug!(
            expressions = ?expressions.strings(),
            initial = initial_expression,
            from,
            "compiled tag query"
        );
        metrics::record_query_compiled();

        Ok(Self {
            from,
            expressions,
            initial_expression,
            tag_clause,
        })
    }

    /// Oldest last-update timestamp a metric may have to be included
    pub fn from_timestamp(&self) -> i64 {
        self.from
    }

    /// Expressions in filter order
    pub fn expressions(&self) -> &Expressions {
        &self.expressions
    }

    /// The expression to seed an index lookup with
    pub fn initial_expression(&self) -> &Expression {
        &self.expressions[self.initial_expression]
    }

    /// Position of the seed expression within [`expressions`](Self::expressions)
    pub fn initial_expression_position(&self) -> usize {
        self.initial_expression
    }

    /// The expression on `__tag`, if any
    pub fn tag_clause(&self) -> Option<&Expression> {
        self.tag_clause.map(|i| &self.expressions[i])
    }

    /// Build filters for all expressions except the seed expression, whose
    /// condition the lookup that produced the candidates already enforces
    pub fn filter(&self, match_cache_size: usize) -> QueryFilter {
        let filters = self
            .expressions
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != self.initial_expression)
            .map(|(_, e)| e.metric_definition_filter(match_cache_size))
            .collect();

        QueryFilter { filters }
    }

    /// Build filters for every expression, for callers that scan candidates
    /// not produced by a lookup on the seed expression
    pub fn filter_all(&self, match_cache_size: usize) -> QueryFilter {
        let filters = self
            .expressions
            .iter()
            .map(|e| e.metric_definition_filter(match_cache_size))
            .collect();

        QueryFilter { filters }
    }
}

/// Parse expressions and build a query from them
pub fn parse_query<S: AsRef<str>>(expressions: &[S], from: i64) -> Result<Query> {
    Query::new(parse_expressions(expressions)?, from)
}

/// Conjunction of expression filters
#[derive(Debug)]
pub struct QueryFilter {
    filters: Vec<ExpressionFilter>,
}

impl QueryFilter {
    /// The filters in evaluation order
    pub fn filters(&self) -> &[ExpressionFilter] {
        &self.filters
    }

    /// Decide about a metric when this is the only index: inconclusive
    /// filters fall back to their expression's default decision and every
    /// expression has to pass
    pub fn accepts(&self, name: &str, tags: &[String]) -> bool {
        self.filters.iter().all(|f| {
            f.filter(name, tags).or(f.expression().default_decision()) == FilterDecision::Pass
        })
    }
}

impl MetricDefinitionFilter for QueryFilter {
    /// `Fail` as soon as one expression fails, `Pass` if all pass, `None`
    /// if any expression is still undecided
    fn filter(&self, name: &str, tags: &[String]) -> FilterDecision {
        let mut decision = FilterDecision::Pass;
        for f in &self.filters {
            match f.filter(name, tags) {
                FilterDecision::Fail => return FilterDecision::Fail,
                FilterDecision::None => decision = FilterDecision::None,
                FilterDecision::Pass => {}
            }
        }
        decision
    }
}
