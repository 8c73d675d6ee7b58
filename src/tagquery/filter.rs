//! Metric definition filters built from expressions
//!
//! An [`ExpressionFilter`] evaluates one expression against the name and tag
//! list of a metric definition as seen by one index. It comes in two shapes:
//!
//! - expressions on the key `name` test the metric name directly. Every
//!   metric has a name, so this path always decides.
//! - all other expressions scan the tag list for `<key>=`. If the tag is
//!   missing the filter returns [`FilterDecision::None`] because a later
//!   index may still assign it.
//!
//! Regex filters on tags own a [`MatchCache`] so each distinct tag value
//! runs through the regex once.

use tracing::debug;

use crate::metrics;

use super::cache::{MatchCache, MatchCacheStats};
use super::decision::{FilterDecision, MetricDefinitionFilter};
use super::expression::{Expression, NAME_KEY};

/// Filter evaluating one expression against metric definitions
#[derive(Debug)]
pub struct ExpressionFilter {
    expression: Expression,
    /// `<key>=`
    tag_prefix: String,
    on_name: bool,
    /// Outcome for the implicit `name` tag of expressions on tag names
    name_tag_passes: bool,
    cache: Option<MatchCache>,
}

impl Expression {
    /// Build a filter for this expression
    ///
    /// `match_cache_size` bounds each map of the match cache of regex
    /// filters. A size of 0 disables the cache.
    pub fn metric_definition_filter(&self, match_cache_size: usize) -> ExpressionFilter {
        ExpressionFilter::new(self.clone(), match_cache_size)
    }
}

impl ExpressionFilter {
    /// Create a filter for `expression`
    pub fn new(expression: Expression, match_cache_size: usize) -> Self {
        let on_name = expression.key() == NAME_KEY;

        let name_tag_passes = match &expression {
            Expression::MatchTag(_) | Expression::PrefixTag(_) => expression.value_passes(NAME_KEY),
            _ => false,
        };

        let cache = if expression.has_re() && !on_name && match_cache_size > 0 {
            Some(MatchCache::new(match_cache_size))
        } else {
            None
        };

        metrics::record_filter_built(expression.operator().as_str());
        debug!(
            expression = %expression,
            cached = cache.is_some(),
            "built metric definition filter"
        );

        Self {
            tag_prefix: format!("{}=", expression.key()),
            expression,
            on_name,
            name_tag_passes,
            cache,
        }
    }

    /// The expression this filter evaluates
    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    /// Match cache statistics, if this filter has a cache
    pub fn cache_stats(&self) -> Option<MatchCacheStats> {
        self.cache.as_ref().map(MatchCache::stats)
    }

    fn filter_name(&self, name: &str) -> FilterDecision {
        match &self.expression {
            Expression::HasTag(_) => FilterDecision::Pass,
            Expression::NotHasTag(_) => FilterDecision::Fail,
            e if e.has_re() && e.value().is_empty() => self.presence_decision(),
            e => FilterDecision::from_bool(e.value_passes(name)),
        }
    }

    fn filter_tags(&self, tags: &[String]) -> FilterDecision {
        let value = match tags.iter().find_map(|tag| tag.strip_prefix(&self.tag_prefix)) {
            Some(value) => value,
            None => return FilterDecision::None,
        };

        match &self.expression {
            Expression::HasTag(_) | Expression::NotHasTag(_) => self.presence_decision(),
            e if e.has_re() && e.value().is_empty() => self.presence_decision(),
            Expression::Match(_) => FilterDecision::from_bool(self.regex_passes(value)),
            Expression::NotMatch(_) => FilterDecision::from_bool(!self.regex_passes(value)),
            e => FilterDecision::from_bool(e.value_passes(value)),
        }
    }

    fn filter_tag_names(&self, tags: &[String]) -> FilterDecision {
        if self.name_tag_passes {
            return FilterDecision::Pass;
        }

        for tag in tags {
            let key = tag.split_once('=').map_or(tag.as_str(), |(key, _)| key);
            let passes = match &self.expression {
                Expression::MatchTag(_) => self.regex_passes(key),
                e => e.value_passes(key),
            };
            if passes {
                return FilterDecision::Pass;
            }
        }

        FilterDecision::None
    }

    /// Decision once the tag is known to be present and the value does not
    /// matter: positive presence tests pass, negative ones fail
    fn presence_decision(&self) -> FilterDecision {
        match &self.expression {
            Expression::HasTag(_) | Expression::NotMatch(_) => FilterDecision::Pass,
            _ => FilterDecision::Fail,
        }
    }

    /// Run the expression's regex, consulting the match cache first
    fn regex_passes(&self, value: &str) -> bool {
        let re = match self.expression.regex_expression() {
            Some(r) => r.regex(),
            None => return self.expression.value_passes(value),
        };

        match &self.cache {
            Some(cache) => cache.get_or_evaluate(value, |v| re.is_match(v)),
            None => re.is_match(value),
        }
    }
}

impl MetricDefinitionFilter for ExpressionFilter {
    fn filter(&self, name: &str, tags: &[String]) -> FilterDecision {
        if self.on_name {
            return self.filter_name(name);
        }

        match &self.expression {
            Expression::MatchTag(_) | Expression::PrefixTag(_) => self.filter_tag_names(tags),
            _ => self.filter_tags(tags),
        }
    }
}
