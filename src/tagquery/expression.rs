//! Tag query expressions
//!
//! An [`Expression`] is one `key<operator>value` predicate. The set of
//! variants is closed: every operator the parser can produce has exactly one
//! variant, and everything that depends on the operator is an exhaustive
//! match below.
//!
//! Expressions are immutable once parsed. The only mutable state reachable
//! from one is the match cache owned by each filter built from it.

use std::fmt;

use regex::Regex;

use super::decision::FilterDecision;
use super::operator::ExpressionOperator;

/// Reserved key selecting tag names instead of tag values
pub const TAG_KEY: &str = "__tag";

/// Key that addresses the metric name, which every metric has
pub const NAME_KEY: &str = "name";

/// Key and value shared by all expression variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionCommon {
    pub(crate) key: String,
    pub(crate) value: String,
}

/// Expression whose value is a regular expression
#[derive(Debug, Clone)]
pub struct RegexExpression {
    pub(crate) common: ExpressionCommon,
    pub(crate) re: Regex,
    pub(crate) matches_empty: bool,
}

impl RegexExpression {
    pub(crate) fn new(common: ExpressionCommon, re: Regex) -> Self {
        let matches_empty = re.is_match("");
        Self {
            common,
            re,
            matches_empty,
        }
    }

    /// The compiled, left anchored pattern
    pub fn regex(&self) -> &Regex {
        &self.re
    }

    /// Whether the pattern matches the empty string
    pub fn matches_empty(&self) -> bool {
        self.matches_empty
    }
}

/// A parsed tag query expression
#[derive(Debug, Clone)]
pub enum Expression {
    /// `key=value`
    Equal(ExpressionCommon),
    /// `key!=value`
    NotEqual(ExpressionCommon),
    /// `key=~pattern`
    Match(RegexExpression),
    /// `key!=~pattern`
    NotMatch(RegexExpression),
    /// `__tag=~pattern`
    MatchTag(RegexExpression),
    /// `key^=prefix`
    Prefix(ExpressionCommon),
    /// `__tag^=prefix`
    PrefixTag(ExpressionCommon),
    /// `key!=` or `key^=`
    HasTag(ExpressionCommon),
    /// `key=`
    NotHasTag(ExpressionCommon),
}

impl Expression {
    fn common(&self) -> &ExpressionCommon {
        match self {
            Expression::Equal(c)
            | Expression::NotEqual(c)
            | Expression::Prefix(c)
            | Expression::PrefixTag(c)
            | Expression::HasTag(c)
            | Expression::NotHasTag(c) => c,
            Expression::Match(r) | Expression::NotMatch(r) | Expression::MatchTag(r) => &r.common,
        }
    }

    /// The regex part of regex based expressions
    pub fn regex_expression(&self) -> Option<&RegexExpression> {
        match self {
            Expression::Match(r) | Expression::NotMatch(r) | Expression::MatchTag(r) => Some(r),
            _ => None,
        }
    }

    /// Operator of this expression
    pub fn operator(&self) -> ExpressionOperator {
        match self {
            Expression::Equal(_) => ExpressionOperator::Equal,
            Expression::NotEqual(_) => ExpressionOperator::NotEqual,
            Expression::Match(_) => ExpressionOperator::Match,
            Expression::NotMatch(_) => ExpressionOperator::NotMatch,
            Expression::MatchTag(_) => ExpressionOperator::MatchTag,
            Expression::Prefix(_) => ExpressionOperator::Prefix,
            Expression::PrefixTag(_) => ExpressionOperator::PrefixTag,
            Expression::HasTag(_) => ExpressionOperator::HasTag,
            Expression::NotHasTag(_) => ExpressionOperator::NotHasTag,
        }
    }

    /// Tag key this expression applies to
    ///
    /// In `tag1=value` this is `tag1`. Expressions on tag names use the
    /// reserved key `__tag`.
    pub fn key(&self) -> &str {
        &self.common().key
    }

    /// Value part of the expression, as written in the query
    ///
    /// In `abc!=cba` this is `cba`. For regex expressions this is the
    /// pattern before anchoring.
    pub fn value(&self) -> &str {
        &self.common().value
    }

    /// Whether the match test needs a non-empty value to be meaningful
    ///
    /// Only expressions for which this holds can seed an index lookup.
    pub fn requires_non_empty_value(&self) -> bool {
        !matches!(self, Expression::HasTag(_) | Expression::NotHasTag(_))
    }

    /// Whether evaluation involves a regular expression
    pub fn has_re(&self) -> bool {
        self.regex_expression().is_some()
    }

    /// Whether the expression tests tag names rather than tag values
    pub fn operates_on_tag(&self) -> bool {
        matches!(
            self,
            Expression::MatchTag(_)
                | Expression::PrefixTag(_)
                | Expression::HasTag(_)
                | Expression::NotHasTag(_)
        )
    }

    /// Apply the expression's test to a single candidate
    ///
    /// The candidate is a tag value, or a tag name when
    /// [`operates_on_tag`](Self::operates_on_tag) is true.
    pub fn value_passes(&self, candidate: &str) -> bool {
        match self {
            Expression::Equal(c) => candidate == c.value,
            Expression::NotEqual(c) => candidate != c.value,
            Expression::Match(r) | Expression::MatchTag(r) => r.re.is_match(candidate),
            Expression::NotMatch(r) => !r.re.is_match(candidate),
            Expression::Prefix(c) | Expression::PrefixTag(c) => candidate.starts_with(&c.value),
            Expression::HasTag(c) => candidate == c.key,
            Expression::NotHasTag(c) => candidate != c.key,
        }
    }

    /// Decision to apply when no index came to a conclusive decision
    ///
    /// A metric that lacks the tag is treated as having it with an empty
    /// value. Any expression that accepts the empty value therefore accepts
    /// metrics without the tag:
    /// <https://graphite.readthedocs.io/en/latest/tags.html>
    pub fn default_decision(&self) -> FilterDecision {
        match self {
            Expression::Equal(_) => FilterDecision::Fail,
            Expression::NotEqual(_) => FilterDecision::Pass,
            Expression::Match(r) => FilterDecision::from_bool(r.matches_empty),
            Expression::NotMatch(r) => FilterDecision::from_bool(!r.matches_empty),
            // tag names are never empty
            Expression::MatchTag(_) => FilterDecision::Fail,
            Expression::Prefix(_) => FilterDecision::Fail,
            Expression::PrefixTag(_) => FilterDecision::Fail,
            Expression::HasTag(_) => FilterDecision::Fail,
            Expression::NotHasTag(_) => FilterDecision::Pass,
        }
    }

    /// Append the canonical `key<operator>value` form to `builder`
    pub fn string_into_builder(&self, builder: &mut String) {
        let common = self.common();
        builder.push_str(&common.key);
        self.operator().string_into_builder(builder);
        builder.push_str(&common.value);
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.operator() == other.operator() && self.common() == other.common()
    }
}

impl Eq for Expression {}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = String::new();
        self.string_into_builder(&mut builder);
        f.write_str(&builder)
    }
}

/// Two expressions are equal if key, operator and value are equal
pub fn expressions_are_equal(a: &Expression, b: &Expression) -> bool {
    a == b
}
