//! Tag query operators

use std::fmt;

/// Operator of a tag query expression
///
/// `MatchAll` and `MatchNone` are sentinels used only for cost ordering.
/// The parser never produces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionOperator {
    /// `=` exact value
    Equal,
    /// `!=` any value but this one
    NotEqual,
    /// `=~` regular expression on the value
    Match,
    /// `__tag=~` regular expression on the tag name
    MatchTag,
    /// `!=~` negated regular expression on the value
    NotMatch,
    /// `^=` exact value prefix, used for auto completion of values
    Prefix,
    /// `__tag^=` exact tag name prefix, used for auto completion of tags
    PrefixTag,
    /// `<tag>!=` the tag must be present
    HasTag,
    /// `<tag>=` the tag must not be present
    NotHasTag,
    /// Sentinel: matches everything
    MatchAll,
    /// Sentinel: matches nothing
    MatchNone,
}

impl ExpressionOperator {
    /// Serialization token placed between key and value
    pub fn token(self) -> &'static str {
        match self {
            ExpressionOperator::Equal => "=",
            ExpressionOperator::NotEqual => "!=",
            ExpressionOperator::Match => "=~",
            ExpressionOperator::MatchTag => "=~",
            ExpressionOperator::NotMatch => "!=~",
            ExpressionOperator::Prefix => "^=",
            ExpressionOperator::PrefixTag => "^=",
            ExpressionOperator::HasTag => "!=",
            ExpressionOperator::NotHasTag => "=",
            ExpressionOperator::MatchAll | ExpressionOperator::MatchNone => "",
        }
    }

    /// Stable name, used for logging and metric labels
    pub fn as_str(self) -> &'static str {
        match self {
            ExpressionOperator::Equal => "equal",
            ExpressionOperator::NotEqual => "not_equal",
            ExpressionOperator::Match => "match",
            ExpressionOperator::MatchTag => "match_tag",
            ExpressionOperator::NotMatch => "not_match",
            ExpressionOperator::Prefix => "prefix",
            ExpressionOperator::PrefixTag => "prefix_tag",
            ExpressionOperator::HasTag => "has_tag",
            ExpressionOperator::NotHasTag => "not_has_tag",
            ExpressionOperator::MatchAll => "match_all",
            ExpressionOperator::MatchNone => "match_none",
        }
    }

    /// Relative cost of evaluating this operator as a filter, lowest first
    pub fn cost(self) -> u8 {
        match self {
            ExpressionOperator::MatchNone => 0,
            ExpressionOperator::Equal => 1,
            ExpressionOperator::HasTag => 2,
            ExpressionOperator::Prefix => 3,
            ExpressionOperator::PrefixTag => 4,
            ExpressionOperator::NotEqual => 5,
            ExpressionOperator::NotHasTag => 6,
            ExpressionOperator::Match => 7,
            ExpressionOperator::MatchTag => 8,
            ExpressionOperator::NotMatch => 9,
            ExpressionOperator::MatchAll => 10,
        }
    }

    /// Whether evaluation involves a regular expression
    pub fn is_regex(self) -> bool {
        matches!(
            self,
            ExpressionOperator::Match | ExpressionOperator::MatchTag | ExpressionOperator::NotMatch
        )
    }

    /// Write the serialization token into `builder`
    pub fn string_into_builder(self, builder: &mut String) {
        builder.push_str(self.token());
    }
}

impl fmt::Display for ExpressionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
