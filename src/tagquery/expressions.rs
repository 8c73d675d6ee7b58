//! Conjunctions of expressions

use std::ops::{Deref, DerefMut};

use super::expression::Expression;
use super::operator::ExpressionOperator;

/// Operators that can seed a query, in order of preference
const INITIAL_EXPRESSION_PREFERENCE: [ExpressionOperator; 7] = [
    ExpressionOperator::Equal,
    ExpressionOperator::HasTag,
    ExpressionOperator::Prefix,
    ExpressionOperator::PrefixTag,
    ExpressionOperator::Match,
    ExpressionOperator::MatchTag,
    ExpressionOperator::NotMatch,
];

/// An ordered conjunction of expressions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expressions(Vec<Expression>);

impl Expressions {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort roughly by increasing cost of evaluating each expression as a
    /// filter, then by key, then by value
    pub fn sort_by_filter_order(&mut self) {
        self.0.sort_by(|a, b| {
            a.operator()
                .cost()
                .cmp(&b.operator().cost())
                .then_with(|| a.key().cmp(b.key()))
                .then_with(|| a.value().cmp(b.value()))
        });
    }

    /// Position of the expression best suited to start query execution
    ///
    /// The chosen expression is the cheapest one that requires a non-empty
    /// value, because only those can drive a direct index lookup. Returns
    /// `None` if there is no such expression.
    pub fn find_initial_expression(&self) -> Option<usize> {
        INITIAL_EXPRESSION_PREFERENCE.iter().find_map(|&op| {
            self.0
                .iter()
                .position(|e| e.operator() == op && e.requires_non_empty_value())
        })
    }

    /// Canonical string form of every expression
    pub fn strings(&self) -> Vec<String> {
        let mut builder = String::new();
        self.0
            .iter()
            .map(|e| {
                builder.clear();
                e.string_into_builder(&mut builder);
                builder.clone()
            })
            .collect()
    }

    /// Consume the collection
    pub fn into_inner(self) -> Vec<Expression> {
        self.0
    }
}

impl From<Vec<Expression>> for Expressions {
    fn from(expressions: Vec<Expression>) -> Self {
        Self(expressions)
    }
}

impl FromIterator<Expression> for Expressions {
    fn from_iter<I: IntoIterator<Item = Expression>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Expressions {
    type Item = Expression;
    type IntoIter = std::vec::IntoIter<Expression>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Expressions {
    type Item = &'a Expression;
    type IntoIter = std::slice::Iter<'a, Expression>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Deref for Expressions {
    type Target = Vec<Expression>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Expressions {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
