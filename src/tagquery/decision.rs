//! Filter decisions and the multi-index decision protocol
//!
//! A metric can be described by more than one tag index: the primary metric
//! tag index and any number of meta tag indexes. A filter looks at one index
//! and either comes to a conclusive decision or defers with
//! [`FilterDecision::None`]. [`MetricDefinitionFilters`] walks the filters of
//! all indexes in order of authority and stops at the first conclusive one.

use std::fmt;

/// Outcome of applying one expression to one metric within one index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterDecision {
    /// Inconclusive, another index or the default decision decides
    #[default]
    None,
    /// The metric is excluded from the result set
    Fail,
    /// The metric stays in the result set
    Pass,
}

impl FilterDecision {
    /// Whether this decision is final
    pub fn is_conclusive(self) -> bool {
        self != FilterDecision::None
    }

    /// Resolve an inconclusive decision to `default`
    pub fn or(self, default: FilterDecision) -> FilterDecision {
        match self {
            FilterDecision::None => default,
            decision => decision,
        }
    }

    pub(crate) fn from_bool(pass: bool) -> FilterDecision {
        if pass {
            FilterDecision::Pass
        } else {
            FilterDecision::Fail
        }
    }
}

impl fmt::Display for FilterDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterDecision::None => write!(f, "none"),
            FilterDecision::Fail => write!(f, "fail"),
            FilterDecision::Pass => write!(f, "pass"),
        }
    }
}

/// Decides about a metric definition given its name and its `key=value` tags
///
/// Implementations must be safe to call concurrently from many scan workers.
pub trait MetricDefinitionFilter: Send + Sync {
    /// Apply the filter to one metric definition
    fn filter(&self, name: &str, tags: &[String]) -> FilterDecision;
}

impl<F> MetricDefinitionFilter for F
where
    F: Fn(&str, &[String]) -> FilterDecision + Send + Sync,
{
    fn filter(&self, name: &str, tags: &[String]) -> FilterDecision {
        self(name, tags)
    }
}

/// Filters of one expression across several indexes, ordered by authority
#[derive(Default)]
pub struct MetricDefinitionFilters {
    filters: Vec<Box<dyn MetricDefinitionFilter>>,
}

impl MetricDefinitionFilters {
    /// Create an empty filter list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the filter of the next index in order of authority
    pub fn push(&mut self, filter: impl MetricDefinitionFilter + 'static) {
        self.filters.push(Box::new(filter));
    }

    /// Append an already boxed filter
    pub fn push_boxed(&mut self, filter: Box<dyn MetricDefinitionFilter>) {
        self.filters.push(filter);
    }

    /// Number of filters
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Check if there are no filters
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Returns the first conclusive decision, or `None` if every filter
    /// deferred. Applying the expression's default decision afterwards is up
    /// to the caller.
    pub fn filter(&self, name: &str, tags: &[String]) -> FilterDecision {
        for filter in &self.filters {
            match filter.filter(name, tags) {
                FilterDecision::Fail => return FilterDecision::Fail,
                FilterDecision::Pass => return FilterDecision::Pass,
                FilterDecision::None => {}
            }
        }

        FilterDecision::None
    }

    /// Like [`filter`](Self::filter) but resolves an inconclusive result to
    /// `default`, for callers that have no further index to consult
    pub fn filter_or(
        &self,
        name: &str,
        tags: &[String],
        default: FilterDecision,
    ) -> FilterDecision {
        self.filter(name, tags).or(default)
    }
}

impl fmt::Debug for MetricDefinitionFilters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricDefinitionFilters")
            .field("len", &self.filters.len())
            .finish()
    }
}

impl FromIterator<Box<dyn MetricDefinitionFilter>> for MetricDefinitionFilters {
    fn from_iter<I: IntoIterator<Item = Box<dyn MetricDefinitionFilter>>>(iter: I) -> Self {
        Self {
            filters: iter.into_iter().collect(),
        }
    }
}
