//! AND/OR/NOT composition of state filters.
//!
//! Only `accept` follows the boolean operator. `allows_recursion` is the OR of
//! every branch for all three combinators: a traversal must descend as soon
//! as any branch could select a descendant.

use crate::resource::{LocalResourceState, ResourceHandle};

use super::StateFilter;

/// A composed filter.
pub enum CompositeFilter {
    /// Accepts when every branch accepts.
    And(Vec<Box<dyn StateFilter>>),
    /// Accepts when any branch accepts.
    Or(Vec<Box<dyn StateFilter>>),
    /// Accepts when the inner filter rejects.
    Not(Box<dyn StateFilter>),
}

/// Filter accepting resources that every filter accepts.
pub fn all_of(filters: Vec<Box<dyn StateFilter>>) -> CompositeFilter {
    CompositeFilter::And(filters)
}

/// Filter accepting resources that any filter accepts.
pub fn any_of(filters: Vec<Box<dyn StateFilter>>) -> CompositeFilter {
    CompositeFilter::Or(filters)
}

/// Filter accepting resources that `filter` rejects.
pub fn negate(filter: impl StateFilter + 'static) -> CompositeFilter {
    CompositeFilter::Not(Box::new(filter))
}

impl StateFilter for CompositeFilter {
    fn accept(&self, resource: &ResourceHandle, state: &LocalResourceState) -> bool {
        match self {
            CompositeFilter::And(filters) => filters.iter().all(|f| f.accept(resource, state)),
            CompositeFilter::Or(filters) => filters.iter().any(|f| f.accept(resource, state)),
            CompositeFilter::Not(filter) => !filter.accept(resource, state),
        }
    }

    fn allows_recursion(&self, resource: &ResourceHandle, state: &LocalResourceState) -> bool {
        match self {
            CompositeFilter::And(filters) | CompositeFilter::Or(filters) => filters
                .iter()
                .any(|f| f.allows_recursion(resource, state)),
            CompositeFilter::Not(filter) => filter.allows_recursion(resource, state),
        }
    }
}

impl std::fmt::Debug for CompositeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompositeFilter::And(filters) => write!(f, "And({} filters)", filters.len()),
            CompositeFilter::Or(filters) => write!(f, "Or({} filters)", filters.len()),
            CompositeFilter::Not(_) => write!(f, "Not(..)"),
        }
    }
}
