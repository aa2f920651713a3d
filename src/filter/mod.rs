//! State filters.
//!
//! A state filter is a pure predicate pair over a resource and its
//! [`LocalResourceState`]:
//!
//! - [`StateFilter::accept`] decides whether the resource is selected
//! - [`StateFilter::allows_recursion`] decides whether a traversal should
//!   descend into it
//!
//! Named filters live in [`Filter`]; [`all_of`], [`any_of`] and [`negate`]
//! compose them. Composition always ORs the recursion predicates of its
//! branches, so a traversal descends as soon as any branch wants to see the
//! descendants.
//!
//! # Example
//!
//! ```
//! use revkeep::filter::{all_of, negate, Filter, StateFilter};
//! use revkeep::resource::{LocalResourceState, ResourceHandle, Status};
//!
//! let deleted_for_good = all_of(vec![
//!     Box::new(Filter::Deleted) as Box<dyn StateFilter>,
//!     Box::new(negate(Filter::PrereplacedReplaced)),
//! ]);
//!
//! let file = ResourceHandle::file("/wc/a.txt");
//! assert!(deleted_for_good.accept(&file, &LocalResourceState::new(Status::Deleted)));
//! assert!(!deleted_for_good.accept(&file, &LocalResourceState::new(Status::Replaced)));
//! ```

pub mod composite;
pub mod named;

pub use composite::{all_of, any_of, negate, CompositeFilter};
pub use named::Filter;

use crate::resource::{LocalResourceState, ResourceHandle};

/// A predicate over a resource's version-control state.
pub trait StateFilter: Send + Sync {
    /// Whether the resource is selected by this filter.
    fn accept(&self, resource: &ResourceHandle, state: &LocalResourceState) -> bool;

    /// Whether a traversal should descend into the resource.
    fn allows_recursion(&self, resource: &ResourceHandle, state: &LocalResourceState) -> bool;
}

impl<F: StateFilter + ?Sized> StateFilter for Box<F> {
    fn accept(&self, resource: &ResourceHandle, state: &LocalResourceState) -> bool {
        (**self).accept(resource, state)
    }

    fn allows_recursion(&self, resource: &ResourceHandle, state: &LocalResourceState) -> bool {
        (**self).allows_recursion(resource, state)
    }
}
