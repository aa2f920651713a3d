//! Concrete visitors.
//!
//! - [`SaveContentVisitor`] / [`RestoreContentVisitor`] move file content to
//!   the snapshot store before an operation and back afterwards
//! - [`SavePropertiesVisitor`] / [`RestorePropertiesVisitor`] capture and
//!   reinstate versioned properties
//! - [`UnversionedPruneVisitor`] clears unversioned leftovers from disk

pub mod content;
pub mod properties;
pub mod prune;

pub use content::{RestoreContentVisitor, SaveContentVisitor};
pub use properties::{RestorePropertiesVisitor, SavePropertiesVisitor};
pub use prune::UnversionedPruneVisitor;

use crate::filter::{Filter, StateFilter};
use crate::resource::{LocalResourceState, ResourceHandle};

/// Deleted, and not coming back as a replacement.
pub(crate) fn deleted_for_good(resource: &ResourceHandle, state: &LocalResourceState) -> bool {
    Filter::Deleted.accept(resource, state) && !Filter::PrereplacedReplaced.accept(resource, state)
}
