//! Change tracking around mutating working-copy operations.
//!
//! This module provides:
//! - [`ChangeDescription`] and [`ChangeTree`], the per-operation change model
//! - [`ChangeVisitor`] and [`CompositeVisitor`], run over the model by
//!   [`pipeline::run`]
//! - the concrete snapshot and restore steps in [`visitors`]
//! - [`SnapshotStore`] and [`move_or_copy`] for content moves
//! - [`ChangeGuard`], which ties them together around one operation

pub mod description;
pub mod guard;
pub mod pipeline;
pub mod snapshot_store;
pub mod transfer;
pub mod visitor;
pub mod visitors;

pub use description::{ChangeDescription, ChangeNode, ChangeTree};
pub use guard::ChangeGuard;
pub use pipeline::{run, TraversalSummary};
pub use snapshot_store::SnapshotStore;
pub use transfer::{move_or_copy, FileSystem, MoveOutcome, StdFileSystem};
pub use visitor::{ChangeVisitor, CompositeVisitor};
pub use visitors::{
    RestoreContentVisitor, RestorePropertiesVisitor, SaveContentVisitor, SavePropertiesVisitor,
    UnversionedPruneVisitor,
};
