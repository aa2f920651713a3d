//! Resource identity and version-control classification.
//!
//! - [`ResourceHandle`] identifies a file or container in a working copy
//! - [`LocalResourceState`] is the classification produced by the storage layer
//! - [`FsResourceTree`] walks a working copy on disk

pub mod fs_tree;
pub mod handle;
pub mod state;

pub use fs_tree::FsResourceTree;
pub use handle::{Depth, ResourceHandle, ResourceKind};
pub use state::{
    ChangeMask, ConflictAction, ConflictOperation, ConflictReason, LocalResourceState, Property,
    Status, TreeConflict,
};
