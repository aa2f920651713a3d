//! Version-control classification of a resource.
//!
//! A [`LocalResourceState`] is produced once per resource by the storage
//! layer (see [`Connector::classify`](crate::connector::Connector::classify))
//! and read by state filters and visitors. It is never modified by this crate.

use std::fmt;
use std::ops::BitOr;

/// Closed classification of a resource's version-control status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// The status could not be determined.
    InternalInvalid,
    /// Unknown to version control and absent from disk.
    NotExists,
    /// Unversioned and matched by an ignore rule.
    Ignored,
    /// Unversioned, not ignored.
    New,
    /// Scheduled for addition.
    Added,
    /// Versioned and unchanged.
    Normal,
    /// Versioned with local modifications.
    Modified,
    /// Versioned with unresolved conflicts.
    Conflicting,
    /// Scheduled for deletion.
    Deleted,
    /// Versioned but absent from disk.
    Missing,
    /// An unversioned node of a different kind sits where a versioned one is expected.
    Obstructed,
    /// Deleted in version control and recreated on disk, not yet re-added.
    Prereplaced,
    /// Deleted and re-added in one change.
    Replaced,
    /// A linked resource that lives outside the working copy.
    Linked,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::InternalInvalid => "internal-invalid",
            Status::NotExists => "not-exists",
            Status::Ignored => "ignored",
            Status::New => "new",
            Status::Added => "added",
            Status::Normal => "normal",
            Status::Modified => "modified",
            Status::Conflicting => "conflicting",
            Status::Deleted => "deleted",
            Status::Missing => "missing",
            Status::Obstructed => "obstructed",
            Status::Prereplaced => "prereplaced",
            Status::Replaced => "replaced",
            Status::Linked => "linked",
        };
        write!(f, "{}", s)
    }
}

/// Additional per-resource flags reported alongside the [`Status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChangeMask(u32);

impl ChangeMask {
    /// No flags.
    pub const NONE: ChangeMask = ChangeMask(0);
    /// Added with history.
    pub const COPIED: ChangeMask = ChangeMask(1);
    /// Participates in a tree conflict.
    pub const TREE_CONFLICT: ChangeMask = ChangeMask(1 << 1);
    /// Switched to a different repository location.
    pub const SWITCHED: ChangeMask = ChangeMask(1 << 2);
    /// Locked in the repository.
    pub const LOCKED: ChangeMask = ChangeMask(1 << 3);
    /// Root of an externals definition.
    pub const SVN_EXTERNALS: ChangeMask = ChangeMask(1 << 4);
    /// Must never be added to version control.
    pub const FORBIDDEN: ChangeMask = ChangeMask(1 << 5);
    /// Tree conflict whose node kind could not be determined.
    pub const TREE_CONFLICT_UNKNOWN_NODE_KIND: ChangeMask = ChangeMask(1 << 6);

    /// Raw bits.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Whether every flag of `other` is set.
    pub fn contains(self, other: ChangeMask) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ChangeMask {
    type Output = ChangeMask;

    fn bitor(self, rhs: ChangeMask) -> ChangeMask {
        ChangeMask(self.0 | rhs.0)
    }
}

/// Operation that produced a tree conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictOperation {
    None,
    Update,
    Switch,
    Merge,
}

/// Incoming change that collided with the local one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictAction {
    Modify,
    Add,
    Delete,
    Replace,
}

/// Local change that the incoming one collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictReason {
    Modified,
    Obstructed,
    Deleted,
    Missing,
    Unversioned,
    Added,
    Replaced,
    MovedAway,
    MovedHere,
}

/// Description of a tree conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeConflict {
    pub operation: ConflictOperation,
    pub action: ConflictAction,
    pub reason: ConflictReason,
}

impl TreeConflict {
    /// Create a conflict descriptor.
    pub fn new(operation: ConflictOperation, action: ConflictAction, reason: ConflictReason) -> Self {
        Self {
            operation,
            action,
            reason,
        }
    }
}

/// Snapshot of a resource's version-control state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalResourceState {
    /// Combined status used by filters.
    pub status: Status,
    /// Status of the content.
    pub text_status: Status,
    /// Status of the properties.
    pub property_status: Status,
    /// Base revision, when versioned.
    pub revision: Option<u64>,
    /// Additional flags.
    pub mask: ChangeMask,
    /// Tree conflict descriptor, when conflicted.
    pub tree_conflict: Option<TreeConflict>,
}

impl LocalResourceState {
    /// State with the given status for both content and combined status.
    pub fn new(status: Status) -> Self {
        Self {
            status,
            text_status: status,
            property_status: Status::Normal,
            revision: None,
            mask: ChangeMask::NONE,
            tree_conflict: None,
        }
    }

    /// State of a resource unknown to version control.
    pub fn not_exists() -> Self {
        Self::new(Status::NotExists)
    }

    /// Set the revision.
    pub fn with_revision(mut self, revision: u64) -> Self {
        self.revision = Some(revision);
        self
    }

    /// Add flags to the mask.
    pub fn with_mask(mut self, mask: ChangeMask) -> Self {
        self.mask = self.mask | mask;
        self
    }

    /// Set the property status.
    pub fn with_property_status(mut self, status: Status) -> Self {
        self.property_status = status;
        self
    }

    /// Attach a tree conflict descriptor.
    pub fn with_tree_conflict(mut self, conflict: TreeConflict) -> Self {
        self.tree_conflict = Some(conflict);
        self.mask = self.mask | ChangeMask::TREE_CONFLICT;
        self
    }

    /// Whether the resource participates in a tree conflict.
    pub fn has_tree_conflict(&self) -> bool {
        self.tree_conflict.is_some() || self.mask.contains(ChangeMask::TREE_CONFLICT)
    }

    /// Whether the resource was added with history.
    pub fn is_copied(&self) -> bool {
        self.mask.contains(ChangeMask::COPIED)
    }
}

/// A versioned property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Property {
    pub name: String,
    pub value: String,
}

impl Property {
    /// Create a property.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
