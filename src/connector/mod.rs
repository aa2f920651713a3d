//! Collaborators consumed by the change-tracking core.
//!
//! This module provides:
//! - [`Connector`] for status classification, property access and
//!   add/delete primitives of the version-control client
//! - [`ResourceTree`] for walking a working copy
//! - [`Operation`] and [`OperationProcessor`] for follow-up operations issued
//!   by visitors
//! - [`ProgressMonitor`] for cooperative cancellation
//!
//! Collaborators are handed to the components that need them at construction
//! time; nothing here is looked up globally.

pub mod mock;
pub mod processor;
pub mod progress;

pub use mock::MockWorkingCopy;
pub use processor::ConnectorProcessor;
pub use progress::{CancellationToken, NullProgress, ProgressMonitor};

use std::fmt;
use std::path::Path;

use crate::error::Result;
use crate::resource::{LocalResourceState, Property, ResourceHandle};

/// Version-control client primitives.
pub trait Connector: Send + Sync {
    /// Classify the current state of a resource.
    fn classify(&self, resource: &ResourceHandle) -> Result<LocalResourceState>;

    /// Current versioned properties of a resource, in stored order.
    fn properties(&self, resource: &ResourceHandle) -> Result<Vec<Property>>;

    /// Set (or overwrite) a property.
    fn set_property(&self, resource: &ResourceHandle, property: &Property) -> Result<()>;

    /// Remove a property.
    fn remove_property(&self, resource: &ResourceHandle, name: &str) -> Result<()>;

    /// Schedule a resource for addition.
    fn add(&self, resource: &ResourceHandle) -> Result<()>;

    /// Schedule a resource for deletion.
    fn delete(&self, resource: &ResourceHandle) -> Result<()>;
}

/// Structure of a working copy.
pub trait ResourceTree: Send + Sync {
    /// Direct children of a container, sorted by path.
    fn children(&self, resource: &ResourceHandle) -> Result<Vec<ResourceHandle>>;

    /// Whether the resource is under version-control supervision at all.
    fn is_supervised(&self, _resource: &ResourceHandle) -> bool {
        true
    }

    /// Whether the resource is matched by an ignore rule.
    ///
    /// Only ever asked about containers.
    fn is_ignored(&self, _resource: &ResourceHandle) -> bool {
        false
    }
}

/// A follow-up operation issued by a visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Schedule the resource for addition.
    AddToVersionControl(ResourceHandle),
    /// Schedule the resource for deletion.
    DeleteFromVersionControl(ResourceHandle),
    /// Set a property on the resource.
    SetProperty {
        resource: ResourceHandle,
        property: Property,
    },
    /// Remove a property from the resource.
    RemoveProperty {
        resource: ResourceHandle,
        name: String,
    },
}

impl Operation {
    /// Resource the operation applies to.
    pub fn resource(&self) -> &ResourceHandle {
        match self {
            Operation::AddToVersionControl(resource)
            | Operation::DeleteFromVersionControl(resource)
            | Operation::SetProperty { resource, .. }
            | Operation::RemoveProperty { resource, .. } => resource,
        }
    }

    /// Path of the resource the operation applies to.
    pub fn path(&self) -> &Path {
        self.resource().path()
    }

    /// Short name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::AddToVersionControl(_) => "add",
            Operation::DeleteFromVersionControl(_) => "delete",
            Operation::SetProperty { .. } => "set-property",
            Operation::RemoveProperty { .. } => "remove-property",
        }
    }

    /// Whether this is an add or delete (as opposed to a property write).
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Operation::AddToVersionControl(_) | Operation::DeleteFromVersionControl(_)
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.path().display())
    }
}

/// Dispatches follow-up operations on behalf of visitors.
pub trait OperationProcessor {
    /// Run an operation.
    fn do_operation(&mut self, operation: Operation, progress: &dyn ProgressMonitor)
        -> Result<()>;
}
