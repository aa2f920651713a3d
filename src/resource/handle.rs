//! Resource identity.

use std::fmt;
use std::path::{Path, PathBuf};

/// Whether a resource is a file or a container (directory).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    /// A regular file.
    File,
    /// A directory.
    Container,
}

/// How far below a resource an operation reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Depth {
    /// Only the resource itself.
    NodeOnly,
    /// The resource and its direct children.
    ImmediateChildren,
    /// The resource and its whole subtree.
    Infinite,
}

impl Depth {
    /// Depth to use when descending one level.
    ///
    /// Returns `None` once no further descent is allowed.
    pub fn descend(self) -> Option<Depth> {
        match self {
            Depth::NodeOnly => None,
            Depth::ImmediateChildren => Some(Depth::NodeOnly),
            Depth::Infinite => Some(Depth::Infinite),
        }
    }
}

/// A tracked node of a working copy.
///
/// Handles are identified by their full path and kind; the parent is derived
/// from the path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceHandle {
    path: PathBuf,
    kind: ResourceKind,
}

impl ResourceHandle {
    /// Create a handle.
    pub fn new(path: impl Into<PathBuf>, kind: ResourceKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Create a file handle.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ResourceKind::File)
    }

    /// Create a container handle.
    pub fn container(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ResourceKind::Container)
    }

    /// Full path of the resource.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Kind of the resource.
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Whether this is a file.
    pub fn is_file(&self) -> bool {
        self.kind == ResourceKind::File
    }

    /// Whether this is a container.
    pub fn is_container(&self) -> bool {
        self.kind == ResourceKind::Container
    }

    /// Last path segment, or an empty string for roots.
    pub fn name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }

    /// The containing resource, if any.
    pub fn parent(&self) -> Option<ResourceHandle> {
        self.path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(ResourceHandle::container)
    }

    /// Handle for a named child of this container.
    pub fn child(&self, name: &str, kind: ResourceKind) -> ResourceHandle {
        ResourceHandle::new(self.path.join(name), kind)
    }

    /// Whether `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &ResourceHandle) -> bool {
        other.path != self.path && other.path.starts_with(&self.path)
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
