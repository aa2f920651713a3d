//! Per-resource change records and the tree they form.

use std::path::{Path, PathBuf};

use tracing::{debug, error};

use crate::connector::{Connector, ResourceTree};
use crate::error::{Result, RevkeepError};
use crate::resource::{Depth, LocalResourceState, Property, ResourceHandle};

/// What is known about one resource around a mutating operation.
///
/// `local` is the state recorded when the operation began. Restore visitors
/// treat it as the state the resource must end up in and compare it with a
/// fresh classification taken after the operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeDescription {
    resource: ResourceHandle,
    local: LocalResourceState,
    temporary: Option<PathBuf>,
    properties: Option<Vec<Property>>,
}

impl ChangeDescription {
    /// Record a resource in the given state, with nothing captured yet.
    pub fn new(resource: ResourceHandle, local: LocalResourceState) -> Self {
        Self {
            resource,
            local,
            temporary: None,
            properties: None,
        }
    }

    /// The resource described.
    pub fn resource(&self) -> &ResourceHandle {
        &self.resource
    }

    /// State recorded before the operation.
    pub fn local(&self) -> &LocalResourceState {
        &self.local
    }

    /// Where the pre-operation content currently lives, if captured.
    pub fn temporary(&self) -> Option<&Path> {
        self.temporary.as_deref()
    }

    /// Captured properties, if any.
    pub fn properties(&self) -> Option<&[Property]> {
        self.properties.as_deref()
    }

    /// Attach a content snapshot.
    ///
    /// Only files carry content, and a description holds at most one
    /// snapshot at a time.
    pub fn set_temporary(&mut self, path: PathBuf) -> Result<()> {
        if !self.resource.is_file() {
            return Err(RevkeepError::SnapshotFailed {
                path: self.resource.path().to_path_buf(),
                message: "containers carry no content snapshot".to_string(),
            });
        }
        if let Some(existing) = &self.temporary {
            return Err(RevkeepError::SnapshotFailed {
                path: self.resource.path().to_path_buf(),
                message: format!("already snapshotted to {}", existing.display()),
            });
        }
        self.temporary = Some(path);
        Ok(())
    }

    /// Detach the content snapshot, handing its ownership to the caller.
    pub fn take_temporary(&mut self) -> Option<PathBuf> {
        self.temporary.take()
    }

    /// Store captured properties, replacing any previous capture.
    pub fn set_properties(&mut self, properties: Vec<Property>) {
        self.properties = Some(properties);
    }

    /// Detach the captured properties.
    pub fn take_properties(&mut self) -> Option<Vec<Property>> {
        self.properties.take()
    }
}

/// A description and the descriptions of its children.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeNode {
    pub description: ChangeDescription,
    pub children: Vec<ChangeNode>,
}

impl ChangeNode {
    /// A leaf node.
    pub fn new(description: ChangeDescription) -> Self {
        Self {
            description,
            children: Vec::new(),
        }
    }

    /// Append a child node.
    pub fn with_child(mut self, child: ChangeNode) -> Self {
        self.children.push(child);
        self
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a ChangeDescription>) {
        out.push(&self.description);
        for child in &self.children {
            child.collect(out);
        }
    }
}

/// The change model of one operation: a tree of [`ChangeDescription`]s.
///
/// A tree must be ended with [`dispose`](ChangeTree::dispose), which reports
/// snapshots that were never consumed. Dropping an undisposed tree that still
/// holds snapshots logs them as errors.
#[derive(Debug)]
pub struct ChangeTree {
    root: ChangeNode,
    disposed: bool,
}

impl ChangeTree {
    /// Wrap an already built node tree.
    pub fn new(root: ChangeNode) -> Self {
        Self {
            root,
            disposed: false,
        }
    }

    /// Classify `root` and everything below it down to `depth`.
    ///
    /// Unsupervised resources are left out, and ignored containers are
    /// recorded without their contents.
    pub fn wrap(
        root: ResourceHandle,
        connector: &dyn Connector,
        tree: &dyn ResourceTree,
        depth: Depth,
    ) -> Result<Self> {
        let root = wrap_node(root, connector, tree, depth)?;
        Ok(Self::new(root))
    }

    /// Root node.
    pub fn root(&self) -> &ChangeNode {
        &self.root
    }

    /// Root node, mutably.
    pub fn root_mut(&mut self) -> &mut ChangeNode {
        &mut self.root
    }

    /// All descriptions, each ancestor before its descendants.
    pub fn descriptions(&self) -> Vec<&ChangeDescription> {
        let mut out = Vec::new();
        self.root.collect(&mut out);
        out
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.descriptions().len()
    }

    /// Always false: a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Description of the resource at `path`.
    pub fn find(&self, path: &Path) -> Option<&ChangeDescription> {
        self.descriptions()
            .into_iter()
            .find(|d| d.resource().path() == path)
    }

    /// Resources whose content snapshot has not been consumed, with the
    /// snapshot paths.
    pub fn pending_snapshots(&self) -> Vec<(PathBuf, PathBuf)> {
        self.descriptions()
            .into_iter()
            .filter_map(|d| {
                d.temporary()
                    .map(|t| (d.resource().path().to_path_buf(), t.to_path_buf()))
            })
            .collect()
    }

    /// End the change model.
    ///
    /// Snapshots still held at this point are never deleted; they are listed
    /// in a [`RevkeepError::LeakedSnapshots`] so the user can recover them.
    pub fn dispose(mut self) -> Result<()> {
        self.disposed = true;
        let pending = self.pending_snapshots();
        if pending.is_empty() {
            return Ok(());
        }

        let listing = pending
            .iter()
            .map(|(path, temp)| format!("{} -> {}", path.display(), temp.display()))
            .collect::<Vec<_>>()
            .join(", ");
        error!("Unrestored snapshots: {}", listing);
        Err(RevkeepError::LeakedSnapshots {
            count: pending.len(),
            listing,
        })
    }
}

impl Drop for ChangeTree {
    fn drop(&mut self) {
        if self.disposed {
            return;
        }
        for (path, temp) in self.pending_snapshots() {
            error!(
                "Change model dropped while {} was only in {}",
                path.display(),
                temp.display()
            );
        }
    }
}

fn wrap_node(
    resource: ResourceHandle,
    connector: &dyn Connector,
    tree: &dyn ResourceTree,
    depth: Depth,
) -> Result<ChangeNode> {
    let local = connector.classify(&resource)?;
    debug!("Recorded {} as {}", resource, local.status);

    let mut node = ChangeNode::new(ChangeDescription::new(resource.clone(), local));

    if !resource.is_container() || tree.is_ignored(&resource) {
        return Ok(node);
    }
    let Some(next) = depth.descend() else {
        return Ok(node);
    };

    for child in tree.children(&resource)? {
        if !tree.is_supervised(&child) {
            continue;
        }
        node.children.push(wrap_node(child, connector, tree, next)?);
    }
    Ok(node)
}
