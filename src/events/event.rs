//! Depth-scoped change notifications.

use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use tracing::warn;

use crate::connector::ResourceTree;
use crate::error::Result;
use crate::resource::{Depth, ResourceHandle};

/// What changed about the resources of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Content or status changed, the tree shape did not.
    ContentChanged,
    /// Resources were added, removed or moved.
    StructureChanged,
}

/// A batch of changed resources, each reaching `depth` below itself.
///
/// Resources are kept sorted with every ancestor before its descendants, and
/// without duplicates. Events are values: merging builds a new event. Equality
/// and hashing look at the depth, the kind and the resource set only.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    resources: Vec<ResourceHandle>,
    depth: Depth,
    kind: EventKind,
    full_set: OnceLock<Vec<ResourceHandle>>,
}

impl ChangeEvent {
    /// Create an event.
    pub fn new(
        resources: impl IntoIterator<Item = ResourceHandle>,
        depth: Depth,
        kind: EventKind,
    ) -> Self {
        let mut resources: Vec<ResourceHandle> = resources.into_iter().collect();
        // Path ordering compares components, so a prefix sorts first.
        resources.sort();
        resources.dedup();

        Self {
            resources,
            depth,
            kind,
            full_set: OnceLock::new(),
        }
    }

    /// Changed resources, ancestors first.
    pub fn resources(&self) -> &[ResourceHandle] {
        &self.resources
    }

    /// How far below each resource the change reaches.
    pub fn depth(&self) -> Depth {
        self.depth
    }

    /// What changed.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Every resource covered by the event, walking `tree` on first use.
    ///
    /// Unsupervised resources and ignored containers are left out together
    /// with everything below them. If the walk fails the root list is used
    /// instead. The result is computed once per event.
    pub fn full_set(&self, tree: &dyn ResourceTree) -> &[ResourceHandle] {
        self.full_set.get_or_init(|| {
            let mut out = Vec::new();
            let walked = self
                .resources
                .iter()
                .try_for_each(|root| collect(tree, root, self.depth, &mut out));
            match walked {
                Ok(()) => {
                    out.sort();
                    out.dedup();
                    out
                }
                Err(e) => {
                    warn!(
                        "Falling back to {} root(s) of a change event: {}",
                        self.resources.len(),
                        e
                    );
                    self.resources.clone()
                }
            }
        })
    }

    /// Whether the event covers `resource`.
    ///
    /// Checked from cheapest to most expensive: membership in the root list,
    /// then the parent's membership unless the depth is
    /// [`Depth::NodeOnly`], then any root being a path prefix when the depth
    /// is [`Depth::Infinite`].
    pub fn contains(&self, resource: &ResourceHandle) -> bool {
        let path = resource.path();
        if self.resources.iter().any(|r| r.path() == path) {
            return true;
        }
        if self.depth == Depth::NodeOnly {
            return false;
        }
        if let Some(parent) = path.parent() {
            if self.resources.iter().any(|r| r.path() == parent) {
                return true;
            }
        }
        self.depth == Depth::Infinite && self.resources.iter().any(|r| path.starts_with(r.path()))
    }

    /// Events are freshness hints and may always be dropped.
    pub fn can_skip(&self) -> bool {
        true
    }

    /// Whether `other` can be folded into this event.
    pub fn can_merge(&self, other: &ChangeEvent) -> bool {
        self.depth == other.depth && self.kind == other.kind
    }

    /// A new event holding the resources of both.
    ///
    /// Depth and kind are taken from `self`; check
    /// [`can_merge`](ChangeEvent::can_merge) first.
    pub fn merge(&self, other: &ChangeEvent) -> ChangeEvent {
        ChangeEvent::new(
            self.resources.iter().chain(&other.resources).cloned(),
            self.depth,
            self.kind,
        )
    }
}

fn collect(
    tree: &dyn ResourceTree,
    resource: &ResourceHandle,
    depth: Depth,
    out: &mut Vec<ResourceHandle>,
) -> Result<()> {
    if !tree.is_supervised(resource) {
        return Ok(());
    }
    // Ignore rules are only consulted for containers; files inherit them.
    if resource.is_container() && tree.is_ignored(resource) {
        return Ok(());
    }

    out.push(resource.clone());

    if !resource.is_container() {
        return Ok(());
    }
    if let Some(next) = depth.descend() {
        for child in tree.children(resource)? {
            collect(tree, &child, next, out)?;
        }
    }
    Ok(())
}

impl PartialEq for ChangeEvent {
    fn eq(&self, other: &Self) -> bool {
        self.depth == other.depth && self.kind == other.kind && self.resources == other.resources
    }
}

impl Eq for ChangeEvent {}

impl Hash for ChangeEvent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.depth.hash(state);
        self.kind.hash(state);
        self.resources.hash(state);
    }
}
