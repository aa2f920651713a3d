//! In-memory working copy for tests.
//!
//! `MockWorkingCopy` implements [`Connector`] and [`ResourceTree`] over a map
//! of registered resources and records every operation applied to it. Content
//! is not modelled: tests keep real files in a temporary directory and use the
//! mock for version-control state and properties.
//!
//! # Example
//!
//! ```
//! use revkeep::connector::{Connector, MockWorkingCopy, Operation};
//! use revkeep::resource::{LocalResourceState, Property, ResourceHandle, Status};
//!
//! let wc = MockWorkingCopy::new();
//! let file = ResourceHandle::file("/wc/a.txt");
//! wc.register(&file, LocalResourceState::new(Status::Normal));
//! wc.set_properties(&file, vec![Property::new("x", "1")]);
//!
//! wc.add(&ResourceHandle::file("/wc/b.txt")).unwrap();
//!
//! assert_eq!(wc.properties(&file).unwrap().len(), 1);
//! assert_eq!(
//!     wc.operations(),
//!     vec![Operation::AddToVersionControl(ResourceHandle::file("/wc/b.txt"))]
//! );
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::{Result, RevkeepError};
use crate::resource::{LocalResourceState, Property, ResourceHandle, Status};

use super::{Connector, Operation, ResourceTree};

#[derive(Debug, Default)]
struct Inner {
    resources: BTreeMap<PathBuf, (ResourceHandle, LocalResourceState)>,
    properties: HashMap<PathBuf, Vec<Property>>,
    operations: Vec<Operation>,
    unsupervised: HashSet<PathBuf>,
    ignored: HashSet<PathBuf>,
    failing: HashSet<String>,
    children_calls: usize,
}

/// In-memory [`Connector`] and [`ResourceTree`].
#[derive(Debug, Default)]
pub struct MockWorkingCopy {
    inner: Mutex<Inner>,
}

impl MockWorkingCopy {
    /// Create an empty working copy.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking test thread must not hide the recorded state from others.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register (or re-classify) a resource.
    pub fn register(&self, resource: &ResourceHandle, state: LocalResourceState) {
        self.lock().resources.insert(
            resource.path().to_path_buf(),
            (resource.clone(), state),
        );
    }

    /// Replace the stored properties of a resource.
    pub fn set_properties(&self, resource: &ResourceHandle, properties: Vec<Property>) {
        self.lock()
            .properties
            .insert(resource.path().to_path_buf(), properties);
    }

    /// Stored properties of a resource.
    pub fn properties_of(&self, resource: &ResourceHandle) -> Vec<Property> {
        self.lock()
            .properties
            .get(resource.path())
            .cloned()
            .unwrap_or_default()
    }

    /// Current state of a resource.
    pub fn state_of(&self, resource: &ResourceHandle) -> LocalResourceState {
        self.lock()
            .resources
            .get(resource.path())
            .map(|(_, state)| state.clone())
            .unwrap_or_else(LocalResourceState::not_exists)
    }

    /// Mark a resource as outside version-control supervision.
    pub fn unsupervise(&self, resource: &ResourceHandle) {
        self.lock()
            .unsupervised
            .insert(resource.path().to_path_buf());
    }

    /// Mark a container as ignored.
    pub fn ignore(&self, resource: &ResourceHandle) {
        self.lock().ignored.insert(resource.path().to_path_buf());
    }

    /// Make every call of the named primitive fail.
    ///
    /// Names: `classify`, `properties`, `children`, and the operation names
    /// `add`, `delete`, `set-property`, `remove-property`.
    pub fn fail_operation(&self, name: &str) {
        self.lock().failing.insert(name.to_string());
    }

    /// Operations applied so far, in order.
    pub fn operations(&self) -> Vec<Operation> {
        self.lock().operations.clone()
    }

    /// Applied adds and deletes, in order.
    pub fn structural_operations(&self) -> Vec<Operation> {
        self.operations()
            .into_iter()
            .filter(Operation::is_structural)
            .collect()
    }

    /// Number of times [`ResourceTree::children`] was called.
    pub fn children_calls(&self) -> usize {
        self.lock().children_calls
    }

    fn check(inner: &Inner, name: &str, path: &Path) -> Result<()> {
        if inner.failing.contains(name) {
            return Err(RevkeepError::Connector {
                path: path.to_path_buf(),
                message: format!("{} rejected", name),
            });
        }
        Ok(())
    }
}

impl Connector for MockWorkingCopy {
    fn classify(&self, resource: &ResourceHandle) -> Result<LocalResourceState> {
        let inner = self.lock();
        Self::check(&inner, "classify", resource.path())?;
        Ok(inner
            .resources
            .get(resource.path())
            .map(|(_, state)| state.clone())
            .unwrap_or_else(LocalResourceState::not_exists))
    }

    fn properties(&self, resource: &ResourceHandle) -> Result<Vec<Property>> {
        let inner = self.lock();
        Self::check(&inner, "properties", resource.path())?;
        Ok(inner
            .properties
            .get(resource.path())
            .cloned()
            .unwrap_or_default())
    }

    fn set_property(&self, resource: &ResourceHandle, property: &Property) -> Result<()> {
        let mut inner = self.lock();
        Self::check(&inner, "set-property", resource.path())?;

        let properties = inner
            .properties
            .entry(resource.path().to_path_buf())
            .or_default();
        match properties.iter_mut().find(|p| p.name == property.name) {
            Some(existing) => existing.value = property.value.clone(),
            None => properties.push(property.clone()),
        }

        inner.operations.push(Operation::SetProperty {
            resource: resource.clone(),
            property: property.clone(),
        });
        Ok(())
    }

    fn remove_property(&self, resource: &ResourceHandle, name: &str) -> Result<()> {
        let mut inner = self.lock();
        Self::check(&inner, "remove-property", resource.path())?;

        if let Some(properties) = inner.properties.get_mut(resource.path()) {
            properties.retain(|p| p.name != name);
        }

        inner.operations.push(Operation::RemoveProperty {
            resource: resource.clone(),
            name: name.to_string(),
        });
        Ok(())
    }

    fn add(&self, resource: &ResourceHandle) -> Result<()> {
        let mut inner = self.lock();
        Self::check(&inner, "add", resource.path())?;

        let status = match inner.resources.get(resource.path()) {
            Some((_, state)) if state.status == Status::Deleted => Status::Replaced,
            _ => Status::Added,
        };
        inner.resources.insert(
            resource.path().to_path_buf(),
            (resource.clone(), LocalResourceState::new(status)),
        );

        inner
            .operations
            .push(Operation::AddToVersionControl(resource.clone()));
        Ok(())
    }

    fn delete(&self, resource: &ResourceHandle) -> Result<()> {
        let mut inner = self.lock();
        Self::check(&inner, "delete", resource.path())?;

        inner.resources.insert(
            resource.path().to_path_buf(),
            (resource.clone(), LocalResourceState::new(Status::Deleted)),
        );

        inner
            .operations
            .push(Operation::DeleteFromVersionControl(resource.clone()));
        Ok(())
    }
}

impl ResourceTree for MockWorkingCopy {
    fn children(&self, resource: &ResourceHandle) -> Result<Vec<ResourceHandle>> {
        let mut inner = self.lock();
        inner.children_calls += 1;
        Self::check(&inner, "children", resource.path())?;

        Ok(inner
            .resources
            .values()
            .filter(|(handle, _)| handle.path().parent() == Some(resource.path()))
            .map(|(handle, _)| handle.clone())
            .collect())
    }

    fn is_supervised(&self, resource: &ResourceHandle) -> bool {
        !self.lock().unsupervised.contains(resource.path())
    }

    fn is_ignored(&self, resource: &ResourceHandle) -> bool {
        self.lock().ignored.contains(resource.path())
    }
}
