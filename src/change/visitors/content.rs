//! File content snapshot and restore.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::change::transfer::{move_or_copy, FileSystem, MoveOutcome, StdFileSystem};
use crate::change::{ChangeDescription, ChangeVisitor, SnapshotStore};
use crate::connector::{Connector, Operation, OperationProcessor, ProgressMonitor};
use crate::error::{Result, RevkeepError};
use crate::filter::{Filter, StateFilter};
use crate::resource::{LocalResourceState, ResourceHandle};

use super::deleted_for_good;

/// Reject file written next to directory conflicts. It carries no content
/// worth keeping.
const DIR_CONFLICT_REJECT: &str = "dir_conflicts.prej";

/// Moves file content into a [`SnapshotStore`] before an operation.
pub struct SaveContentVisitor {
    store: Arc<SnapshotStore>,
    fs: Arc<dyn FileSystem>,
}

impl SaveContentVisitor {
    /// Snapshot into `store` using the real filesystem.
    pub fn new(store: Arc<SnapshotStore>) -> Self {
        Self {
            store,
            fs: Arc::new(StdFileSystem),
        }
    }

    /// Use a different filesystem implementation.
    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    fn skips(resource: &ResourceHandle, state: &LocalResourceState) -> bool {
        if deleted_for_good(resource, state) {
            return true;
        }
        resource.name() == DIR_CONFLICT_REJECT && Filter::Unversioned.accept(resource, state)
    }
}

impl ChangeVisitor for SaveContentVisitor {
    fn name(&self) -> &str {
        "save-content"
    }

    fn pre_visit(
        &self,
        change: &mut ChangeDescription,
        _processor: &mut dyn OperationProcessor,
        _progress: &dyn ProgressMonitor,
    ) -> Result<()> {
        let resource = change.resource().clone();
        if !resource.is_file() || Self::skips(&resource, change.local()) {
            return Ok(());
        }
        if fs::symlink_metadata(resource.path()).is_err() {
            debug!("Nothing on disk to snapshot for {}", resource);
            return Ok(());
        }

        let temp = self.store.allocate(&resource)?;
        match move_or_copy(self.fs.as_ref(), resource.path(), &temp) {
            MoveOutcome::Moved | MoveOutcome::CopiedFallback => {
                debug!("Snapshot {} -> {}", resource, temp.display());
                change.set_temporary(temp)
            }
            MoveOutcome::Failed(e) => Err(RevkeepError::SnapshotFailed {
                path: resource.path().to_path_buf(),
                message: e.to_string(),
            }),
        }
    }
}

/// Puts content back after an operation, according to the resource's state.
///
/// The state recorded in the [`ChangeDescription`] is the target. The state
/// after the operation is obtained from the connector.
///
/// For files (post-visit):
/// - recorded as deleted: any file at the live path is removed and, unless
///   it is a replacement, the snapshot is discarded; then the resource is
///   deleted from version control when it is back on the repository and was
///   not merely missing, and nothing else happens for non-replacements
/// - otherwise the snapshot is moved back to the live path
///
/// Containers (pre-visit, so before their children) are recreated on disk
/// unless recorded as deleted.
///
/// In both cases the resource is then added to version control when its kind
/// did not change and either it was recorded as replaced, or it was recorded
/// as versioned but is not versioned anymore.
pub struct RestoreContentVisitor {
    connector: Arc<dyn Connector>,
    fs: Arc<dyn FileSystem>,
    node_kind_changed: bool,
}

impl RestoreContentVisitor {
    /// Restore using the real filesystem.
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            fs: Arc::new(StdFileSystem),
            node_kind_changed: false,
        }
    }

    /// Use a different filesystem implementation.
    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Declare that the operation changed node kinds (file to directory or
    /// back), which suppresses the add follow-up.
    pub fn node_kind_changed(mut self, changed: bool) -> Self {
        self.node_kind_changed = changed;
        self
    }

    fn kind_changed(&self, resource: &ResourceHandle) -> bool {
        if self.node_kind_changed {
            return true;
        }
        match fs::symlink_metadata(resource.path()) {
            Ok(meta) => meta.is_dir() != resource.is_container(),
            Err(_) => false,
        }
    }

    fn add_if_needed(
        &self,
        resource: &ResourceHandle,
        recorded: &LocalResourceState,
        current: &LocalResourceState,
        processor: &mut dyn OperationProcessor,
        progress: &dyn ProgressMonitor,
    ) -> Result<()> {
        let wants_add = Filter::Replaced.accept(resource, recorded)
            || (Filter::Versioned.accept(resource, recorded)
                && !Filter::Versioned.accept(resource, current));
        if !wants_add {
            return Ok(());
        }
        if self.kind_changed(resource) {
            debug!("Kind of {} changed, not re-adding it", resource);
            return Ok(());
        }
        processor.do_operation(Operation::AddToVersionControl(resource.clone()), progress)
    }

    fn discard(&self, temp: &Path) {
        if let Err(e) = self.fs.remove_file(temp) {
            warn!("Could not discard snapshot {}: {}", temp.display(), e);
        }
    }
}

impl ChangeVisitor for RestoreContentVisitor {
    fn name(&self) -> &str {
        "restore-content"
    }

    fn pre_visit(
        &self,
        change: &mut ChangeDescription,
        processor: &mut dyn OperationProcessor,
        progress: &dyn ProgressMonitor,
    ) -> Result<()> {
        let resource = change.resource().clone();
        if !resource.is_container() || deleted_for_good(&resource, change.local()) {
            return Ok(());
        }

        if !resource.path().exists() {
            debug!("Recreating directory {}", resource);
            self.fs.create_dir_all(resource.path())?;
        }

        let current = self.connector.classify(&resource)?;
        self.add_if_needed(&resource, change.local(), &current, processor, progress)
    }

    fn post_visit(
        &self,
        change: &mut ChangeDescription,
        processor: &mut dyn OperationProcessor,
        progress: &dyn ProgressMonitor,
    ) -> Result<()> {
        let resource = change.resource().clone();
        if !resource.is_file() {
            return Ok(());
        }
        let recorded = change.local().clone();
        let live = resource.path();

        if Filter::Deleted.accept(&resource, &recorded) {
            if fs::symlink_metadata(live).is_ok() {
                if let Err(e) = self.fs.remove_file(live) {
                    warn!("Could not remove {}: {}", resource, e);
                }
            }
            let stays_deleted = !Filter::PrereplacedReplaced.accept(&resource, &recorded);
            if stays_deleted {
                if let Some(temp) = change.take_temporary() {
                    debug!("{} stays deleted, dropping its snapshot", resource);
                    self.discard(&temp);
                }
            }

            let current = self.connector.classify(&resource)?;
            if Filter::OnRepository.accept(&resource, &current)
                && !Filter::Missing.accept(&resource, &recorded)
            {
                processor.do_operation(
                    Operation::DeleteFromVersionControl(resource.clone()),
                    progress,
                )?;
            }
            if stays_deleted {
                return Ok(());
            }
        }

        if let Some(temp) = change.temporary().map(Path::to_path_buf) {
            match move_or_copy(self.fs.as_ref(), &temp, live) {
                MoveOutcome::Moved | MoveOutcome::CopiedFallback => {
                    change.take_temporary();
                    debug!("Restored {}", resource);
                }
                MoveOutcome::Failed(e) => {
                    error!(
                        "Could not restore {}, its content is in {}: {}",
                        resource,
                        temp.display(),
                        e
                    );
                    return Err(RevkeepError::ContentMayBeLost {
                        path: live.to_path_buf(),
                        temporary: temp,
                        message: e.to_string(),
                    });
                }
            }
        }

        // Content is back in place before the connector is consulted again.
        let current = self.connector.classify(&resource)?;
        self.add_if_needed(&resource, &recorded, &current, processor, progress)
    }
}
