//! Removal of unversioned leftovers.

use std::fs;
use std::io;

use tracing::debug;

use crate::change::{ChangeDescription, ChangeVisitor};
use crate::connector::{OperationProcessor, ProgressMonitor};
use crate::error::Result;
use crate::filter::{Filter, StateFilter};

/// Deletes from disk every resource recorded as unversioned and not ignored.
///
/// With `prune_added` it also deletes resources recorded as freshly added
/// without history, bringing the tree back to its versioned baseline.
/// Containers are removed with their whole contents.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnversionedPruneVisitor {
    prune_added: bool,
}

impl UnversionedPruneVisitor {
    /// Create the visitor.
    pub fn new(prune_added: bool) -> Self {
        Self { prune_added }
    }
}

impl ChangeVisitor for UnversionedPruneVisitor {
    fn name(&self) -> &str {
        "prune-unversioned"
    }

    fn pre_visit(
        &self,
        change: &mut ChangeDescription,
        _processor: &mut dyn OperationProcessor,
        _progress: &dyn ProgressMonitor,
    ) -> Result<()> {
        let resource = change.resource();
        let state = change.local();

        let unversioned =
            Filter::Unversioned.accept(resource, state) && !Filter::Ignored.accept(resource, state);
        let fresh =
            self.prune_added && Filter::Added.accept(resource, state) && !state.is_copied();
        if !unversioned && !fresh {
            return Ok(());
        }

        let path = resource.path();
        let meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        debug!("Pruning {} ({})", resource, state.status);
        if meta.is_dir() {
            fs::remove_dir_all(path)?;
        } else {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}
