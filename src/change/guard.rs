//! Snapshot, mutate, restore.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::Settings;
use crate::connector::{
    Connector, Operation, OperationProcessor, ProgressMonitor, ResourceTree,
};
use crate::error::{Result, RevkeepError};
use crate::resource::{Depth, ResourceHandle};

use super::transfer::{move_or_copy, FileSystem, MoveOutcome, StdFileSystem};
use super::visitors::{
    RestoreContentVisitor, RestorePropertiesVisitor, SaveContentVisitor, SavePropertiesVisitor,
    UnversionedPruneVisitor,
};
use super::{
    pipeline, ChangeDescription, ChangeTree, ChangeVisitor, CompositeVisitor, SnapshotStore,
};

/// Forwards progress but never reports cancellation.
///
/// Restoring is never cut short: a half-restored tree would leave content
/// only in the snapshot store.
struct Uncancelable<'a>(&'a dyn ProgressMonitor);

impl ProgressMonitor for Uncancelable<'_> {
    fn begin_task(&self, name: &str, total: usize) {
        self.0.begin_task(name, total);
    }

    fn worked(&self, units: usize) {
        self.0.worked(units);
    }

    fn is_canceled(&self) -> bool {
        false
    }

    fn done(&self) {
        self.0.done();
    }
}

/// Keeps follow-up failures from cutting the restore short.
///
/// Every operation is forwarded; failures are kept and reported once all
/// content is back in place.
struct CollectFollowUps<'a> {
    inner: &'a mut dyn OperationProcessor,
    failures: Vec<RevkeepError>,
}

impl OperationProcessor for CollectFollowUps<'_> {
    fn do_operation(&mut self, operation: Operation, progress: &dyn ProgressMonitor) -> Result<()> {
        if let Err(e) = self.inner.do_operation(operation, progress) {
            warn!("Restore continues past a failed follow-up: {}", e);
            self.failures.push(e);
        }
        Ok(())
    }
}

/// Moves snapshots back untouched when the operation never ran.
struct PutBack {
    fs: Arc<dyn FileSystem>,
}

impl ChangeVisitor for PutBack {
    fn name(&self) -> &str {
        "put-back"
    }

    fn post_visit(
        &self,
        change: &mut ChangeDescription,
        _processor: &mut dyn OperationProcessor,
        _progress: &dyn ProgressMonitor,
    ) -> Result<()> {
        let Some(temp) = change.temporary().map(Path::to_path_buf) else {
            return Ok(());
        };
        match move_or_copy(self.fs.as_ref(), &temp, change.resource().path()) {
            MoveOutcome::Failed(e) => Err(RevkeepError::ContentMayBeLost {
                path: change.resource().path().to_path_buf(),
                temporary: temp,
                message: e.to_string(),
            }),
            _ => {
                change.take_temporary();
                Ok(())
            }
        }
    }
}

/// Keeps local content and properties across a mutating operation.
///
/// [`preserve`](ChangeGuard::preserve) records the tree under a resource,
/// moves file content and properties aside, runs the operation, optionally
/// prunes unversioned leftovers, and restores everything according to the
/// recorded states.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use revkeep::change::ChangeGuard;
/// use revkeep::config::Settings;
/// use revkeep::connector::{ConnectorProcessor, MockWorkingCopy, NullProgress};
/// use revkeep::resource::{LocalResourceState, ResourceHandle, Status};
///
/// let temp = tempfile::TempDir::new().unwrap();
/// let file = ResourceHandle::file(temp.path().join("a.txt"));
/// std::fs::write(file.path(), "mine").unwrap();
///
/// let wc = Arc::new(MockWorkingCopy::new());
/// wc.register(&file, LocalResourceState::new(Status::Modified));
///
/// let settings = Settings {
///     snapshot_dir: Some(temp.path().join("snapshots")),
///     ..Default::default()
/// };
/// let guard = ChangeGuard::new(wc.clone(), wc.clone(), settings);
/// let mut processor = ConnectorProcessor::new(&*wc);
///
/// guard
///     .preserve(file.clone(), &mut processor, &NullProgress, |_| {
///         std::fs::write(file.path(), "theirs")?;
///         Ok(())
///     })
///     .unwrap();
///
/// assert_eq!(std::fs::read_to_string(file.path()).unwrap(), "mine");
/// ```
pub struct ChangeGuard {
    connector: Arc<dyn Connector>,
    tree: Arc<dyn ResourceTree>,
    settings: Settings,
    fs: Arc<dyn FileSystem>,
    depth: Depth,
    prune: bool,
    node_kind_changed: bool,
}

impl ChangeGuard {
    /// Create a guard covering whole subtrees, without pruning.
    pub fn new(
        connector: Arc<dyn Connector>,
        tree: Arc<dyn ResourceTree>,
        settings: Settings,
    ) -> Self {
        Self {
            connector,
            tree,
            settings,
            fs: Arc::new(StdFileSystem),
            depth: Depth::Infinite,
            prune: false,
            node_kind_changed: false,
        }
    }

    /// How far below the root resources are recorded.
    pub fn depth(mut self, depth: Depth) -> Self {
        self.depth = depth;
        self
    }

    /// Prune unversioned resources after the operation, before restoring.
    pub fn prune_unversioned(mut self, prune: bool) -> Self {
        self.prune = prune;
        self
    }

    /// Declare that the operation changes node kinds.
    pub fn node_kind_changed(mut self, changed: bool) -> Self {
        self.node_kind_changed = changed;
        self
    }

    /// Use a different filesystem implementation for content moves.
    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Run `operation` with the content and properties under `root` kept.
    ///
    /// Returns `Ok(None)` when the run was canceled before the operation
    /// started. If the operation never ran, the snapshots taken so far are
    /// simply moved back. Once the operation ran, restoring always runs to
    /// the end regardless of cancellation or of the operation's outcome.
    ///
    /// A failed add/delete/property follow-up does not stop the restore,
    /// even with a fail-fast processor; the first one is returned after
    /// everything else was put back.
    ///
    /// Errors, in order of precedence: a restore error (as
    /// [`RevkeepError::RestoreIncomplete`] when snapshots are left over),
    /// unrestored snapshots, a failed follow-up, a prune error, the
    /// operation's own error. Lower-ranked errors are logged when a higher
    /// one is returned.
    pub fn preserve<T, F>(
        &self,
        root: ResourceHandle,
        processor: &mut dyn OperationProcessor,
        progress: &dyn ProgressMonitor,
        operation: F,
    ) -> Result<Option<T>>
    where
        F: FnOnce(&mut dyn OperationProcessor) -> Result<T>,
    {
        let store = Arc::new(SnapshotStore::from_settings(&self.settings));
        let mut tree = ChangeTree::wrap(root, self.connector.as_ref(), self.tree.as_ref(), self.depth)?;
        debug!("Guarding {} resource(s)", tree.len());

        let snapshot = CompositeVisitor::new()
            .with(Arc::new(SavePropertiesVisitor::new(self.connector.clone())))
            .with(Arc::new(
                SaveContentVisitor::new(store.clone()).with_file_system(self.fs.clone()),
            ));
        let snapshot_result = pipeline::run(&mut tree, &snapshot, processor, progress);

        let outcome = match &snapshot_result {
            Ok(summary) if !summary.canceled => {
                let result = operation(&mut *processor);
                let pruned = if self.prune {
                    let prune = UnversionedPruneVisitor::new(self.settings.prune_added);
                    pipeline::run(&mut tree, &prune, processor, progress).map(|_| ())
                } else {
                    Ok(())
                };
                Some((result, pruned))
            }
            _ => None,
        };

        let restore = match &outcome {
            Some(_) => CompositeVisitor::new()
                .with(Arc::new(
                    RestoreContentVisitor::new(self.connector.clone())
                        .with_file_system(self.fs.clone())
                        .node_kind_changed(self.node_kind_changed),
                ))
                .with(Arc::new(RestorePropertiesVisitor::new(self.connector.clone()))),
            None => CompositeVisitor::new().with(Arc::new(PutBack {
                fs: self.fs.clone(),
            })),
        };
        let mut collecting = CollectFollowUps {
            inner: &mut *processor,
            failures: Vec::new(),
        };
        let restored = pipeline::run(
            &mut tree,
            &restore,
            &mut collecting,
            &Uncancelable(progress),
        );
        let follow_ups = collecting.failures;
        let disposed = tree.dispose();

        if let Err(e) = restored {
            if let Some((Err(op), _)) = &outcome {
                warn!("Operation failed before the restore did: {}", op);
            }
            return Err(match disposed {
                Err(RevkeepError::LeakedSnapshots { count, listing }) => {
                    RevkeepError::RestoreIncomplete {
                        message: e.to_string(),
                        count,
                        listing,
                    }
                }
                _ => e,
            });
        }
        disposed?;

        let mut follow_ups = follow_ups.into_iter();
        if let Some(first) = follow_ups.next() {
            for other in follow_ups {
                warn!("Another follow-up failed: {}", other);
            }
            if let Some((Err(op), _)) = &outcome {
                warn!("Operation failed before its follow-ups did: {}", op);
            }
            return Err(first);
        }

        match (snapshot_result, outcome) {
            (Err(e), _) => Err(e),
            (Ok(_), None) => {
                debug!("Canceled before the operation started");
                Ok(None)
            }
            (Ok(_), Some((result, pruned))) => {
                if let Err(e) = pruned {
                    if let Err(op) = &result {
                        warn!("Operation failed before pruning did: {}", op);
                    }
                    return Err(e);
                }
                result.map(Some)
            }
        }
    }
}

impl std::fmt::Debug for ChangeGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeGuard")
            .field("settings", &self.settings)
            .field("depth", &self.depth)
            .field("prune", &self.prune)
            .field("node_kind_changed", &self.node_kind_changed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::{CancellationToken, ConnectorProcessor, MockWorkingCopy, NullProgress};
    use crate::resource::{LocalResourceState, Property, ResourceKind, Status};
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct Fixture {
        temp: TempDir,
        wc: Arc<MockWorkingCopy>,
        root: ResourceHandle,
        file: ResourceHandle,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let root = ResourceHandle::container(temp.path().join("wc"));
            let file = root.child("a.txt", ResourceKind::File);
            fs::create_dir_all(root.path()).unwrap();
            fs::write(file.path(), "A").unwrap();

            let wc = Arc::new(MockWorkingCopy::new());
            wc.register(&root, LocalResourceState::new(Status::Normal));
            wc.register(&file, LocalResourceState::new(Status::Modified));
            wc.set_properties(&file, vec![Property::new("x", "1")]);

            Self {
                temp,
                wc,
                root,
                file,
            }
        }

        fn guard(&self) -> ChangeGuard {
            let settings = Settings {
                snapshot_dir: Some(self.temp.path().join("snapshots")),
                ..Default::default()
            };
            ChangeGuard::new(self.wc.clone(), self.wc.clone(), settings)
        }

        fn snapshot_files(&self) -> usize {
            let base = self.temp.path().join("snapshots");
            if !base.exists() {
                return 0;
            }
            walk(&base)
        }
    }

    fn walk(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| {
                let path = e.unwrap().path();
                if path.is_dir() {
                    walk(&path)
                } else {
                    1
                }
            })
            .sum()
    }

    #[test]
    fn failed_operation_is_rolled_back() {
        let fx = Fixture::new();
        let mut processor = ConnectorProcessor::new(&*fx.wc);
        let file = fx.file.clone();
        let wc = fx.wc.clone();

        let err = fx
            .guard()
            .preserve(fx.root.clone(), &mut processor, &NullProgress, |_| -> Result<()> {
                fs::write(file.path(), "half written")?;
                wc.set_properties(&file, vec![Property::new("x", "broken")]);
                Err(RevkeepError::Other(anyhow::anyhow!("operation blew up")))
            })
            .unwrap_err();

        assert!(err.to_string().contains("operation blew up"));
        assert_eq!(fs::read_to_string(fx.file.path()).unwrap(), "A");
        assert_eq!(fx.wc.properties_of(&fx.file), vec![Property::new("x", "1")]);
        assert_eq!(fx.snapshot_files(), 0);
    }

    #[test]
    fn canceled_snapshot_skips_the_operation() {
        let fx = Fixture::new();
        let mut processor = ConnectorProcessor::new(&*fx.wc);
        let token = CancellationToken::new();
        token.cancel();
        let mut ran = false;

        let result = fx
            .guard()
            .preserve(fx.root.clone(), &mut processor, &token, |_| {
                ran = true;
                Ok(())
            })
            .unwrap();

        assert!(result.is_none());
        assert!(!ran);
        assert_eq!(fs::read_to_string(fx.file.path()).unwrap(), "A");
    }

    /// Cancels once it has been polled `after` times.
    struct CancelAfter {
        after: usize,
        polls: AtomicUsize,
    }

    impl ProgressMonitor for CancelAfter {
        fn begin_task(&self, _name: &str, _total: usize) {}

        fn worked(&self, _units: usize) {}

        fn is_canceled(&self) -> bool {
            self.polls.fetch_add(1, Ordering::SeqCst) >= self.after
        }

        fn done(&self) {}
    }

    #[test]
    fn partial_snapshot_is_put_back_on_cancel() {
        let fx = Fixture::new();
        let second = fx.root.child("b.txt", ResourceKind::File);
        fs::write(second.path(), "B").unwrap();
        fx.wc.register(&second, LocalResourceState::new(Status::Replaced));
        let mut processor = ConnectorProcessor::new(&*fx.wc);
        let progress = CancelAfter {
            after: 2,
            polls: Default::default(),
        };

        let result = fx
            .guard()
            .preserve(fx.root.clone(), &mut processor, &progress, |_| Ok(()))
            .unwrap();

        assert!(result.is_none());
        assert_eq!(fs::read_to_string(fx.file.path()).unwrap(), "A");
        assert_eq!(fs::read_to_string(second.path()).unwrap(), "B");
        assert!(fx.wc.operations().is_empty());
        assert_eq!(fx.snapshot_files(), 0);
    }

    #[test]
    fn restore_failure_wins_and_keeps_the_snapshot() {
        let fx = Fixture::new();
        let mut processor = ConnectorProcessor::new(&*fx.wc);
        let wc = fx.wc.clone();

        let err = fx
            .guard()
            .preserve(fx.root.clone(), &mut processor, &NullProgress, |_| -> Result<()> {
                wc.fail_operation("classify");
                Err(RevkeepError::Other(anyhow::anyhow!("operation blew up")))
            })
            .unwrap_err();

        assert!(err.is_content_loss_risk());
        match err {
            RevkeepError::RestoreIncomplete {
                message,
                count,
                listing,
            } => {
                assert!(message.contains("classify rejected"));
                assert_eq!(count, 1);
                assert!(listing.contains("a.txt"));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(fx.snapshot_files(), 1);
    }

    #[test]
    fn failed_follow_up_does_not_stop_the_restore() {
        let fx = Fixture::new();
        fx.wc.register(&fx.file, LocalResourceState::new(Status::Added));
        let second = fx.root.child("b.txt", ResourceKind::File);
        fs::write(second.path(), "B").unwrap();
        fx.wc.register(&second, LocalResourceState::new(Status::Modified));
        let mut processor = ConnectorProcessor::new(&*fx.wc).fail_fast();
        let wc = fx.wc.clone();
        let (a, b) = (fx.file.clone(), second.clone());

        let err = fx
            .guard()
            .preserve(fx.root.clone(), &mut processor, &NullProgress, |_| {
                wc.register(&a, LocalResourceState::new(Status::New));
                wc.fail_operation("add");
                fs::write(b.path(), "theirs")?;
                Ok(())
            })
            .unwrap_err();

        assert!(matches!(err, RevkeepError::FollowUpFailed { .. }));
        assert!(!err.is_content_loss_risk());
        assert_eq!(fs::read_to_string(fx.file.path()).unwrap(), "A");
        assert_eq!(fs::read_to_string(second.path()).unwrap(), "B");
        assert_eq!(fx.snapshot_files(), 0);
    }

    #[test]
    fn prune_runs_between_operation_and_restore() {
        let fx = Fixture::new();
        let junk = fx.root.child("junk.txt", ResourceKind::File);
        fx.wc.register(&junk, LocalResourceState::new(Status::New));
        let mut processor = ConnectorProcessor::new(&*fx.wc);

        fx.guard()
            .prune_unversioned(true)
            .preserve(fx.root.clone(), &mut processor, &NullProgress, |_| {
                fs::write(junk.path(), "generated")?;
                Ok(())
            })
            .unwrap();

        assert!(!junk.path().exists());
        assert_eq!(fs::read_to_string(fx.file.path()).unwrap(), "A");
    }
}
