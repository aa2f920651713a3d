//! Depth-first driver running a visitor over a change tree.

use tracing::debug;

use crate::connector::{OperationProcessor, ProgressMonitor};
use crate::error::Result;

use super::{ChangeNode, ChangeTree, ChangeVisitor};

/// What a [`run`] got through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TraversalSummary {
    /// Nodes that received both their pre- and post-visit.
    pub visited: usize,
    /// Whether the run stopped because the progress monitor was canceled.
    pub canceled: bool,
}

/// Run `visitor` over every node of `tree`.
///
/// Each node gets its pre-visit, then its children are visited, then its
/// post-visit runs. Cancellation is polled before each node is entered: once
/// it is seen no further node is entered, while nodes already entered still
/// get their post-visit. Cancellation is not an error. Visitor errors
/// propagate unchanged and stop the run.
pub fn run(
    tree: &mut ChangeTree,
    visitor: &dyn ChangeVisitor,
    processor: &mut dyn OperationProcessor,
    progress: &dyn ProgressMonitor,
) -> Result<TraversalSummary> {
    progress.begin_task(visitor.name(), tree.len());

    let mut summary = TraversalSummary::default();
    let result = visit(tree.root_mut(), visitor, processor, progress, &mut summary);

    progress.done();
    result?;

    if summary.canceled {
        debug!(
            "'{}' canceled after {} node(s)",
            visitor.name(),
            summary.visited
        );
    }
    Ok(summary)
}

fn visit(
    node: &mut ChangeNode,
    visitor: &dyn ChangeVisitor,
    processor: &mut dyn OperationProcessor,
    progress: &dyn ProgressMonitor,
    summary: &mut TraversalSummary,
) -> Result<()> {
    if summary.canceled || progress.is_canceled() {
        summary.canceled = true;
        return Ok(());
    }

    visitor.pre_visit(&mut node.description, processor, progress)?;
    for child in &mut node.children {
        visit(child, visitor, processor, progress, summary)?;
    }
    visitor.post_visit(&mut node.description, processor, progress)?;

    summary.visited += 1;
    progress.worked(1);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::ChangeDescription;
    use crate::connector::{CancellationToken, ConnectorProcessor, MockWorkingCopy};
    use crate::resource::{LocalResourceState, ResourceHandle, Status};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Trace {
        calls: Mutex<Vec<String>>,
    }

    impl ChangeVisitor for Trace {
        fn name(&self) -> &str {
            "trace"
        }

        fn pre_visit(
            &self,
            change: &mut ChangeDescription,
            _processor: &mut dyn OperationProcessor,
            _progress: &dyn ProgressMonitor,
        ) -> Result<()> {
            let entry = format!("pre {}", change.resource().name());
            self.calls.lock().unwrap().push(entry);
            Ok(())
        }

        fn post_visit(
            &self,
            change: &mut ChangeDescription,
            _processor: &mut dyn OperationProcessor,
            _progress: &dyn ProgressMonitor,
        ) -> Result<()> {
            let entry = format!("post {}", change.resource().name());
            self.calls.lock().unwrap().push(entry);
            Ok(())
        }
    }

    fn node(path: &str, container: bool) -> ChangeNode {
        let handle = if container {
            ResourceHandle::container(path)
        } else {
            ResourceHandle::file(path)
        };
        ChangeNode::new(ChangeDescription::new(
            handle,
            LocalResourceState::new(Status::Normal),
        ))
    }

    fn sample_tree() -> ChangeTree {
        ChangeTree::new(
            node("/wc", true)
                .with_child(node("/wc/a", true).with_child(node("/wc/a/x", false)))
                .with_child(node("/wc/b", false)),
        )
    }

    #[test]
    fn pre_before_children_post_after() {
        let mut tree = sample_tree();
        let trace = Trace::default();
        let wc = MockWorkingCopy::new();
        let mut processor = ConnectorProcessor::new(&wc);
        let token = CancellationToken::new();

        let summary = run(&mut tree, &trace, &mut processor, &token).unwrap();

        assert_eq!(
            *trace.calls.lock().unwrap(),
            vec!["pre wc", "pre a", "pre x", "post x", "post a", "pre b", "post b", "post wc"]
        );
        assert_eq!(summary.visited, 4);
        assert!(!summary.canceled);
        assert_eq!(token.units_worked(), 4);
    }

    #[test]
    fn canceled_before_start_visits_nothing() {
        let mut tree = sample_tree();
        let trace = Trace::default();
        let wc = MockWorkingCopy::new();
        let mut processor = ConnectorProcessor::new(&wc);
        let token = CancellationToken::new();
        token.cancel();

        let summary = run(&mut tree, &trace, &mut processor, &token).unwrap();

        assert!(summary.canceled);
        assert_eq!(summary.visited, 0);
        assert!(trace.calls.lock().unwrap().is_empty());
    }
}
