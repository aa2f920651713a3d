//! Visitor contract and ordered fan-out.

use std::sync::Arc;

use crate::connector::{OperationProcessor, ProgressMonitor};
use crate::error::Result;

use super::ChangeDescription;

/// A step run over every node of a change tree.
///
/// `pre_visit` runs before the node's children are visited and `post_visit`
/// after. Either may be a no-op. Follow-up operations are issued through the
/// processor, never applied directly.
pub trait ChangeVisitor: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Called before the node's children.
    fn pre_visit(
        &self,
        _change: &mut ChangeDescription,
        _processor: &mut dyn OperationProcessor,
        _progress: &dyn ProgressMonitor,
    ) -> Result<()> {
        Ok(())
    }

    /// Called after the node's children.
    fn post_visit(
        &self,
        _change: &mut ChangeDescription,
        _processor: &mut dyn OperationProcessor,
        _progress: &dyn ProgressMonitor,
    ) -> Result<()> {
        Ok(())
    }
}

/// Ordered set of visitors, deduplicated by instance.
///
/// Adding the same `Arc` twice is a no-op; distinct instances of the same type
/// are both kept. The first visitor error aborts the fan-out for that node.
#[derive(Default, Clone)]
pub struct CompositeVisitor {
    visitors: Vec<Arc<dyn ChangeVisitor>>,
}

impl CompositeVisitor {
    /// Create an empty composite.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a visitor unless this very instance is already present.
    ///
    /// Returns whether the visitor was added.
    pub fn add(&mut self, visitor: Arc<dyn ChangeVisitor>) -> bool {
        let present = self
            .visitors
            .iter()
            .any(|v| std::ptr::addr_eq(Arc::as_ptr(v), Arc::as_ptr(&visitor)));
        if present {
            return false;
        }
        self.visitors.push(visitor);
        true
    }

    /// Builder form of [`add`](CompositeVisitor::add).
    pub fn with(mut self, visitor: Arc<dyn ChangeVisitor>) -> Self {
        self.add(visitor);
        self
    }

    /// Number of distinct visitors.
    pub fn len(&self) -> usize {
        self.visitors.len()
    }

    /// Whether no visitor is registered.
    pub fn is_empty(&self) -> bool {
        self.visitors.is_empty()
    }

    /// Visitor names, in order.
    pub fn names(&self) -> Vec<&str> {
        self.visitors.iter().map(|v| v.name()).collect()
    }
}

impl ChangeVisitor for CompositeVisitor {
    fn name(&self) -> &str {
        "composite"
    }

    fn pre_visit(
        &self,
        change: &mut ChangeDescription,
        processor: &mut dyn OperationProcessor,
        progress: &dyn ProgressMonitor,
    ) -> Result<()> {
        for visitor in &self.visitors {
            visitor.pre_visit(change, processor, progress)?;
        }
        Ok(())
    }

    fn post_visit(
        &self,
        change: &mut ChangeDescription,
        processor: &mut dyn OperationProcessor,
        progress: &dyn ProgressMonitor,
    ) -> Result<()> {
        for visitor in &self.visitors {
            visitor.post_visit(change, processor, progress)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for CompositeVisitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
