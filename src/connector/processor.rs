//! Operation processor backed by a [`Connector`].

use tracing::{debug, warn};

use crate::error::{Result, RevkeepError};

use super::{Connector, Operation, OperationProcessor, ProgressMonitor};

/// Runs [`Operation`]s against a [`Connector`].
///
/// By default a failing operation is logged and recorded, and the caller
/// carries on; the failures are available from [`failures`] once the run
/// ends. With [`fail_fast`] the first failure is returned instead. Operations
/// are never retried.
///
/// [`failures`]: ConnectorProcessor::failures
/// [`fail_fast`]: ConnectorProcessor::fail_fast
pub struct ConnectorProcessor<'a> {
    connector: &'a dyn Connector,
    fail_fast: bool,
    applied: usize,
    failures: Vec<RevkeepError>,
}

impl<'a> ConnectorProcessor<'a> {
    /// Create a processor that records failures and continues.
    pub fn new(connector: &'a dyn Connector) -> Self {
        Self {
            connector,
            fail_fast: false,
            applied: 0,
            failures: Vec::new(),
        }
    }

    /// Return the first failure from [`OperationProcessor::do_operation`].
    pub fn fail_fast(mut self) -> Self {
        self.fail_fast = true;
        self
    }

    /// Number of operations that succeeded.
    pub fn applied(&self) -> usize {
        self.applied
    }

    /// Failures recorded so far.
    pub fn failures(&self) -> &[RevkeepError] {
        &self.failures
    }

    /// Consume the processor and return the recorded failures.
    pub fn into_failures(self) -> Vec<RevkeepError> {
        self.failures
    }

    fn dispatch(&self, operation: &Operation) -> Result<()> {
        match operation {
            Operation::AddToVersionControl(resource) => self.connector.add(resource),
            Operation::DeleteFromVersionControl(resource) => self.connector.delete(resource),
            Operation::SetProperty { resource, property } => {
                self.connector.set_property(resource, property)
            }
            Operation::RemoveProperty { resource, name } => {
                self.connector.remove_property(resource, name)
            }
        }
    }
}

impl OperationProcessor for ConnectorProcessor<'_> {
    fn do_operation(&mut self, operation: Operation, progress: &dyn ProgressMonitor) -> Result<()> {
        debug!("Running {}", operation);

        match self.dispatch(&operation) {
            Ok(()) => {
                self.applied += 1;
                progress.worked(1);
                Ok(())
            }
            Err(e) => {
                let failure = RevkeepError::FollowUpFailed {
                    operation: operation.name().to_string(),
                    path: operation.path().to_path_buf(),
                    message: e.to_string(),
                };
                if self.fail_fast {
                    return Err(failure);
                }
                warn!("{}", failure);
                self.failures.push(failure);
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for ConnectorProcessor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectorProcessor")
            .field("fail_fast", &self.fail_fast)
            .field("applied", &self.applied)
            .field("failures", &self.failures.len())
            .finish()
    }
}
