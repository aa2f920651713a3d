//! Versioned property snapshot and restore.

use std::sync::Arc;

use tracing::debug;

use crate::change::{ChangeDescription, ChangeVisitor};
use crate::connector::{Connector, Operation, OperationProcessor, ProgressMonitor};
use crate::error::{Result, RevkeepError};
use crate::filter::{Filter, StateFilter};

use super::deleted_for_good;

/// Captures the property list of every versioned resource.
pub struct SavePropertiesVisitor {
    connector: Arc<dyn Connector>,
}

impl SavePropertiesVisitor {
    /// Read properties through `connector`.
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }
}

impl ChangeVisitor for SavePropertiesVisitor {
    fn name(&self) -> &str {
        "save-properties"
    }

    fn pre_visit(
        &self,
        change: &mut ChangeDescription,
        _processor: &mut dyn OperationProcessor,
        _progress: &dyn ProgressMonitor,
    ) -> Result<()> {
        if !Filter::Versioned.accept(change.resource(), change.local()) {
            return Ok(());
        }

        let properties = self
            .connector
            .properties(change.resource())
            .map_err(|e| RevkeepError::SnapshotFailed {
                path: change.resource().path().to_path_buf(),
                message: e.to_string(),
            })?;
        debug!(
            "Captured {} propert(ies) of {}",
            properties.len(),
            change.resource()
        );
        change.set_properties(properties);
        Ok(())
    }
}

/// Makes the live property list equal to the captured one.
///
/// Live properties missing from the capture are removed first, then every
/// captured property is set again in captured order. Nothing happens for
/// resources recorded as deleted for good or no longer versioned.
pub struct RestorePropertiesVisitor {
    connector: Arc<dyn Connector>,
}

impl RestorePropertiesVisitor {
    /// Read the live state through `connector`.
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }
}

impl ChangeVisitor for RestorePropertiesVisitor {
    fn name(&self) -> &str {
        "restore-properties"
    }

    fn post_visit(
        &self,
        change: &mut ChangeDescription,
        processor: &mut dyn OperationProcessor,
        progress: &dyn ProgressMonitor,
    ) -> Result<()> {
        let resource = change.resource().clone();
        if change.properties().is_none() || deleted_for_good(&resource, change.local()) {
            return Ok(());
        }
        let current = self.connector.classify(&resource)?;
        if !Filter::Versioned.accept(&resource, &current) {
            debug!("{} is no longer versioned, skipping properties", resource);
            return Ok(());
        }

        let captured = change.take_properties().unwrap_or_default();
        let live = self.connector.properties(&resource)?;

        for stale in live
            .iter()
            .filter(|p| !captured.iter().any(|c| c.name == p.name))
        {
            processor.do_operation(
                Operation::RemoveProperty {
                    resource: resource.clone(),
                    name: stale.name.clone(),
                },
                progress,
            )?;
        }
        for property in captured {
            processor.do_operation(
                Operation::SetProperty {
                    resource: resource.clone(),
                    property,
                },
                progress,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::{ConnectorProcessor, MockWorkingCopy, NullProgress};
    use crate::resource::{LocalResourceState, Property, ResourceHandle, Status};

    fn setup(status: Status, properties: Vec<Property>) -> (Arc<MockWorkingCopy>, ChangeDescription) {
        let wc = Arc::new(MockWorkingCopy::new());
        let file = ResourceHandle::file("/wc/a.txt");
        wc.register(&file, LocalResourceState::new(status));
        wc.set_properties(&file, properties);
        (wc, ChangeDescription::new(file, LocalResourceState::new(status)))
    }

    fn save(wc: &Arc<MockWorkingCopy>, change: &mut ChangeDescription) -> Result<()> {
        let mut processor = ConnectorProcessor::new(&**wc);
        SavePropertiesVisitor::new(wc.clone()).pre_visit(change, &mut processor, &NullProgress)
    }

    fn restore(wc: &Arc<MockWorkingCopy>, change: &mut ChangeDescription) -> Result<()> {
        let mut processor = ConnectorProcessor::new(&**wc).fail_fast();
        RestorePropertiesVisitor::new(wc.clone()).post_visit(change, &mut processor, &NullProgress)
    }

    #[test]
    fn captures_versioned_properties_verbatim() {
        let (wc, mut change) = setup(
            Status::Normal,
            vec![Property::new("b", "2"), Property::new("a", "1")],
        );

        save(&wc, &mut change).unwrap();

        assert_eq!(
            change.properties().unwrap(),
            &[Property::new("b", "2"), Property::new("a", "1")]
        );
    }

    #[test]
    fn unversioned_resources_have_no_capture() {
        let (wc, mut change) = setup(Status::New, vec![Property::new("a", "1")]);
        save(&wc, &mut change).unwrap();
        assert!(change.properties().is_none());
    }

    #[test]
    fn capture_failure_is_a_snapshot_error() {
        let (wc, mut change) = setup(Status::Normal, vec![]);
        wc.fail_operation("properties");

        let err = save(&wc, &mut change).unwrap_err();
        assert!(matches!(err, RevkeepError::SnapshotFailed { .. }));
    }

    #[test]
    fn restore_removes_extras_then_reapplies() {
        let (wc, mut change) = setup(
            Status::Normal,
            vec![Property::new("x", "1"), Property::new("y", "2")],
        );
        save(&wc, &mut change).unwrap();
        wc.set_properties(
            change.resource(),
            vec![Property::new("x", "1"), Property::new("z", "3")],
        );

        restore(&wc, &mut change).unwrap();

        let file = change.resource().clone();
        assert_eq!(
            wc.properties_of(&file),
            vec![Property::new("x", "1"), Property::new("y", "2")]
        );
        assert_eq!(
            wc.operations()[0],
            Operation::RemoveProperty {
                resource: file,
                name: "z".to_string(),
            }
        );
        assert!(change.properties().is_none());
    }

    #[test]
    fn deleted_for_good_has_no_effect() {
        let (wc, mut change) = setup(Status::Normal, vec![Property::new("x", "1")]);
        save(&wc, &mut change).unwrap();
        let mut deleted = ChangeDescription::new(
            change.resource().clone(),
            LocalResourceState::new(Status::Deleted),
        );
        deleted.set_properties(change.properties().unwrap().to_vec());
        wc.set_properties(change.resource(), vec![Property::new("q", "9")]);

        restore(&wc, &mut deleted).unwrap();

        assert!(wc.operations().is_empty());
    }

    #[test]
    fn unversioned_after_operation_has_no_effect() {
        let (wc, mut change) = setup(Status::Added, vec![Property::new("x", "1")]);
        save(&wc, &mut change).unwrap();
        wc.register(change.resource(), LocalResourceState::new(Status::New));

        restore(&wc, &mut change).unwrap();

        assert!(wc.operations().is_empty());
    }
}
