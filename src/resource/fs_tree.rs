//! Filesystem-backed resource tree.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::connector::ResourceTree;
use crate::error::{Result, RevkeepError};

use super::{ResourceHandle, ResourceKind};

/// A [`ResourceTree`] that lists children straight from disk.
///
/// Everything outside `root`, and the administrative directory inside it, is
/// not supervised. Containers whose name matches one of the ignore patterns
/// are ignored.
#[derive(Debug)]
pub struct FsResourceTree {
    root: PathBuf,
    admin_dir: String,
    ignore: Vec<Regex>,
}

impl FsResourceTree {
    /// Create a tree rooted at `root` using the given settings.
    pub fn new(root: impl Into<PathBuf>, settings: &Settings) -> Result<Self> {
        let ignore = settings
            .ignore_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| RevkeepError::ConfigValidationError {
                    message: format!("Invalid ignore pattern '{}': {}", p, e),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            root: root.into(),
            admin_dir: settings.admin_dir.clone(),
            ignore,
        })
    }

    /// Root directory of the tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Handle for a path, using the kind found on disk.
    ///
    /// Paths that do not exist are treated as files.
    pub fn handle(&self, path: impl Into<PathBuf>) -> ResourceHandle {
        let path = path.into();
        let kind = if path.is_dir() {
            ResourceKind::Container
        } else {
            ResourceKind::File
        };
        ResourceHandle::new(path, kind)
    }
}

impl ResourceTree for FsResourceTree {
    fn children(&self, resource: &ResourceHandle) -> Result<Vec<ResourceHandle>> {
        if !resource.is_container() || !resource.path().exists() {
            return Ok(Vec::new());
        }

        let mut children = Vec::new();
        for entry in fs::read_dir(resource.path())? {
            let entry = entry?;
            let kind = if entry.file_type()?.is_dir() {
                ResourceKind::Container
            } else {
                ResourceKind::File
            };
            children.push(ResourceHandle::new(entry.path(), kind));
        }
        children.sort();
        Ok(children)
    }

    fn is_supervised(&self, resource: &ResourceHandle) -> bool {
        match resource.path().strip_prefix(&self.root) {
            Ok(relative) => !relative
                .components()
                .any(|c| c.as_os_str() == self.admin_dir.as_str()),
            Err(_) => false,
        }
    }

    fn is_ignored(&self, resource: &ResourceHandle) -> bool {
        let name = resource.name();
        self.ignore.iter().any(|re| re.is_match(name))
    }
}
