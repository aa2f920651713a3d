//! Storage for pre-operation content copies.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::{Result, RevkeepError};
use crate::resource::ResourceHandle;

static SESSIONS: AtomicU64 = AtomicU64::new(0);

/// Allocates unique snapshot paths inside a per-store session directory.
///
/// Snapshot files are opaque byte copies. The session directory is created on
/// the first allocation and removed when the store is dropped, provided it is
/// empty by then. Files still present at that point are left alone.
#[derive(Debug)]
pub struct SnapshotStore {
    session: PathBuf,
    counter: AtomicU64,
}

impl SnapshotStore {
    /// Create a store whose session directory lives under `base`.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let key = format!(
            "{}:{}:{}",
            std::process::id(),
            nanos,
            SESSIONS.fetch_add(1, Ordering::SeqCst)
        );
        let hash = Sha256::digest(key.as_bytes());

        Self {
            session: base.into().join(hex::encode(&hash[..8])),
            counter: AtomicU64::new(0),
        }
    }

    /// Create a store under [`Settings::snapshot_base`].
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.snapshot_base())
    }

    /// Directory holding this store's snapshot files.
    pub fn session_dir(&self) -> &Path {
        &self.session
    }

    /// Reserve a fresh snapshot path for a resource.
    ///
    /// The file itself is not created.
    pub fn allocate(&self, resource: &ResourceHandle) -> Result<PathBuf> {
        fs::create_dir_all(&self.session).map_err(|e| RevkeepError::SnapshotFailed {
            path: resource.path().to_path_buf(),
            message: format!(
                "cannot create snapshot directory {}: {}",
                self.session.display(),
                e
            ),
        })?;

        loop {
            let n = self.counter.fetch_add(1, Ordering::SeqCst);
            let key = format!("{}:{}", resource.path().display(), n);
            let hash = Sha256::digest(key.as_bytes());
            let candidate = self
                .session
                .join(format!("{}-{}", hex::encode(&hash[..8]), resource.name()));
            if !candidate.exists() {
                debug!("Snapshot slot for {} is {}", resource, candidate.display());
                return Ok(candidate);
            }
        }
    }

    /// Snapshot files currently present in the session directory.
    pub fn files(&self) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(&self.session) else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
        files.sort();
        files
    }
}

impl Drop for SnapshotStore {
    fn drop(&mut self) {
        if !self.session.exists() {
            return;
        }
        // remove_dir refuses non-empty directories, which keeps leftovers.
        if let Err(e) = fs::remove_dir(&self.session) {
            warn!(
                "Keeping snapshot directory {}: {}",
                self.session.display(),
                e
            );
        }
    }
}
