//! Error types for revkeep operations.
//!
//! This module defines [`RevkeepError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Snapshot failures happen before anything is mutated and abort the
//!   enclosing operation
//! - Restore failures leave the pre-operation bytes in a temporary file and are
//!   reported as [`RevkeepError::ContentMayBeLost`] with both paths
//! - A restore pass that stops while snapshots are still held is reported as
//!   [`RevkeepError::RestoreIncomplete`], naming the cause and the snapshots
//! - Follow-up version-control operations that fail after a successful restore
//!   are reported as [`RevkeepError::FollowUpFailed`]
//! - Use `anyhow::Error` (via `RevkeepError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for revkeep operations.
#[derive(Debug, Error)]
pub enum RevkeepError {
    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// Content or properties could not be captured before a mutation.
    #[error("Failed to snapshot {path}: {message}")]
    SnapshotFailed { path: PathBuf, message: String },

    /// Snapshot content could not be put back after a mutation.
    ///
    /// The live resource is missing at this point; the pre-operation bytes
    /// remain at `temporary`.
    #[error("Content of {path} may be lost, snapshot kept at {temporary}: {message}")]
    ContentMayBeLost {
        path: PathBuf,
        temporary: PathBuf,
        message: String,
    },

    /// An add/delete issued after a restore failed.
    #[error("Follow-up {operation} failed for {path}: {message}")]
    FollowUpFailed {
        operation: String,
        path: PathBuf,
        message: String,
    },

    /// A change model was disposed while snapshots were still held.
    #[error("{count} snapshot(s) were never restored: {listing}")]
    LeakedSnapshots { count: usize, listing: String },

    /// The restore pass stopped early while content was still held in
    /// snapshots.
    #[error("Restore stopped ({message}); {count} snapshot(s) were never restored: {listing}")]
    RestoreIncomplete {
        message: String,
        count: usize,
        listing: String,
    },

    /// The version-control connector reported a failure.
    #[error("Connector failed for {path}: {message}")]
    Connector { path: PathBuf, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RevkeepError {
    /// Whether this error means user content may only exist in a snapshot file.
    pub fn is_content_loss_risk(&self) -> bool {
        matches!(
            self,
            RevkeepError::ContentMayBeLost { .. }
                | RevkeepError::LeakedSnapshots { .. }
                | RevkeepError::RestoreIncomplete { .. }
        )
    }
}

/// Result type alias for revkeep operations.
pub type Result<T> = std::result::Result<T, RevkeepError>;
