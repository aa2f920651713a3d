//! revkeep - keeps working-copy changes across version-control operations.
//!
//! revkeep snapshots the local content and properties of a working tree
//! before a mutating operation (revert, rollback after a failure, merge
//! undo), restores them afterwards according to each resource's resulting
//! version-control state, and coalesces change notifications for observers.
//!
//! # Modules
//!
//! - [`change`] - Change model, visitor pipeline, snapshot/restore visitors
//! - [`config`] - Settings loading and validation
//! - [`connector`] - Version-control collaborators and follow-up operations
//! - [`error`] - Error types and result aliases
//! - [`events`] - Change events and coalescing delivery
//! - [`filter`] - State filters over resource classifications
//! - [`logging`] - Tracing subscriber setup
//! - [`resource`] - Resource identity and classification
//!
//! # Example
//!
//! ```
//! use revkeep::filter::{Filter, StateFilter};
//! use revkeep::resource::{LocalResourceState, ResourceHandle, Status};
//!
//! let file = ResourceHandle::file("/wc/a.txt");
//! let state = LocalResourceState::new(Status::Replaced);
//! assert!(Filter::PrereplacedReplaced.accept(&file, &state));
//! assert!(Filter::Versioned.accept(&file, &state));
//! ```
//!
//! For a full snapshot/restore round trip, see the integration tests.

pub mod change;
pub mod config;
pub mod connector;
pub mod error;
pub mod events;
pub mod filter;
pub mod logging;
pub mod resource;

pub use error::{Result, RevkeepError};
