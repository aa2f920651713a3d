//! Change notifications for status observers.
//!
//! A [`ChangeEvent`] names the resources whose state changed and how far below
//! them the change reaches. A [`CoalescingQueue`] folds compatible events
//! together before they reach [`EventListener`]s, keeping refresh cost low on
//! large trees.
//!
//! # Example
//!
//! ```
//! use revkeep::events::{ChangeEvent, CoalescingQueue, EventKind};
//! use revkeep::resource::{Depth, ResourceHandle};
//!
//! let mut queue = CoalescingQueue::new(16);
//! queue.push(ChangeEvent::new(
//!     [ResourceHandle::file("/wc/a/b.txt")],
//!     Depth::Infinite,
//!     EventKind::ContentChanged,
//! ));
//! queue.push(ChangeEvent::new(
//!     [ResourceHandle::container("/wc/a")],
//!     Depth::Infinite,
//!     EventKind::ContentChanged,
//! ));
//!
//! let events = queue.drain();
//! assert_eq!(events.len(), 1);
//! assert_eq!(events[0].resources()[0].path(), std::path::Path::new("/wc/a"));
//! ```

pub mod event;
pub mod queue;

pub use event::{ChangeEvent, EventKind};
pub use queue::{CoalescingQueue, EventListener};
