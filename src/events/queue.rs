//! Bounded queue that folds compatible events together.

use std::collections::VecDeque;

use tracing::debug;

use crate::config::Settings;

use super::ChangeEvent;

/// Receives delivered events.
pub trait EventListener {
    /// Handle one event.
    fn on_event(&self, event: &ChangeEvent);
}

impl<F: Fn(&ChangeEvent)> EventListener for F {
    fn on_event(&self, event: &ChangeEvent) {
        self(event)
    }
}

/// Pending events waiting for delivery.
///
/// A pushed event is merged into the newest pending event when the two can
/// merge. Otherwise it is appended, and if the queue is full the oldest
/// skippable event is dropped first. Delivery follows push order: an event
/// is never folded past a different one queued after it.
#[derive(Debug)]
pub struct CoalescingQueue {
    pending: VecDeque<ChangeEvent>,
    limit: usize,
    dropped: usize,
}

impl CoalescingQueue {
    /// Create a queue holding at most `limit` events (at least one).
    pub fn new(limit: usize) -> Self {
        Self {
            pending: VecDeque::new(),
            limit: limit.max(1),
            dropped: 0,
        }
    }

    /// Create a queue bounded by [`Settings::event_queue_limit`].
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.event_queue_limit)
    }

    /// Queue an event.
    pub fn push(&mut self, event: ChangeEvent) {
        if let Some(last) = self.pending.back_mut() {
            if last.can_merge(&event) {
                *last = last.merge(&event);
                return;
            }
        }

        if self.pending.len() >= self.limit {
            if let Some(pos) = self.pending.iter().position(ChangeEvent::can_skip) {
                self.pending.remove(pos);
                self.dropped += 1;
                debug!("Event queue full, dropped the oldest pending event");
            }
        }
        self.pending.push_back(event);
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of events dropped because the queue was full.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Take every pending event, oldest first.
    pub fn drain(&mut self) -> Vec<ChangeEvent> {
        self.pending.drain(..).collect()
    }

    /// Hand every pending event to each listener once, oldest first.
    ///
    /// Returns the number of events delivered.
    pub fn deliver(&mut self, listeners: &[&dyn EventListener]) -> usize {
        let events = self.drain();
        for event in &events {
            for listener in listeners {
                listener.on_event(event);
            }
        }
        events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::resource::{Depth, ResourceHandle};
    use std::cell::RefCell;

    fn event(path: &str, depth: Depth, kind: EventKind) -> ChangeEvent {
        ChangeEvent::new([ResourceHandle::file(path)], depth, kind)
    }

    #[test]
    fn compatible_events_are_merged() {
        let mut queue = CoalescingQueue::new(8);
        queue.push(event("/p/a", Depth::Infinite, EventKind::ContentChanged));
        queue.push(event("/p/b", Depth::Infinite, EventKind::ContentChanged));

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.drain()[0].resources().len(), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn incompatible_events_queue_up_in_order() {
        let mut queue = CoalescingQueue::new(8);
        queue.push(event("/p/a", Depth::Infinite, EventKind::ContentChanged));
        queue.push(event("/p/b", Depth::NodeOnly, EventKind::ContentChanged));
        queue.push(event("/p/c", Depth::Infinite, EventKind::StructureChanged));

        let kinds: Vec<(Depth, EventKind)> =
            queue.drain().iter().map(|e| (e.depth(), e.kind())).collect();
        assert_eq!(
            kinds,
            vec![
                (Depth::Infinite, EventKind::ContentChanged),
                (Depth::NodeOnly, EventKind::ContentChanged),
                (Depth::Infinite, EventKind::StructureChanged),
            ]
        );
    }

    #[test]
    fn full_queue_drops_the_oldest() {
        let mut queue = CoalescingQueue::new(2);
        queue.push(event("/p/a", Depth::Infinite, EventKind::ContentChanged));
        queue.push(event("/p/b", Depth::NodeOnly, EventKind::ContentChanged));
        queue.push(event("/p/c", Depth::NodeOnly, EventKind::StructureChanged));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.dropped(), 1);
        assert_eq!(queue.drain()[0].depth(), Depth::NodeOnly);
    }

    #[test]
    fn deliver_reaches_every_listener_once() {
        let mut queue = CoalescingQueue::new(8);
        queue.push(event("/p/a", Depth::Infinite, EventKind::ContentChanged));
        queue.push(event("/p/b", Depth::NodeOnly, EventKind::StructureChanged));

        let first = RefCell::new(Vec::new());
        let second = RefCell::new(0);
        let record = |e: &ChangeEvent| first.borrow_mut().push(e.kind());
        let count = |_: &ChangeEvent| *second.borrow_mut() += 1;

        let delivered = queue.deliver(&[&record, &count]);

        assert_eq!(delivered, 2);
        assert_eq!(
            *first.borrow(),
            vec![EventKind::ContentChanged, EventKind::StructureChanged]
        );
        assert_eq!(*second.borrow(), 2);
        assert_eq!(queue.deliver(&[&record]), 0);
    }

    #[test]
    fn interleaved_kinds_keep_push_order() {
        let mut queue = CoalescingQueue::new(8);
        queue.push(event("/p/a", Depth::Infinite, EventKind::ContentChanged));
        queue.push(event("/p/b", Depth::Infinite, EventKind::StructureChanged));
        queue.push(event("/p/c", Depth::Infinite, EventKind::ContentChanged));

        let events = queue.drain();
        let kinds: Vec<EventKind> = events.iter().map(ChangeEvent::kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::ContentChanged,
                EventKind::StructureChanged,
                EventKind::ContentChanged,
            ]
        );
        assert_eq!(events[2].resources()[0].path(), std::path::Path::new("/p/c"));
    }

    #[test]
    fn alternating_kinds_reach_the_limit() {
        let mut queue = CoalescingQueue::new(3);
        for i in 0..5 {
            let kind = if i % 2 == 0 {
                EventKind::ContentChanged
            } else {
                EventKind::StructureChanged
            };
            queue.push(event(&format!("/p/{}", i), Depth::Infinite, kind));
        }

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.dropped(), 2);
        let first = queue.drain().remove(0);
        assert_eq!(first.resources()[0].path(), std::path::Path::new("/p/2"));
    }
}
