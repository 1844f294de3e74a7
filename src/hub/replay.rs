//! # Bounded replay window.
//!
//! [`ReplayBuffer`] keeps the last `capacity` published events in publish order.
//! New subscribers receive a snapshot of it before any live event.
//!
//! ## Rules
//! - Insertion order is preserved.
//! - Once full, the oldest event is evicted first.
//! - `capacity = 0` keeps nothing.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::events::Event;

/// Ring of the most recent events.
#[derive(Debug)]
pub(crate) struct ReplayBuffer {
    events: VecDeque<Arc<Event>>,
    capacity: usize,
}

impl ReplayBuffer {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends an event, evicting the oldest one if the window is full.
    pub(crate) fn push(&mut self, event: Arc<Event>) {
        if self.capacity == 0 {
            return;
        }
        if self.events.len() == self.capacity {
            let _ = self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Returns a copy of the window, oldest first.
    pub(crate) fn snapshot(&self) -> VecDeque<Arc<Event>> {
        self.events.clone()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(i: usize) -> Arc<Event> {
        Arc::new(Event::chat("u", &i.to_string()).unwrap())
    }

    fn texts(buf: &ReplayBuffer) -> Vec<String> {
        buf.snapshot()
            .iter()
            .map(|e| e.message().unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn test_keeps_everything_below_capacity() {
        let mut buf = ReplayBuffer::new(3);
        buf.push(ev(1));
        buf.push(ev(2));
        assert_eq!(texts(&buf), ["1", "2"]);
    }

    #[test]
    fn test_evicts_oldest_first() {
        let mut buf = ReplayBuffer::new(3);
        for i in 1..=5 {
            buf.push(ev(i));
        }
        assert_eq!(buf.len(), 3);
        assert_eq!(texts(&buf), ["3", "4", "5"]);
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let mut buf = ReplayBuffer::new(0);
        buf.push(ev(1));
        assert_eq!(buf.len(), 0);
        assert!(buf.snapshot().is_empty());
    }
}
