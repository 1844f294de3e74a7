//! # Non-blocking event fan-out to subscriber queues.
//!
//! Provides [`SubscriberSet`], the hub's registry of live subscriber channels,
//! indexed by [`SubscriberId`]. It is only ever touched under the hub lock.
//!
//! ## Architecture
//! ```text
//! emit(event)
//!     │
//!     ├──► [queue 1] ──► Subscription 1 ──► session 1 outbound duty
//!     ├──► [queue 2] ──► Subscription 2 ──► session 2 outbound duty
//!     └──► [queue N] ──► Subscription N ──► session N outbound duty
//! ```
//!
//! ## Rules
//! - **Per-subscriber FIFO**: each queue receives events in emit order
//! - **Non-blocking**: `emit()` never awaits (unbounded `send` / bounded `try_send`)
//! - **Isolation**: a slow subscriber only affects its own queue
//! - **Overflow**: with a bounded queue the subscriber is evicted, never skipped,
//!   and its eviction token fires immediately
//! - **Closed queue**: a subscriber whose receiver is gone is pruned

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::events::Event;

/// Identifier of one registered subscriber, unique for the hub's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Sending half of a subscriber queue.
enum QueueTx {
    Unbounded(mpsc::UnboundedSender<Arc<Event>>),
    Bounded(mpsc::Sender<Arc<Event>>),
}

/// Receiving half of a subscriber queue.
pub(crate) enum QueueRx {
    Unbounded(mpsc::UnboundedReceiver<Arc<Event>>),
    Bounded(mpsc::Receiver<Arc<Event>>),
}

impl QueueRx {
    pub(crate) async fn recv(&mut self) -> Option<Arc<Event>> {
        match self {
            QueueRx::Unbounded(rx) => rx.recv().await,
            QueueRx::Bounded(rx) => rx.recv().await,
        }
    }

    pub(crate) fn try_recv(&mut self) -> Option<Arc<Event>> {
        match self {
            QueueRx::Unbounded(rx) => rx.try_recv().ok(),
            QueueRx::Bounded(rx) => rx.try_recv().ok(),
        }
    }

    pub(crate) fn poll_recv(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Arc<Event>>> {
        match self {
            QueueRx::Unbounded(rx) => rx.poll_recv(cx),
            QueueRx::Bounded(rx) => rx.poll_recv(cx),
        }
    }
}

/// Creates a queue with the given capacity (`None` = unbounded, min 1 otherwise).
fn queue(capacity: Option<usize>) -> (QueueTx, QueueRx) {
    match capacity {
        None => {
            let (tx, rx) = mpsc::unbounded_channel();
            (QueueTx::Unbounded(tx), QueueRx::Unbounded(rx))
        }
        Some(cap) => {
            let (tx, rx) = mpsc::channel(cap.max(1));
            (QueueTx::Bounded(tx), QueueRx::Bounded(rx))
        }
    }
}

/// Per-subscriber channel metadata.
struct SubscriberChannel {
    sender: QueueTx,
    evicted: CancellationToken,
}

/// Receiving side handed to a new subscriber.
pub(crate) struct Registration {
    pub(crate) id: SubscriberId,
    pub(crate) rx: QueueRx,
    /// Cancelled by the set the moment this subscriber is evicted.
    pub(crate) evicted: CancellationToken,
}

enum Delivery {
    Sent,
    Full,
    Closed,
}

/// Outcome of one [`SubscriberSet::emit`].
#[derive(Debug, Default)]
pub(crate) struct EmitReport {
    /// Subscribers that received the event.
    pub(crate) delivered: usize,
    /// Subscribers removed because their bounded queue was full.
    pub(crate) evicted: Vec<SubscriberId>,
    /// Subscribers removed because their receiver was dropped.
    pub(crate) pruned: Vec<SubscriberId>,
}

/// Arena of live subscriber channels.
pub(crate) struct SubscriberSet {
    channels: BTreeMap<SubscriberId, SubscriberChannel>,
    next_id: u64,
    capacity: Option<usize>,
}

impl SubscriberSet {
    pub(crate) fn new(capacity: Option<usize>) -> Self {
        Self {
            channels: BTreeMap::new(),
            next_id: 0,
            capacity,
        }
    }

    /// Allocates an id and a queue; registers the queue only if `register` is set.
    ///
    /// An unregistered queue has no sender left, so its receiver ends immediately
    /// after anything the caller prepends.
    pub(crate) fn register(&mut self, register: bool) -> Registration {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;

        let (sender, rx) = queue(self.capacity);
        let evicted = CancellationToken::new();
        if register {
            let _ = self.channels.insert(
                id,
                SubscriberChannel {
                    sender,
                    evicted: evicted.clone(),
                },
            );
        }
        Registration { id, rx, evicted }
    }

    /// Removes a subscriber; dropping its sender ends its queue once drained.
    pub(crate) fn remove(&mut self, id: SubscriberId) -> bool {
        self.channels.remove(&id).is_some()
    }

    /// Removes every subscriber.
    pub(crate) fn clear(&mut self) -> usize {
        let n = self.channels.len();
        self.channels.clear();
        n
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.channels.len()
    }

    /// Delivers a pre-allocated `Arc<Event>` to every subscriber, in id order.
    ///
    /// - Unbounded queue: `send` (never blocks)
    /// - Bounded queue: `try_send`; on full the subscriber's eviction token is cancelled and it is removed
    /// - Closed queue: the subscriber is removed
    pub(crate) fn emit(&mut self, event: &Arc<Event>) -> EmitReport {
        let mut report = EmitReport::default();

        for (id, channel) in &self.channels {
            let outcome = match &channel.sender {
                QueueTx::Unbounded(tx) => match tx.send(Arc::clone(event)) {
                    Ok(()) => Delivery::Sent,
                    Err(_) => Delivery::Closed,
                },
                QueueTx::Bounded(tx) => match tx.try_send(Arc::clone(event)) {
                    Ok(()) => Delivery::Sent,
                    Err(mpsc::error::TrySendError::Full(_)) => Delivery::Full,
                    Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Closed,
                },
            };
            match outcome {
                Delivery::Sent => report.delivered += 1,
                Delivery::Full => {
                    channel.evicted.cancel();
                    report.evicted.push(*id);
                }
                Delivery::Closed => report.pruned.push(*id),
            }
        }

        for id in report.evicted.iter().chain(report.pruned.iter()) {
            let _ = self.channels.remove(id);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(text: &str) -> Arc<Event> {
        Arc::new(Event::chat("u", text).unwrap())
    }

    #[test]
    fn test_emit_reaches_every_subscriber_in_order() {
        let mut set = SubscriberSet::new(None);
        let mut a = set.register(true);
        let mut b = set.register(true);

        for t in ["1", "2", "3"] {
            assert_eq!(set.emit(&ev(t)).delivered, 2);
        }
        for reg in [&mut a, &mut b] {
            let got: Vec<_> = std::iter::from_fn(|| reg.rx.try_recv())
                .map(|e| e.message().unwrap().to_string())
                .collect();
            assert_eq!(got, ["1", "2", "3"]);
        }
    }

    #[test]
    fn test_full_bounded_queue_evicts_only_that_subscriber() {
        let mut set = SubscriberSet::new(Some(1));
        let slow = set.register(true);
        let mut fast = set.register(true);

        assert_eq!(set.emit(&ev("1")).delivered, 2);
        let _ = fast.rx.try_recv();

        let report = set.emit(&ev("2"));
        assert_eq!(report.delivered, 1);
        assert_eq!(report.evicted, vec![slow.id]);
        assert!(slow.evicted.is_cancelled());
        assert!(!fast.evicted.is_cancelled());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_dropped_receiver_is_pruned() {
        let mut set = SubscriberSet::new(None);
        let gone = set.register(true);
        let gone_id = gone.id;
        drop(gone);

        let report = set.emit(&ev("x"));
        assert_eq!(report.pruned, vec![gone_id]);
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn test_unregistered_queue_ends_immediately() {
        let mut set = SubscriberSet::new(None);
        let mut reg = set.register(false);
        assert_eq!(set.len(), 0);
        let _ = set.emit(&ev("x"));
        assert!(reg.rx.try_recv().is_none());
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let mut set = SubscriberSet::new(None);
        let a = set.register(true).id;
        let b = set.register(true).id;
        assert!(a < b);
        assert_eq!(b.to_string(), format!("sub-{}", b.as_u64()));
    }
}
