//! # Hub: the single shared publish point.
//!
//! The [`Hub`] owns the replay window and the subscriber set. Every session
//! publishes into it and drains one [`Subscription`] from it.
//!
//! ## Architecture
//! ```text
//! Session A inbound ──┐                            ┌──► Subscription A ──► Session A outbound
//! Session B inbound ──┼──► publish(Event) ──► Hub ─┼──► Subscription B ──► Session B outbound
//! Session C inbound ──┘         │                  └──► Subscription C ──► Session C outbound
//!                               ▼
//!                         ReplayBuffer (last R)
//! ```
//!
//! ## Rules
//! - **Total order**: `publish` calls are serialized by one lock; every
//!   subscriber sees the same order.
//! - **Atomic join**: `subscribe` snapshots the replay window and registers the
//!   queue under that same lock, so a concurrent publish lands in exactly one of
//!   the two.
//! - **Never blocks on subscribers**: delivery is `send`/`try_send` only.
//! - **Echo**: the publisher's own subscription receives its events like any other.
//! - **No listeners is fine**: events are still recorded for replay.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::replay::ReplayBuffer;
use super::subscriber_set::{SubscriberId, SubscriberSet};
use super::subscription::Subscription;
use crate::config::HubConfig;
use crate::events::Event;
use crate::policies::OverflowPolicy;

/// State guarded by the hub lock.
struct HubState {
    replay: ReplayBuffer,
    subscribers: SubscriberSet,
    published: u64,
    closed: bool,
}

/// Broadcast hub with bounded replay.
pub struct Hub {
    cfg: HubConfig,
    state: Mutex<HubState>,
}

impl Hub {
    /// Creates a hub with the given configuration.
    pub fn new(cfg: HubConfig) -> Arc<Self> {
        let state = HubState {
            replay: ReplayBuffer::new(cfg.replay_capacity),
            subscribers: SubscriberSet::new(cfg.queue_capacity()),
            published: 0,
            closed: false,
        };
        Arc::new(Self {
            cfg,
            state: Mutex::new(state),
        })
    }

    /// Returns a builder with default configuration.
    pub fn builder() -> HubBuilder {
        HubBuilder::new()
    }

    #[inline]
    pub fn config(&self) -> &HubConfig {
        &self.cfg
    }

    /// Publishes an event to the replay window and every current subscriber.
    ///
    /// ### Flow (under the hub lock)
    /// 1. Append to the replay window (evicting the oldest if full)
    /// 2. Deliver the same `Arc<Event>` to every subscriber queue
    /// 3. Drop subscribers whose queue overflowed or whose receiver is gone
    pub fn publish(&self, event: Event) {
        let event = Arc::new(event);
        let (report, seq) = {
            let mut state = self.state.lock();
            state.replay.push(Arc::clone(&event));
            state.published += 1;
            let report = state.subscribers.emit(&event);
            (report, state.published)
        };

        debug!(
            seq,
            kind = %event.kind(),
            user = event.user(),
            recipients = report.delivered,
            "published event"
        );
        for id in &report.evicted {
            warn!(subscriber = %id, "subscriber queue full, evicting");
        }
        for id in &report.pruned {
            debug!(subscriber = %id, "pruned closed subscriber");
        }
    }

    /// Registers a new subscriber.
    ///
    /// The returned [`Subscription`] yields the replay window as of this call,
    /// then every event published afterwards. On a closed hub it yields the
    /// replay window and then ends.
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let (registration, replay) = {
            let mut state = self.state.lock();
            let live = !state.closed;
            (state.subscribers.register(live), state.replay.snapshot())
        };

        debug!(
            subscriber = %registration.id,
            replay = replay.len(),
            "subscribed"
        );
        Subscription::new(
            registration.id,
            replay,
            registration.rx,
            registration.evicted,
            Arc::clone(self),
        )
    }

    /// Removes a subscriber. Idempotent; returns true if it was still registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.state.lock().subscribers.remove(id);
        if removed {
            debug!(subscriber = %id, "unsubscribed");
        }
        removed
    }

    /// Tears the hub down: every subscriber drains what it already has, then ends.
    ///
    /// Publishing after `close` still records into the replay window.
    pub fn close(&self) {
        let dropped = {
            let mut state = self.state.lock();
            state.closed = true;
            state.subscribers.clear()
        };
        debug!(subscribers = dropped, "hub closed");
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.state.lock().subscribers.len()
    }

    /// Total number of events ever published.
    pub fn published_count(&self) -> u64 {
        self.state.lock().published
    }

    /// Copy of the current replay window, oldest first.
    pub fn replay_snapshot(&self) -> Vec<Arc<Event>> {
        self.state.lock().replay.snapshot().into()
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Hub")
            .field("cfg", &self.cfg)
            .field("subscribers", &state.subscribers.len())
            .field("replay", &state.replay.len())
            .field("published", &state.published)
            .field("closed", &state.closed)
            .finish()
    }
}

/// Builder for constructing a [`Hub`].
#[derive(Debug, Default)]
pub struct HubBuilder {
    cfg: HubConfig,
}

impl HubBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, cfg: HubConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the replay window size.
    pub fn replay_capacity(mut self, capacity: usize) -> Self {
        self.cfg.replay_capacity = capacity;
        self
    }

    /// Sets the subscriber queue policy.
    pub fn overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.cfg.overflow = overflow;
        self
    }

    /// Builds and returns the hub.
    pub fn build(self) -> Arc<Hub> {
        Hub::new(self.cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn msg(i: usize) -> Event {
        Event::chat("u", &i.to_string()).unwrap()
    }

    fn index(ev: &Event) -> usize {
        ev.message().unwrap().parse().unwrap()
    }

    fn drain(sub: &mut Subscription) -> Vec<usize> {
        std::iter::from_fn(|| sub.try_recv()).map(|e| index(&e)).collect()
    }

    #[test]
    fn test_subscriber_sees_publishes_in_order() {
        let hub = Hub::builder().build();
        let mut sub = hub.subscribe();
        for i in 0..10 {
            hub.publish(msg(i));
        }
        assert_eq!(drain(&mut sub), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_late_joiner_gets_full_history_below_capacity() {
        let hub = Hub::builder().replay_capacity(25).build();
        for i in 0..5 {
            hub.publish(msg(i));
        }
        let mut sub = hub.subscribe();
        assert_eq!(sub.pending_replay(), 5);
        hub.publish(msg(5));
        assert_eq!(drain(&mut sub), (0..6).collect::<Vec<_>>());
    }

    #[test]
    fn test_replay_after_r_plus_one_excludes_first() {
        let r = 25;
        let hub = Hub::builder().replay_capacity(r).build();
        for i in 1..=r + 1 {
            hub.publish(msg(i));
        }
        let mut sub = hub.subscribe();
        assert_eq!(drain(&mut sub), (2..=r + 1).collect::<Vec<_>>());
    }

    #[test]
    fn test_publish_without_subscribers_is_buffered() {
        let hub = Hub::builder().build();
        hub.publish(msg(1));
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(hub.published_count(), 1);
        assert_eq!(hub.replay_snapshot().len(), 1);
    }

    #[test]
    fn test_subscriber_added_later_gets_no_earlier_live_copy() {
        let hub = Hub::builder().replay_capacity(0).build();
        hub.publish(msg(1));
        let mut sub = hub.subscribe();
        hub.publish(msg(2));
        assert_eq!(drain(&mut sub), vec![2]);
    }

    #[test]
    fn test_unsubscribe_is_idempotent_and_stops_delivery() {
        let hub = Hub::builder().build();
        let mut sub = hub.subscribe();
        hub.publish(msg(1));
        sub.unsubscribe();
        sub.unsubscribe();
        assert!(!hub.unsubscribe(sub.id()));
        hub.publish(msg(2));
        assert_eq!(drain(&mut sub), vec![1]);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let hub = Hub::builder().build();
        let sub = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 1);
        drop(sub);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_close_ends_every_subscription() {
        let hub = Hub::builder().build();
        let mut sub = hub.subscribe();
        hub.publish(msg(1));
        hub.close();
        assert!(hub.is_closed());
        assert_eq!(sub.recv().await.map(|e| index(&e)), Some(1));
        assert!(sub.recv().await.is_none());

        hub.publish(msg(2));
        let mut late = hub.subscribe();
        assert_eq!(late.recv().await.map(|e| index(&e)), Some(1));
        assert_eq!(late.recv().await.map(|e| index(&e)), Some(2));
        assert!(late.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_overflow_evicts_slow_subscriber_only() {
        let hub = Hub::builder()
            .overflow(OverflowPolicy::Disconnect { capacity: 2 })
            .build();
        let mut slow = hub.subscribe();
        let mut fast = hub.subscribe();

        for i in 0..3 {
            hub.publish(msg(i));
            assert_eq!(fast.recv().await.map(|e| index(&e)), Some(i));
        }

        assert!(slow.is_evicted());
        assert!(!fast.is_evicted());
        tokio::time::timeout(std::time::Duration::from_secs(1), slow.evicted())
            .await
            .expect("eviction signal did not fire");
        assert_eq!(hub.subscriber_count(), 1);
        assert_eq!(slow.recv().await.map(|e| index(&e)), Some(0));
        assert_eq!(slow.recv().await.map(|e| index(&e)), Some(1));
        assert!(slow.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_subscription_is_a_stream() {
        use futures::StreamExt;

        let hub = Hub::builder().build();
        hub.publish(msg(0));
        let mut sub = hub.subscribe();
        hub.publish(msg(1));
        hub.close();
        let got: Vec<usize> = sub.by_ref().map(|e| index(&e)).collect().await;
        assert_eq!(got, vec![0, 1]);
    }

    /// Concurrent publishers and joiners: each subscriber's merged replay+live
    /// sequence must be a contiguous run of the global publish order.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_subscribe_has_no_gap_or_duplicate() {
        const PUBLISHERS: usize = 4;
        const PER_PUBLISHER: usize = 250;
        const JOINERS: usize = 16;
        let total = PUBLISHERS * PER_PUBLISHER;

        let hub = Hub::builder().replay_capacity(8).build();
        let mut observer = hub.subscribe();

        let mut publishers = Vec::new();
        for p in 0..PUBLISHERS {
            let hub = Arc::clone(&hub);
            publishers.push(tokio::spawn(async move {
                for i in 0..PER_PUBLISHER {
                    hub.publish(Event::chat("u", &format!("{p}:{i}")).unwrap());
                    if i % 16 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            }));
        }

        let mut joiners = Vec::new();
        for _ in 0..JOINERS {
            let hub = Arc::clone(&hub);
            joiners.push(tokio::spawn(async move {
                tokio::task::yield_now().await;
                hub.subscribe()
            }));
        }

        let mut subs = Vec::new();
        for j in joiners {
            subs.push(j.await.unwrap());
        }
        for p in publishers {
            p.await.unwrap();
        }
        hub.close();

        let mut global = Vec::new();
        while let Some(ev) = observer.recv().await {
            global.push(ev.message().unwrap().to_string());
        }
        assert_eq!(global.len(), total);

        for mut sub in subs {
            let mut seen = Vec::new();
            while let Some(ev) = sub.recv().await {
                seen.push(ev.message().unwrap().to_string());
            }
            assert!(!seen.is_empty() || global.is_empty());
            let start = global
                .iter()
                .position(|m| Some(m) == seen.first())
                .unwrap_or(global.len());
            assert_eq!(
                &global[start..],
                &seen[..],
                "subscriber saw a gap, duplicate or reordering"
            );
        }
    }

    proptest! {
        #[test]
        fn prop_order_and_replay_window(
            before in 0usize..60,
            after in 0usize..20,
            capacity in 0usize..30,
        ) {
            let hub = Hub::builder().replay_capacity(capacity).build();
            let mut early = hub.subscribe();
            for i in 0..before {
                hub.publish(msg(i));
            }
            let mut late = hub.subscribe();
            for i in before..before + after {
                hub.publish(msg(i));
            }

            let expected_replay_start = before.saturating_sub(capacity);
            prop_assert_eq!(drain(&mut early), (0..before + after).collect::<Vec<_>>());
            prop_assert_eq!(
                drain(&mut late),
                (expected_replay_start..before + after).collect::<Vec<_>>()
            );
        }
    }
}
