//! # Subscription handle returned by [`Hub::subscribe`].
//!
//! A [`Subscription`] yields, in order:
//! 1. the replay snapshot taken at registration time,
//! 2. every event published after that snapshot,
//! 3. end-of-stream (`None`) once it is unsubscribed, evicted, or the hub closes.
//!
//! ## Rules
//! - Replay and live delivery never overlap or leave a gap (both are decided
//!   under the hub lock in one step).
//! - Eviction is observable at once through [`Subscription::evicted`], before
//!   the backlog is drained.
//! - Dropping the subscription unsubscribes it.
//! - [`Subscription::unsubscribe`] is idempotent.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

use super::Hub;
use super::subscriber_set::{QueueRx, SubscriberId};
use crate::events::Event;

/// Live handle on the hub's event stream.
pub struct Subscription {
    id: SubscriberId,
    replay: VecDeque<Arc<Event>>,
    rx: QueueRx,
    evicted: CancellationToken,
    hub: Arc<Hub>,
    active: bool,
}

impl Subscription {
    pub(crate) fn new(
        id: SubscriberId,
        replay: VecDeque<Arc<Event>>,
        rx: QueueRx,
        evicted: CancellationToken,
        hub: Arc<Hub>,
    ) -> Self {
        Self {
            id,
            replay,
            rx,
            evicted,
            hub,
            active: true,
        }
    }

    #[inline]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Number of replayed events not yet consumed.
    #[inline]
    pub fn pending_replay(&self) -> usize {
        self.replay.len()
    }

    /// Returns true if the hub dropped this subscriber because its queue overflowed.
    #[inline]
    pub fn is_evicted(&self) -> bool {
        self.evicted.is_cancelled()
    }

    /// Resolves as soon as the hub evicts this subscriber; never resolves otherwise.
    ///
    /// Independent of the subscription borrow, so it can be awaited next to [`recv`](Self::recv).
    pub fn evicted(&self) -> WaitForCancellationFutureOwned {
        self.evicted.clone().cancelled_owned()
    }

    /// Waits for the next event; `None` once the stream has ended.
    ///
    /// Cancel safe: dropping the future never loses an event.
    pub async fn recv(&mut self) -> Option<Arc<Event>> {
        if let Some(ev) = self.replay.pop_front() {
            return Some(ev);
        }
        self.rx.recv().await
    }

    /// Returns the next event if one is immediately available.
    pub fn try_recv(&mut self) -> Option<Arc<Event>> {
        self.replay.pop_front().or_else(|| self.rx.try_recv())
    }

    /// Removes this subscriber from the hub.
    ///
    /// Events already queued stay readable; nothing new is delivered.
    pub fn unsubscribe(&mut self) {
        if self.active {
            self.active = false;
            let _ = self.hub.unsubscribe(self.id);
        }
    }
}

impl Stream for Subscription {
    type Item = Arc<Event>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if let Some(ev) = self.replay.pop_front() {
            return Poll::Ready(Some(ev));
        }
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("pending_replay", &self.replay.len())
            .field("active", &self.active)
            .finish()
    }
}
