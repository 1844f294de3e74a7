//! # Session: one connection's inbound and outbound duties.
//!
//! A [`Session`] subscribes to the hub as soon as it is created, then
//! [`run`](Session::run) drives two duties concurrently until one of them ends:
//!
//! ```text
//! Session::new(hub, codec)                 ── hub.subscribe()  (Active)
//! Session::run(conn, cancel)
//!   select! {
//!     inbound:  loop { next_message ─► decode ─► remember ─► hub.publish }
//!     outbound: loop { subscription.recv ─► encode ─► send_message }
//!     evicted:  subscription.evicted()     (overflow; the backlog is dropped)
//!     cancel:   token.cancelled()
//!   }                                      ── first to finish wins, the rest is dropped
//! close(reason)                            (Closing)
//!   ├─► if last published: hub.publish(Left(last.user))
//!   ├─► subscription.unsubscribe()
//!   └─► sink.close()                       (Closed)
//! ```
//!
//! ## Rules
//! - Every failure is local: it is logged and turned into a [`CloseReason`].
//! - Teardown happens once, after both duties have stopped.
//! - A session that never published emits no leave event; one that did emits exactly one.
//! - The session receives its own events like any other subscriber.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::state::{CloseReason, SessionState};
use crate::codec::Codec;
use crate::events::Event;
use crate::hub::{Hub, Subscription};
use crate::transport::{Connection, MessageSink, MessageSource};

/// Process-wide session counter for log correlation.
static SESSION_SEQ: AtomicU64 = AtomicU64::new(1);

/// Per-connection session.
pub struct Session {
    id: u64,
    hub: Arc<Hub>,
    codec: Arc<dyn Codec>,
    subscription: Subscription,
    last_published: Option<Event>,
    state: SessionState,
}

impl Session {
    /// Creates an active session and registers its subscription with the hub.
    ///
    /// Events published from this point on are delivered to this session.
    pub fn new(hub: Arc<Hub>, codec: Arc<dyn Codec>) -> Self {
        let id = SESSION_SEQ.fetch_add(1, Ordering::Relaxed);
        let subscription = hub.subscribe();
        debug!(session = id, subscriber = %subscription.id(), "session created");
        Self {
            id,
            hub,
            codec,
            subscription,
            last_published: None,
            state: SessionState::Active,
        }
    }

    /// Creates a session and runs it on a new tokio task.
    ///
    /// The subscription is registered before this returns.
    pub fn spawn<C: Connection>(
        hub: Arc<Hub>,
        codec: Arc<dyn Codec>,
        conn: C,
        cancel: CancellationToken,
    ) -> JoinHandle<CloseReason> {
        let session = Self::new(hub, codec);
        tokio::spawn(session.run(conn, cancel))
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Runs both duties until the connection ends, fails, or `cancel` fires.
    pub async fn run<C: Connection>(mut self, conn: C, cancel: CancellationToken) -> CloseReason {
        let (mut source, mut sink) = conn.split();
        info!(session = self.id, subscriber = %self.subscription.id(), "session active");

        let evicted = self.subscription.evicted();
        let reason = {
            let inbound = read_loop(
                &self.hub,
                self.codec.as_ref(),
                &mut source,
                &mut self.last_published,
            );
            let outbound = write_loop(self.codec.as_ref(), &mut self.subscription, &mut sink);
            tokio::select! {
                reason = inbound => reason,
                reason = outbound => reason,
                _ = evicted => CloseReason::Evicted,
                _ = cancel.cancelled() => CloseReason::Cancelled,
            }
        };
        drop(source);

        self.close(reason, &mut sink).await
    }

    /// Single teardown transition: leave event, unsubscribe, release connection.
    async fn close<K: MessageSink>(mut self, reason: CloseReason, sink: &mut K) -> CloseReason {
        self.state = SessionState::Closing;
        if reason.is_error() {
            warn!(session = self.id, reason = %reason, label = reason.as_label(), "session failed");
        } else {
            debug!(session = self.id, reason = %reason, "session ending");
        }

        if let Some(last) = self.last_published.take() {
            let left = Event::left_from(&last);
            debug!(session = self.id, user = left.user(), "publishing leave event");
            self.hub.publish(left);
        }
        self.subscription.unsubscribe();
        sink.close().await;

        self.state = SessionState::Closed;
        info!(
            session = self.id,
            state = self.state.as_str(),
            reason = reason.as_label(),
            "session closed"
        );
        reason
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("subscription", &self.subscription.id())
            .field("state", &self.state)
            .finish()
    }
}

/// Inbound duty: decode and publish every message until the stream ends or fails.
async fn read_loop<S: MessageSource>(
    hub: &Hub,
    codec: &dyn Codec,
    source: &mut S,
    last_published: &mut Option<Event>,
) -> CloseReason {
    loop {
        let text = match source.next_message().await {
            Ok(Some(text)) => text,
            Ok(None) => return CloseReason::EndOfInput,
            Err(e) => return CloseReason::Read(e),
        };
        let event = match codec.decode(&text) {
            Ok(event) => event,
            Err(e) => return CloseReason::Decode(e),
        };
        *last_published = Some(event.clone());
        hub.publish(event);
    }
}

/// Outbound duty: encode and write every delivered event until the subscription ends or a write fails.
async fn write_loop<K: MessageSink>(
    codec: &dyn Codec,
    subscription: &mut Subscription,
    sink: &mut K,
) -> CloseReason {
    while let Some(event) = subscription.recv().await {
        if let Err(e) = sink.send_message(codec.encode(&event)).await {
            return CloseReason::Write(e);
        }
    }
    if subscription.is_evicted() {
        CloseReason::Evicted
    } else {
        CloseReason::HubClosed
    }
}
