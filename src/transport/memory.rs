//! # In-memory transport.
//!
//! [`pair`] returns a [`MemoryConnection`] for the relay side and a
//! [`MemoryPeer`] that plays the remote client: it sends messages, injects
//! read errors, breaks writes, hangs up, and reads what the relay wrote.
//!
//! ```text
//! MemoryPeer::send ──► [inbound queue] ──► MemorySource::next_message
//! MemoryPeer::recv ◄── [outbound queue] ◄── MemorySink::send_message
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{Connection, MessageSink, MessageSource};
use crate::error::TransportError;

type Inbound = Result<String, TransportError>;

/// Creates a connected relay/peer pair.
pub fn pair() -> (MemoryConnection, MemoryPeer) {
    let (in_tx, in_rx) = mpsc::unbounded_channel();
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let broken = Arc::new(AtomicBool::new(false));

    let conn = MemoryConnection {
        source: MemorySource { rx: in_rx },
        sink: MemorySink {
            tx: Some(out_tx),
            broken: Arc::clone(&broken),
        },
    };
    let peer = MemoryPeer {
        tx: Some(in_tx),
        rx: out_rx,
        broken,
    };
    (conn, peer)
}

/// Relay side of an in-memory connection.
pub struct MemoryConnection {
    source: MemorySource,
    sink: MemorySink,
}

impl Connection for MemoryConnection {
    type Source = MemorySource;
    type Sink = MemorySink;

    fn split(self) -> (MemorySource, MemorySink) {
        (self.source, self.sink)
    }
}

/// Inbound half of [`MemoryConnection`].
pub struct MemorySource {
    rx: mpsc::UnboundedReceiver<Inbound>,
}

#[async_trait]
impl MessageSource for MemorySource {
    async fn next_message(&mut self) -> Result<Option<String>, TransportError> {
        match self.rx.recv().await {
            Some(Ok(text)) => Ok(Some(text)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }
}

/// Outbound half of [`MemoryConnection`].
pub struct MemorySink {
    tx: Option<mpsc::UnboundedSender<String>>,
    broken: Arc<AtomicBool>,
}

#[async_trait]
impl MessageSink for MemorySink {
    async fn send_message(&mut self, text: String) -> Result<(), TransportError> {
        if self.broken.load(Ordering::Acquire) {
            return Err(TransportError::Write {
                error: "broken pipe".into(),
            });
        }
        match &self.tx {
            Some(tx) => tx.send(text).map_err(|_| TransportError::Closed),
            None => Err(TransportError::Closed),
        }
    }

    async fn close(&mut self) {
        self.tx = None;
    }
}

/// Remote-client side of an in-memory connection.
pub struct MemoryPeer {
    tx: Option<mpsc::UnboundedSender<Inbound>>,
    rx: mpsc::UnboundedReceiver<String>,
    broken: Arc<AtomicBool>,
}

impl MemoryPeer {
    /// Sends one text message to the relay. Returns false after [`hang_up`](Self::hang_up).
    pub fn send(&self, text: impl Into<String>) -> bool {
        self.tx
            .as_ref()
            .is_some_and(|tx| tx.send(Ok(text.into())).is_ok())
    }

    /// Makes the relay's next read fail with `error`.
    pub fn inject_error(&self, error: TransportError) -> bool {
        self.tx.as_ref().is_some_and(|tx| tx.send(Err(error)).is_ok())
    }

    /// Makes every subsequent relay write fail.
    pub fn break_writes(&self) {
        self.broken.store(true, Ordering::Release);
    }

    /// Ends the relay's inbound stream (clean end-of-input).
    pub fn hang_up(&mut self) {
        self.tx = None;
    }

    /// Waits for the next message written by the relay; `None` once the relay closed.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Returns the next written message if one is already queued.
    pub fn try_recv(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_messages_flow_both_ways() {
        let (conn, mut peer) = pair();
        let (mut source, mut sink) = conn.split();

        assert!(peer.send("ping"));
        assert_eq!(source.next_message().await, Ok(Some("ping".to_string())));

        sink.send_message("pong".into()).await.unwrap();
        assert_eq!(peer.recv().await.as_deref(), Some("pong"));
    }

    #[tokio::test]
    async fn test_hang_up_is_end_of_stream() {
        let (conn, mut peer) = pair();
        let (mut source, _sink) = conn.split();
        peer.hang_up();
        assert!(!peer.send("late"));
        assert_eq!(source.next_message().await, Ok(None));
    }

    #[tokio::test]
    async fn test_injected_error_and_broken_writes() {
        let (conn, mut peer) = pair();
        let (mut source, mut sink) = conn.split();

        assert!(peer.inject_error(TransportError::Read {
            error: "reset".into()
        }));
        assert!(matches!(
            source.next_message().await,
            Err(TransportError::Read { .. })
        ));

        peer.break_writes();
        assert!(matches!(
            sink.send_message("x".into()).await,
            Err(TransportError::Write { .. })
        ));

        sink.close().await;
        assert!(peer.recv().await.is_none());
    }
}
