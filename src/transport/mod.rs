//! # Transport boundary.
//!
//! The relay core never touches sockets directly. A [`Connection`] is split into
//! a [`MessageSource`] (inbound duty) and a [`MessageSink`] (outbound duty) so
//! both can run concurrently for the lifetime of a session.
//!
//! ## Architecture
//! ```text
//! Connection::split()
//!     ├──► MessageSource ──► next_message() ──► text | end-of-stream | TransportError
//!     └──► MessageSink   ──► send_message(text) / close()
//! ```
//!
//! ## Implementations
//! - [`memory`]: in-process channel pair, used by tests and embedders
//! - `ws`: WebSocket over `tokio-tungstenite` (feature `websocket`)
//!
//! ## Rules
//! - One call yields exactly one logical text message.
//! - `Ok(None)` from `next_message` means the peer finished cleanly.
//! - `close` must be safe to call after a failed write.

pub mod memory;
#[cfg(feature = "websocket")]
pub mod ws;

use async_trait::async_trait;

use crate::error::TransportError;

/// Inbound half of a connection.
#[async_trait]
pub trait MessageSource: Send + 'static {
    /// Waits for the next text message; `Ok(None)` at end of stream.
    async fn next_message(&mut self) -> Result<Option<String>, TransportError>;
}

/// Outbound half of a connection.
#[async_trait]
pub trait MessageSink: Send + 'static {
    /// Writes one text message.
    async fn send_message(&mut self, text: String) -> Result<(), TransportError>;

    /// Releases the underlying connection. Errors are swallowed.
    async fn close(&mut self);
}

/// A bidirectional text channel accepted by the transport layer.
pub trait Connection: Send + 'static {
    type Source: MessageSource;
    type Sink: MessageSink;

    /// Splits the connection into independently usable halves.
    fn split(self) -> (Self::Source, Self::Sink);
}
