//! # chat-relay
//!
//! **chat-relay** is a real-time broadcast relay. Clients connect over a
//! bidirectional text channel; every message a client sends is published to one
//! shared, ordered event stream, and every connected client (the sender
//! included) receives every event, preceded by the last `R` events on joining.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   client A            client B            client C
//!      │▲                  │▲                  │▲
//!      ▼│                  ▼│                  ▼│
//! ┌──────────┐        ┌──────────┐        ┌──────────┐
//! │ Session  │        │ Session  │        │ Session  │   one per connection
//! │ in │ out │        │ in │ out │        │ in │ out │   (two duties, one task)
//! └─┬──┴──▲──┘        └─┬──┴──▲──┘        └─┬──┴──▲──┘
//!   │decode│encode      │      │            │      │
//!   ▼      │            ▼      │            ▼      │
//! ┌───────────────────────────────────────────────────┐
//! │  Hub (one lock)                                   │
//! │  - ReplayBuffer (last R events, R = 25 default)   │
//! │  - SubscriberSet (one queue per subscriber)       │
//! └─────────┬─────────────────┬─────────────────┬─────┘
//!           ▼                 ▼                 ▼
//!       [queue A]         [queue B]         [queue C]
//!           └──► Subscription (replay first, then live)
//! ```
//!
//! ### Lifecycle
//! ```text
//! accept ─► Session::new(hub, codec)         hub.subscribe(): snapshot + register, atomically
//!        ─► Session::run(conn, token)
//!             ├─ inbound:  text ─► Codec::decode ─► Hub::publish
//!             ├─ outbound: Subscription ─► Codec::encode ─► send
//!             └─ ends on: end of input | read/decode/write error | eviction | cancel
//!        ─► teardown
//!             ├─ publish Left(user of last published event), if any
//!             ├─ unsubscribe
//!             └─ close the connection
//! ```
//!
//! ## Features
//! | Area          | Description                                           | Key types                                  |
//! |---------------|-------------------------------------------------------|--------------------------------------------|
//! | **Events**    | Immutable chat events shared by every subscriber.     | [`Event`], [`EventKind`], [`Payload`]      |
//! | **Hub**       | Ordered fan-out with bounded replay.                  | [`Hub`], [`HubBuilder`], [`Subscription`]  |
//! | **Sessions**  | Per-connection inbound/outbound duties and teardown.  | [`Session`], [`CloseReason`]               |
//! | **Codec**     | Wire text to and from events.                         | [`Codec`], [`JsonCodec`]                   |
//! | **Transport** | Connection boundary; in-memory implementation.        | [`Connection`], [`transport::memory`]      |
//! | **Policies**  | Per-subscriber queue backpressure.                    | [`OverflowPolicy`]                         |
//! | **Errors**    | Typed errors with stable log labels.                  | [`DecodeError`], [`TransportError`]        |
//!
//! ## Optional features
//! - `websocket`: WebSocket transport over `tokio-tungstenite` and the `Server`
//!   accept loop with OS-signal shutdown.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use chat_relay::{Hub, JsonCodec, Session, transport::memory};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let hub = Hub::builder().replay_capacity(25).build();
//!
//!     let (conn, mut client) = memory::pair();
//!     let session = Session::spawn(hub.clone(), Arc::new(JsonCodec), conn, CancellationToken::new());
//!
//!     client.send(r#"{"type":"JOIN","user":"alice"}"#);
//!     let echoed = client.recv().await;
//!     assert_eq!(echoed.as_deref(), Some(r#"{"type":"JOIN","user":"alice"}"#));
//!
//!     client.hang_up();
//!     let _ = session.await;
//! }
//! ```
mod codec;
mod config;
mod error;
mod events;
mod hub;
mod policies;
mod session;
pub mod transport;

// ---- Public re-exports ----

pub use codec::{Codec, JsonCodec};
pub use config::{DEFAULT_REPLAY_CAPACITY, HubConfig};
pub use error::{DecodeError, InvalidEvent, RuntimeError, TransportError};
pub use events::{Event, EventKind, Payload};
pub use hub::{Hub, HubBuilder, SubscriberId, Subscription};
pub use policies::OverflowPolicy;
pub use session::{CloseReason, Session, SessionState};
pub use transport::{Connection, MessageSink, MessageSource};

// Optional: WebSocket transport and accept-loop server.
// Enable with: `--features websocket`
#[cfg(feature = "websocket")]
mod server;
#[cfg(feature = "websocket")]
pub use config::ServerConfig;
#[cfg(feature = "websocket")]
pub use server::Server;
