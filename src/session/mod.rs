//! Connection sessions: per-connection glue between a transport and the hub.
//!
//! ## Contents
//! - [`Session`] runs the inbound and outbound duties of one connection
//! - [`SessionState`] `Active → Closing → Closed`
//! - [`CloseReason`] why a session ended
//!
//! ## Quick reference
//! ```text
//! inbound:  MessageSource ──► Codec::decode ──► Hub::publish
//! outbound: Subscription  ──► Codec::encode ──► MessageSink
//! closing:  publish Left(last user) ──► unsubscribe ──► MessageSink::close
//! ```

mod session;
mod state;

pub use session::Session;
pub use state::{CloseReason, SessionState};
