//! Chat events: the record model shared by the hub and every session.
//!
//! ## Contents
//! - [`EventKind`], [`Event`], [`Payload`] event classification and data
//!
//! ## Quick reference
//! - **Publishers**: `Session` inbound duty (decoded client messages) and
//!   `Session` teardown (synthesized `Left`).
//! - **Consumers**: every `Subscription` handed out by the `Hub`.

mod event;

pub use event::{Event, EventKind, Payload};
