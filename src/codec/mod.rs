//! # Wire codec boundary.
//!
//! Provides [`Codec`], the translation between one wire text message and one
//! [`Event`], and [`JsonCodec`], the JSON record format used on the wire:
//!
//! ```text
//! { "type": "JOIN" | "MESSAGE" | "USER_LEFT", "user": "<string>", "message": "<string, MESSAGE only>" }
//! ```
//!
//! ## Rules
//! - `decode` may fail with [`DecodeError`]; the session treats that as fatal to itself only.
//! - `encode` is total for any valid [`Event`].

mod json;

pub use json::JsonCodec;

use crate::error::DecodeError;
use crate::events::Event;

/// Translation between wire text and [`Event`].
///
/// Implementations must be cheap to share: one codec instance serves every session.
pub trait Codec: Send + Sync + 'static {
    /// Parses one inbound wire message.
    fn decode(&self, text: &str) -> Result<Event, DecodeError>;

    /// Renders one outbound wire message.
    fn encode(&self, event: &Event) -> String;
}
