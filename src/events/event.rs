//! # Chat events carried by the hub.
//!
//! The [`EventKind`] enum classifies what happened:
//! - **Join**: a user announced themselves
//! - **Message**: a user said something
//! - **Left**: a user's connection went away (synthesized by the session)
//!
//! The [`Event`] struct pairs a kind with a [`Payload`]. Events are immutable
//! values: once built they are wrapped in `Arc` by the hub and shared read-only
//! by every subscriber of a single publish.
//!
//! ## Example
//! ```rust
//! use chat_relay::{Event, EventKind};
//!
//! let ev = Event::chat("alice", "hi").unwrap();
//! assert_eq!(ev.kind(), EventKind::Message);
//! assert_eq!(ev.user(), "alice");
//! assert_eq!(ev.message(), Some("hi"));
//!
//! assert!(Event::join("").is_err());
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::InvalidEvent;

/// Classification of chat events.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A user joined.
    ///
    /// Sets:
    /// - `user`: who joined
    Join,

    /// A user posted a message.
    ///
    /// Sets:
    /// - `user`: author
    /// - `message`: text (may be empty)
    Message,

    /// A user's connection ended.
    ///
    /// Sets:
    /// - `user`: the last user the departing connection published as
    Left,
}

impl EventKind {
    /// Returns the wire tag for this kind.
    pub fn as_wire(&self) -> &'static str {
        match self {
            EventKind::Join => "JOIN",
            EventKind::Message => "MESSAGE",
            EventKind::Left => "USER_LEFT",
        }
    }

    /// Parses a wire tag.
    pub fn from_wire(tag: &str) -> Option<Self> {
        match tag {
            "JOIN" => Some(EventKind::Join),
            "MESSAGE" => Some(EventKind::Message),
            "USER_LEFT" => Some(EventKind::Left),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Event data: who, and for messages, what.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Payload {
    user: Arc<str>,
    message: Option<Arc<str>>,
}

impl Payload {
    /// Non-empty user identifier.
    #[inline]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Message text; `Some` only for [`EventKind::Message`].
    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// Immutable chat event.
///
/// Equality is structural: two events with the same kind, user and message are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Event {
    kind: EventKind,
    payload: Payload,
}

impl Event {
    /// Builds an event from its parts.
    ///
    /// - `user` must be non-empty, otherwise [`InvalidEvent::EmptyUser`].
    /// - For [`EventKind::Message`] a missing `message` is stored as `""`.
    /// - For other kinds `message` is discarded.
    pub fn new(
        kind: EventKind,
        user: impl Into<Arc<str>>,
        message: Option<&str>,
    ) -> Result<Self, InvalidEvent> {
        let user = user.into();
        if user.is_empty() {
            return Err(InvalidEvent::EmptyUser);
        }
        let message = match kind {
            EventKind::Message => Some(Arc::from(message.unwrap_or_default())),
            EventKind::Join | EventKind::Left => None,
        };
        Ok(Self {
            kind,
            payload: Payload { user, message },
        })
    }

    /// Creates a join event.
    #[inline]
    pub fn join(user: impl Into<Arc<str>>) -> Result<Self, InvalidEvent> {
        Self::new(EventKind::Join, user, None)
    }

    /// Creates a message event.
    #[inline]
    pub fn chat(user: impl Into<Arc<str>>, text: &str) -> Result<Self, InvalidEvent> {
        Self::new(EventKind::Message, user, Some(text))
    }

    /// Creates a leave event.
    #[inline]
    pub fn left(user: impl Into<Arc<str>>) -> Result<Self, InvalidEvent> {
        Self::new(EventKind::Left, user, None)
    }

    /// Creates the leave event for the author of `last`.
    ///
    /// Infallible: `last` already carries a non-empty user.
    pub fn left_from(last: &Event) -> Self {
        Self {
            kind: EventKind::Left,
            payload: Payload {
                user: Arc::clone(&last.payload.user),
                message: None,
            },
        }
    }

    #[inline]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    #[inline]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    #[inline]
    pub fn user(&self) -> &str {
        self.payload.user()
    }

    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.payload.message()
    }

    #[inline]
    pub fn is_left(&self) -> bool {
        matches!(self.kind, EventKind::Left)
    }
}
