//! Error types used by the relay.
//!
//! - [`InvalidEvent`] an [`Event`](crate::Event) could not be constructed.
//! - [`DecodeError`] a wire message could not be turned into an event.
//! - [`TransportError`] a connection failed to read or write.
//! - [`RuntimeError`] the server itself failed (bind, shutdown grace).
//!
//! The hub has no error type: `publish` and `subscribe` always succeed.
//! Per-connection errors ([`DecodeError`], [`TransportError`]) end only the
//! session that hit them.
//!
//! Every enum provides `as_label()` (stable snake_case) for logs.

use std::time::Duration;
use thiserror::Error;

/// # Event construction failure.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidEvent {
    /// The `user` field was empty.
    #[error("invalid event: user must not be empty")]
    EmptyUser,
}

impl InvalidEvent {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use chat_relay::InvalidEvent;
    ///
    /// assert_eq!(InvalidEvent::EmptyUser.as_label(), "invalid_event_empty_user");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            InvalidEvent::EmptyUser => "invalid_event_empty_user",
        }
    }
}

/// # Malformed wire input.
///
/// Fatal to the session that received it, harmless to everyone else.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The text is not a well-formed record.
    #[error("malformed message: {error}")]
    Malformed {
        /// Parser diagnostic.
        error: String,
    },

    /// The record has no `user` field.
    #[error("missing field `user`")]
    MissingUser,

    /// The record has no `type` field.
    #[error("missing field `type`")]
    MissingType,

    /// The `type` field names no known event kind.
    #[error("unknown event type `{kind}`")]
    UnknownType {
        /// The offending type tag.
        kind: String,
    },

    /// A `MESSAGE` record has no `message` field.
    #[error("missing field `message` for MESSAGE event")]
    MissingMessage,

    /// The record decoded but describes an invalid event.
    #[error(transparent)]
    Invalid(#[from] InvalidEvent),
}

impl DecodeError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            DecodeError::Malformed { .. } => "decode_malformed",
            DecodeError::MissingUser => "decode_missing_user",
            DecodeError::MissingType => "decode_missing_type",
            DecodeError::UnknownType { .. } => "decode_unknown_type",
            DecodeError::MissingMessage => "decode_missing_message",
            DecodeError::Invalid(_) => "decode_invalid_event",
        }
    }
}

/// # Connection-level read/write failure.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Reading the next message failed.
    #[error("read failed: {error}")]
    Read {
        /// Underlying error message.
        error: String,
    },

    /// Writing a message failed.
    #[error("write failed: {error}")]
    Write {
        /// Underlying error message.
        error: String,
    },

    /// The peer side of the connection is already gone.
    #[error("connection closed")]
    Closed,

    /// The peer sent a frame that is not a text message.
    #[error("unsupported frame: {kind}")]
    UnsupportedFrame {
        /// Frame kind, for diagnostics.
        kind: &'static str,
    },
}

impl TransportError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use chat_relay::TransportError;
    ///
    /// let err = TransportError::Write { error: "broken pipe".into() };
    /// assert_eq!(err.as_label(), "transport_write");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TransportError::Read { .. } => "transport_read",
            TransportError::Write { .. } => "transport_write",
            TransportError::Closed => "transport_closed",
            TransportError::UnsupportedFrame { .. } => "transport_unsupported_frame",
        }
    }
}

/// # Errors produced by the relay server runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The listener could not be bound.
    #[error("failed to bind listener: {0}")]
    Bind(#[source] std::io::Error),

    /// The shutdown signal handler could not be installed.
    #[error("failed to install shutdown signal handler: {0}")]
    Signal(#[source] std::io::Error),

    /// Shutdown grace period was exceeded; some sessions were still running.
    #[error("shutdown timeout {grace:?} exceeded; {stuck} session(s) still running")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Number of sessions that did not finish in time.
        stuck: usize,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Bind(_) => "runtime_bind",
            RuntimeError::Signal(_) => "runtime_signal",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}
