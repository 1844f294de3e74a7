//! Session lifecycle states and close reasons.

use std::fmt;

use crate::error::{DecodeError, TransportError};

/// Lifecycle of one connection session.
///
/// ```text
/// Active ──(EOF | read/decode error | write error | eviction | cancel)──► Closing ──► Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Inbound and outbound duties are running.
    Active,
    /// Leave event published, subscription and connection being released.
    Closing,
    /// Terminal.
    Closed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Active => "active",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
        }
    }
}

/// Why a session left [`SessionState::Active`].
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The peer finished its inbound stream.
    EndOfInput,
    /// An inbound message could not be decoded.
    Decode(DecodeError),
    /// Reading from the connection failed.
    Read(TransportError),
    /// Writing to the connection failed.
    Write(TransportError),
    /// The hub dropped this subscriber because its queue overflowed.
    Evicted,
    /// The hub was closed.
    HubClosed,
    /// The session was cancelled from outside (server shutdown).
    Cancelled,
}

impl CloseReason {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            CloseReason::EndOfInput => "end_of_input",
            CloseReason::Decode(e) => e.as_label(),
            CloseReason::Read(e) | CloseReason::Write(e) => e.as_label(),
            CloseReason::Evicted => "evicted",
            CloseReason::HubClosed => "hub_closed",
            CloseReason::Cancelled => "cancelled",
        }
    }

    /// Returns true if the session ended because something went wrong.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            CloseReason::Decode(_)
                | CloseReason::Read(_)
                | CloseReason::Write(_)
                | CloseReason::Evicted
        )
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::EndOfInput => f.write_str("end of input"),
            CloseReason::Decode(e) => write!(f, "decode error: {e}"),
            CloseReason::Read(e) | CloseReason::Write(e) => write!(f, "transport error: {e}"),
            CloseReason::Evicted => f.write_str("evicted (queue overflow)"),
            CloseReason::HubClosed => f.write_str("hub closed"),
            CloseReason::Cancelled => f.write_str("cancelled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(!CloseReason::EndOfInput.is_error());
        assert!(!CloseReason::Cancelled.is_error());
        assert!(CloseReason::Decode(DecodeError::MissingUser).is_error());
        assert!(CloseReason::Write(TransportError::Closed).is_error());
        assert_eq!(
            CloseReason::Read(TransportError::Closed).as_label(),
            "transport_closed"
        );
    }
}
