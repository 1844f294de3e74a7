//! JSON rendition of the wire record (`serde_json`).

use serde::{Deserialize, Serialize};

use super::Codec;
use crate::error::DecodeError;
use crate::events::{Event, EventKind};

/// Inbound record shape; every field optional so that absence maps to a
/// precise [`DecodeError`] instead of a generic parse failure.
#[derive(Deserialize)]
struct WireRecord {
    #[serde(rename = "type")]
    kind: Option<String>,
    user: Option<String>,
    message: Option<String>,
}

/// Outbound record shape; `message` is only present for `MESSAGE`.
#[derive(Serialize)]
struct WireRecordRef<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    user: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

/// JSON wire codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl JsonCodec {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Codec for JsonCodec {
    fn decode(&self, text: &str) -> Result<Event, DecodeError> {
        let record: WireRecord =
            serde_json::from_str(text).map_err(|e| DecodeError::Malformed {
                error: e.to_string(),
            })?;

        let tag = record.kind.ok_or(DecodeError::MissingType)?;
        let kind =
            EventKind::from_wire(&tag).ok_or(DecodeError::UnknownType { kind: tag })?;
        let user = record.user.ok_or(DecodeError::MissingUser)?;

        if kind == EventKind::Message && record.message.is_none() {
            return Err(DecodeError::MissingMessage);
        }
        Ok(Event::new(kind, user, record.message.as_deref())?)
    }

    fn encode(&self, event: &Event) -> String {
        let record = WireRecordRef {
            kind: event.kind().as_wire(),
            user: event.user(),
            message: event.message(),
        };
        // A struct of string fields always serializes.
        serde_json::to_string(&record).unwrap_or_default()
    }
}
