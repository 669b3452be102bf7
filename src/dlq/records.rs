//! # Dead-Letter Records
//!
//! Two record shapes share the dead-letter path:
//!
//! - [`RawDlqRecord`] for messages that never became an event (decode or
//!   routing failure). Keeps the original bytes and log position verbatim.
//! - [`TypedDlqRecord`] for decoded events whose persistence failed. Keeps
//!   the full event and the error text so the event can be replayed.
//!
//! Byte fields are base64 encoded on the wire.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::dlq_reasons;
use crate::messaging::InboundMessage;
use crate::models::{EventKind, OrderEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawDlqReason {
    DecodeFailed,
    UnknownEventType,
}

impl RawDlqReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DecodeFailed => dlq_reasons::DECODE_FAILED,
            Self::UnknownEventType => dlq_reasons::UNKNOWN_EVENT_TYPE,
        }
    }
}

impl fmt::Display for RawDlqReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypedDlqReason {
    PersistCreateFailed,
    PersistUpdateFailed,
}

impl TypedDlqReason {
    /// Reason used when persisting an event of `kind` fails
    pub fn for_kind(kind: EventKind) -> Self {
        match kind {
            EventKind::OrderCreated => Self::PersistCreateFailed,
            EventKind::OrderStatusUpdated => Self::PersistUpdateFailed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PersistCreateFailed => dlq_reasons::PERSIST_CREATE_FAILED,
            Self::PersistUpdateFailed => dlq_reasons::PERSIST_UPDATE_FAILED,
        }
    }
}

impl fmt::Display for TypedDlqReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pre-decode failure record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDlqRecord {
    pub timestamp: DateTime<Utc>,
    pub reason: RawDlqReason,
    pub original_topic: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "base64_bytes::option"
    )]
    pub original_key: Option<Vec<u8>>,
    #[serde(with = "base64_bytes")]
    pub original_value: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

impl RawDlqRecord {
    /// Capture `message` verbatim
    pub fn from_message(message: &InboundMessage, reason: RawDlqReason) -> Self {
        Self {
            timestamp: Utc::now(),
            reason,
            original_topic: message.topic.clone(),
            original_key: message.key.clone(),
            original_value: message.value.clone(),
            partition: Some(message.partition),
            offset: Some(message.offset),
        }
    }

    /// Republish key: the original key, or the topic when there was none
    pub fn partition_key(&self) -> Vec<u8> {
        match &self.original_key {
            Some(key) if !key.is_empty() => key.clone(),
            _ => self.original_topic.as_bytes().to_vec(),
        }
    }
}

/// Post-decode persistence failure record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedDlqRecord {
    pub timestamp: DateTime<Utc>,
    pub reason: TypedDlqReason,
    pub error: String,
    pub event: OrderEvent,
}

impl TypedDlqRecord {
    pub fn new(event: OrderEvent, error: impl fmt::Display) -> Self {
        Self {
            timestamp: Utc::now(),
            reason: TypedDlqReason::for_kind(event.kind()),
            error: error.to_string(),
            event,
        }
    }

    pub fn event_kind(&self) -> EventKind {
        self.event.kind()
    }
}

/// Serde adapter encoding byte vectors as standard base64 strings
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            bytes: &Option<Vec<u8>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match bytes {
                Some(bytes) => super::serialize(bytes, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Vec<u8>>, D::Error> {
            let encoded: Option<String> = Option::deserialize(deserializer)?;
            encoded
                .map(|value| STANDARD.decode(value.as_bytes()))
                .transpose()
                .map_err(serde::de::Error::custom)
        }
    }
}
