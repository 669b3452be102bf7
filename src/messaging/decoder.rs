//! # Event Router / Decoder
//!
//! Maps an inbound message to a typed [`OrderEvent`]. The topic selects the
//! event kind through a [`TopicRouter`] built once at startup; the payload is
//! parsed into the wire shape for that kind and then mapped to the event.
//!
//! Decoding is pure: the same message always yields the same event.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use super::message::InboundMessage;
use crate::dlq::RawDlqReason;
use crate::models::{EventKind, InvalidOrderStatus, OrderEvent, OrderItems, OrderStatus};

/// Lookup table from topic name to event kind
#[derive(Debug, Clone, Default)]
pub struct TopicRouter {
    routes: HashMap<String, EventKind>,
}

impl TopicRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(mut self, topic: impl Into<String>, kind: EventKind) -> Self {
        self.routes.insert(topic.into(), kind);
        self
    }

    pub fn from_routes<I, S>(routes: I) -> Self
    where
        I: IntoIterator<Item = (S, EventKind)>,
        S: Into<String>,
    {
        Self {
            routes: routes
                .into_iter()
                .map(|(topic, kind)| (topic.into(), kind))
                .collect(),
        }
    }

    pub fn resolve(&self, topic: &str) -> Option<EventKind> {
        self.routes.get(topic).copied()
    }

    /// Every routed topic, sorted
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.routes.keys().cloned().collect();
        topics.sort();
        topics
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Why a message could not be turned into an event
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("No event kind mapped for topic {topic}")]
    UnknownTopic { topic: String },

    #[error("Malformed {kind} payload: {message}")]
    MalformedPayload { kind: EventKind, message: String },

    #[error("Invalid order id {value:?}: {message}")]
    InvalidOrderId { value: String, message: String },

    #[error("Status is required for {kind} events")]
    MissingStatus { kind: EventKind },

    #[error("{0}")]
    InvalidStatus(#[from] InvalidOrderStatus),

    #[error("Quantity for SKU {sku:?} must be positive")]
    NonPositiveQuantity { sku: String },
}

impl DecodeError {
    /// Dead-letter reason recorded for this failure
    pub fn dlq_reason(&self) -> RawDlqReason {
        match self {
            Self::UnknownTopic { .. } => RawDlqReason::UnknownEventType,
            _ => RawDlqReason::DecodeFailed,
        }
    }
}

/// Wire shape of messages on the creation topic
#[derive(Debug, Deserialize)]
struct OrderCreatedPayload {
    #[serde(default)]
    items: Option<OrderItems>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

/// Wire shape of messages on the status-update topic
#[derive(Debug, Deserialize)]
struct OrderStatusUpdatedPayload {
    id: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct EventDecoder {
    router: TopicRouter,
}

impl EventDecoder {
    pub fn new(router: TopicRouter) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &TopicRouter {
        &self.router
    }

    pub fn decode(&self, message: &InboundMessage) -> Result<OrderEvent, DecodeError> {
        let kind = self
            .router
            .resolve(&message.topic)
            .ok_or_else(|| DecodeError::UnknownTopic {
                topic: message.topic.clone(),
            })?;
        decode_payload(kind, &message.value)
    }
}

/// Parse `payload` as the wire shape of `kind`
pub fn decode_payload(kind: EventKind, payload: &[u8]) -> Result<OrderEvent, DecodeError> {
    match kind {
        EventKind::OrderCreated => decode_created(payload),
        EventKind::OrderStatusUpdated => decode_status_updated(payload),
    }
}

fn decode_created(payload: &[u8]) -> Result<OrderEvent, DecodeError> {
    let wire: OrderCreatedPayload =
        serde_json::from_slice(payload).map_err(|e| DecodeError::MalformedPayload {
            kind: EventKind::OrderCreated,
            message: e.to_string(),
        })?;

    let items = wire.items.unwrap_or_default();
    if let Some((sku, _)) = items.iter().find(|(_, quantity)| **quantity == 0) {
        return Err(DecodeError::NonPositiveQuantity { sku: sku.clone() });
    }

    // Empty status means "unset"; the repository applies the pending default
    let status = parse_optional_status(wire.status)?;

    Ok(OrderEvent::created(items, status).with_timestamps(wire.created_at, wire.updated_at))
}

fn decode_status_updated(payload: &[u8]) -> Result<OrderEvent, DecodeError> {
    let wire: OrderStatusUpdatedPayload =
        serde_json::from_slice(payload).map_err(|e| DecodeError::MalformedPayload {
            kind: EventKind::OrderStatusUpdated,
            message: e.to_string(),
        })?;

    let order_id = Uuid::parse_str(&wire.id).map_err(|e| DecodeError::InvalidOrderId {
        value: wire.id.clone(),
        message: e.to_string(),
    })?;

    let status = parse_optional_status(wire.status)?.ok_or(DecodeError::MissingStatus {
        kind: EventKind::OrderStatusUpdated,
    })?;

    Ok(OrderEvent::status_updated(order_id, status)
        .with_timestamps(wire.created_at, wire.updated_at))
}

fn parse_optional_status(raw: Option<String>) -> Result<Option<OrderStatus>, DecodeError> {
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(value) => Ok(Some(value.parse()?)),
    }
}
