//! # Dead-Letter Publishers
//!
//! [`DeadLetterPublisher`] is the port the consumer loop and the worker pool
//! publish failure records through. Both concrete publishers serialize their
//! record to JSON and hand it to a [`DeadLetterSink`], the broker transport.
//!
//! Publishing is best-effort: failures are returned to the caller for
//! logging and never retried here.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::records::{RawDlqRecord, TypedDlqRecord};
use crate::messaging::{MessagingError, MessagingResult};
use crate::models::EventKind;

/// Transport that durably writes a payload to a broker destination.
///
/// `key` selects the destination partition; without one the transport
/// spreads records across partitions.
#[async_trait]
pub trait DeadLetterSink: Send + Sync + 'static {
    async fn send(
        &self,
        topic: &str,
        key: Option<&[u8]>,
        payload: Vec<u8>,
    ) -> MessagingResult<()>;

    fn provider_name(&self) -> &'static str;
}

/// Publishes one dead-letter record shape
#[async_trait]
pub trait DeadLetterPublisher<R: Send + Sync>: Send + Sync + 'static {
    async fn publish(&self, record: &R) -> MessagingResult<()>;
}

/// Publisher for pre-decode failures; one fixed destination
pub struct RawDlqPublisher {
    sink: Arc<dyn DeadLetterSink>,
    topic: String,
}

impl RawDlqPublisher {
    pub fn new(sink: Arc<dyn DeadLetterSink>, topic: impl Into<String>) -> Self {
        Self {
            sink,
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl DeadLetterPublisher<RawDlqRecord> for RawDlqPublisher {
    async fn publish(&self, record: &RawDlqRecord) -> MessagingResult<()> {
        let payload = serde_json::to_vec(record)?;
        self.sink
            .send(&self.topic, Some(record.partition_key().as_slice()), payload)
            .await?;

        info!(
            dlq_topic = %self.topic,
            reason = %record.reason,
            original_topic = %record.original_topic,
            partition = ?record.partition,
            offset = ?record.offset,
            "📦 Raw message dead-lettered"
        );
        Ok(())
    }
}

/// Publisher for persistence failures; destination chosen by event kind
pub struct TypedDlqPublisher {
    sink: Arc<dyn DeadLetterSink>,
    topics: HashMap<EventKind, String>,
}

impl TypedDlqPublisher {
    pub fn new(sink: Arc<dyn DeadLetterSink>, topics: HashMap<EventKind, String>) -> Self {
        Self { sink, topics }
    }

    pub fn topic_for(&self, kind: EventKind) -> Option<&str> {
        self.topics.get(&kind).map(String::as_str)
    }
}

#[async_trait]
impl DeadLetterPublisher<TypedDlqRecord> for TypedDlqPublisher {
    async fn publish(&self, record: &TypedDlqRecord) -> MessagingResult<()> {
        let kind = record.event_kind();
        let topic = self
            .topic_for(kind)
            .ok_or_else(|| MessagingError::destination_not_configured(kind.as_str()))?;

        // Creation events carry no id yet and go out unkeyed
        let key = record.event.partition_key();
        let payload = serde_json::to_vec(record)?;
        self.sink
            .send(topic, key.as_deref().map(str::as_bytes), payload)
            .await?;

        info!(
            dlq_topic = %topic,
            reason = %record.reason,
            event_kind = %kind,
            order_id = ?record.event.order_id,
            "📦 Order event dead-lettered"
        );
        Ok(())
    }
}

/// A payload captured by [`InMemoryDeadLetterSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentDeadLetter {
    pub topic: String,
    pub key: Option<Vec<u8>>,
    pub payload: Vec<u8>,
}

impl SentDeadLetter {
    pub fn json(&self) -> MessagingResult<serde_json::Value> {
        Ok(serde_json::from_slice(&self.payload)?)
    }
}

/// Sink that keeps every payload in memory, for tests and local runs
#[derive(Debug, Default)]
pub struct InMemoryDeadLetterSink {
    sent: RwLock<Vec<SentDeadLetter>>,
}

impl InMemoryDeadLetterSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<SentDeadLetter> {
        self.sent.read().await.clone()
    }

    pub async fn sent_to(&self, topic: &str) -> Vec<SentDeadLetter> {
        self.sent
            .read()
            .await
            .iter()
            .filter(|message| message.topic == topic)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.sent.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sent.read().await.is_empty()
    }
}

#[async_trait]
impl DeadLetterSink for InMemoryDeadLetterSink {
    async fn send(
        &self,
        topic: &str,
        key: Option<&[u8]>,
        payload: Vec<u8>,
    ) -> MessagingResult<()> {
        debug!(topic = %topic, bytes = payload.len(), "Captured dead letter in memory");
        self.sent.write().await.push(SentDeadLetter {
            topic: topic.to_string(),
            key: key.map(<[u8]>::to_vec),
            payload,
        });
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dlq::RawDlqReason;
    use crate::messaging::InboundMessage;
    use crate::models::{OrderEvent, OrderStatus};
    use uuid::Uuid;

    struct FailingSink;

    #[async_trait]
    impl DeadLetterSink for FailingSink {
        async fn send(
            &self,
            topic: &str,
            _key: Option<&[u8]>,
            _payload: Vec<u8>,
        ) -> MessagingResult<()> {
            Err(MessagingError::publish(topic, "broker unavailable"))
        }

        fn provider_name(&self) -> &'static str {
            "failing"
        }
    }

    fn typed_topics() -> HashMap<EventKind, String> {
        HashMap::from([
            (EventKind::OrderCreated, "orders.created.dlq".to_string()),
            (
                EventKind::OrderStatusUpdated,
                "orders.status_updated.dlq".to_string(),
            ),
        ])
    }

    #[tokio::test]
    async fn test_raw_publisher_writes_to_fixed_topic() {
        let sink = Arc::new(InMemoryDeadLetterSink::new());
        let publisher = RawDlqPublisher::new(sink.clone(), "orders.dlq");

        let message = InboundMessage::new("orders.created", b"garbage".to_vec())
            .with_key(b"k".to_vec())
            .with_position(1, 9);
        let record = RawDlqRecord::from_message(&message, RawDlqReason::DecodeFailed);
        publisher.publish(&record).await.unwrap();

        let sent = sink.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].topic, "orders.dlq");
        assert_eq!(sent[0].key, Some(b"k".to_vec()));

        let decoded: RawDlqRecord = serde_json::from_slice(&sent[0].payload).unwrap();
        assert_eq!(decoded, record);
    }

    #[tokio::test]
    async fn test_typed_publisher_routes_by_event_kind() {
        let sink = Arc::new(InMemoryDeadLetterSink::new());
        let publisher = TypedDlqPublisher::new(sink.clone(), typed_topics());

        let id = Uuid::new_v4();
        let updated = OrderEvent::status_updated(id, OrderStatus::Confirmed);
        publisher
            .publish(&TypedDlqRecord::new(updated, "order not found"))
            .await
            .unwrap();
        let created = OrderEvent::created(Default::default(), None);
        publisher
            .publish(&TypedDlqRecord::new(created, "connection reset"))
            .await
            .unwrap();

        let updates = sink.sent_to("orders.status_updated.dlq").await;
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].key, Some(id.to_string().into_bytes()));
        let json = updates[0].json().unwrap();
        assert_eq!(json["reason"], "persist_update_failed");
        assert_eq!(json["error"], "order not found");

        let creates = sink.sent_to("orders.created.dlq").await;
        assert_eq!(creates.len(), 1);
        assert_eq!(creates[0].key, None);
    }

    #[tokio::test]
    async fn test_typed_publisher_without_destination_fails() {
        let sink = Arc::new(InMemoryDeadLetterSink::new());
        let publisher = TypedDlqPublisher::new(sink.clone(), HashMap::new());
        let record = TypedDlqRecord::new(OrderEvent::created(Default::default(), None), "boom");

        let err = publisher.publish(&record).await.unwrap_err();
        assert!(matches!(err, MessagingError::DestinationNotConfigured { .. }));
        assert!(sink.is_empty().await);
    }

    #[tokio::test]
    async fn test_sink_failures_surface_to_caller() {
        let publisher = RawDlqPublisher::new(Arc::new(FailingSink), "orders.dlq");
        let message = InboundMessage::new("orders.created", b"x".to_vec());
        let record = RawDlqRecord::from_message(&message, RawDlqReason::DecodeFailed);

        let err = publisher.publish(&record).await.unwrap_err();
        assert!(matches!(err, MessagingError::Publish { .. }));
    }
}
