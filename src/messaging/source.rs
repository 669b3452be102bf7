//! # Inbound Message Source
//!
//! Port for the ordered, partitioned, at-least-once stream the consumer
//! loop reads from, plus an in-memory implementation for tests and local
//! development.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use super::errors::{MessagingError, MessagingResult};
use super::message::InboundMessage;

/// Position of a consumed message
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessagePosition {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

impl From<&InboundMessage> for MessagePosition {
    fn from(message: &InboundMessage) -> Self {
        Self {
            topic: message.topic.clone(),
            partition: message.partition,
            offset: message.offset,
        }
    }
}

/// Inbound message stream consumed by `OrderConsumer`.
///
/// Only the consumer loop advances the cursor: it calls `next_message`
/// one message at a time and `ack` once the message has been routed.
#[async_trait]
pub trait MessageSource: Send + Sync + 'static {
    /// Block until the next message is available.
    ///
    /// Errors for which [`MessagingError::is_terminal`] is true mean the
    /// source can no longer be read from.
    async fn next_message(&self) -> MessagingResult<InboundMessage>;

    /// Mark the message as consumed
    async fn ack(&self, message: &InboundMessage) -> MessagingResult<()>;

    fn provider_name(&self) -> &'static str;
}

type SourceItem = MessagingResult<InboundMessage>;

/// Channel-backed message source.
///
/// Messages are pushed through an [`InMemoryProducer`]; the source reports
/// [`MessagingError::SourceClosed`] once every producer has been dropped.
#[derive(Debug)]
pub struct InMemoryMessageSource {
    receiver: Mutex<mpsc::Receiver<SourceItem>>,
    acked: Mutex<Vec<MessagePosition>>,
}

/// Write side of an [`InMemoryMessageSource`]
#[derive(Debug, Clone)]
pub struct InMemoryProducer {
    sender: mpsc::Sender<SourceItem>,
    next_offsets: Arc<Mutex<HashMap<String, i64>>>,
}

impl InMemoryMessageSource {
    pub fn new(capacity: usize) -> (Self, InMemoryProducer) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let source = Self {
            receiver: Mutex::new(receiver),
            acked: Mutex::new(Vec::new()),
        };
        let producer = InMemoryProducer {
            sender,
            next_offsets: Arc::new(Mutex::new(HashMap::new())),
        };
        (source, producer)
    }

    /// Positions acknowledged so far, in ack order
    pub async fn acked(&self) -> Vec<MessagePosition> {
        self.acked.lock().await.clone()
    }

    pub async fn acked_count(&self) -> usize {
        self.acked.lock().await.len()
    }
}

#[async_trait]
impl MessageSource for InMemoryMessageSource {
    async fn next_message(&self) -> MessagingResult<InboundMessage> {
        let mut receiver = self.receiver.lock().await;
        match receiver.recv().await {
            Some(item) => item,
            None => Err(MessagingError::source_closed(self.provider_name())),
        }
    }

    async fn ack(&self, message: &InboundMessage) -> MessagingResult<()> {
        debug!(
            topic = %message.topic,
            partition = message.partition,
            offset = message.offset,
            "Acknowledged in-memory message"
        );
        self.acked.lock().await.push(MessagePosition::from(message));
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "in_memory"
    }
}

impl InMemoryProducer {
    /// Push a fully specified message
    pub async fn send(&self, message: InboundMessage) -> MessagingResult<()> {
        self.sender
            .send(Ok(message))
            .await
            .map_err(|_| MessagingError::source_closed("in_memory"))
    }

    /// Push a payload on partition 0, assigning the next offset for the topic
    pub async fn send_payload(
        &self,
        topic: &str,
        value: impl Into<Vec<u8>>,
    ) -> MessagingResult<InboundMessage> {
        let offset = {
            let mut offsets = self.next_offsets.lock().await;
            let next = offsets.entry(topic.to_string()).or_insert(0);
            let offset = *next;
            *next += 1;
            offset
        };
        let message = InboundMessage::new(topic, value).with_position(0, offset);
        self.send(message.clone()).await?;
        Ok(message)
    }

    /// Inject a read failure, delivered in order with the messages
    pub async fn send_error(&self, error: MessagingError) -> MessagingResult<()> {
        self.sender
            .send(Err(error))
            .await
            .map_err(|_| MessagingError::source_closed("in_memory"))
    }
}
