//! # Kafka Transport
//!
//! rdkafka-backed implementations of [`MessageSource`] and
//! [`DeadLetterSink`]. Offsets are committed manually, one message at a
//! time, after the consumer loop has routed the message.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::message::{BorrowedMessage, Headers};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use rdkafka::{Message, Offset, TopicPartitionList};
use tracing::{debug, info};

use super::errors::{MessagingError, MessagingResult};
use super::message::{InboundMessage, MessageHeaders};
use super::source::MessageSource;
use crate::config::KafkaConfig;
use crate::dlq::DeadLetterSink;

const PROVIDER: &str = "kafka";

/// Consumer-group member subscribed to every routed topic
pub struct KafkaMessageSource {
    consumer: StreamConsumer,
}

impl KafkaMessageSource {
    pub fn new(config: &KafkaConfig, topics: &[String]) -> MessagingResult<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", config.bootstrap_servers())
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", config.session_timeout_ms.to_string())
            .create()
            .map_err(|e| MessagingError::configuration("kafka_consumer", e.to_string()))?;

        let topic_refs: Vec<&str> = topics.iter().map(String::as_str).collect();
        consumer
            .subscribe(&topic_refs)
            .map_err(|e| MessagingError::configuration("kafka_consumer", e.to_string()))?;

        info!(
            brokers = %config.bootstrap_servers(),
            group_id = %config.group_id,
            topics = ?topics,
            "✅ Kafka consumer subscribed"
        );
        Ok(Self { consumer })
    }

    fn to_inbound(message: &BorrowedMessage<'_>) -> InboundMessage {
        let headers: MessageHeaders = message
            .headers()
            .map(|headers| {
                headers
                    .iter()
                    .filter_map(|header| {
                        let value = std::str::from_utf8(header.value?).ok()?;
                        Some((header.key.to_string(), value.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        InboundMessage {
            topic: message.topic().to_string(),
            key: message.key().map(<[u8]>::to_vec),
            value: message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
            partition: message.partition(),
            offset: message.offset(),
            headers,
        }
    }
}

#[async_trait]
impl MessageSource for KafkaMessageSource {
    async fn next_message(&self) -> MessagingResult<InboundMessage> {
        match self.consumer.recv().await {
            Ok(message) => Ok(Self::to_inbound(&message)),
            Err(KafkaError::ClientCreation(e)) => {
                Err(MessagingError::configuration("kafka_consumer", e))
            }
            Err(e) => Err(MessagingError::source_read(PROVIDER, e.to_string())),
        }
    }

    async fn ack(&self, message: &InboundMessage) -> MessagingResult<()> {
        let mut positions = TopicPartitionList::new();
        positions
            .add_partition_offset(
                &message.topic,
                message.partition,
                Offset::Offset(message.offset + 1),
            )
            .map_err(|e| {
                MessagingError::acknowledge(
                    &message.topic,
                    message.partition,
                    message.offset,
                    e.to_string(),
                )
            })?;

        self.consumer
            .commit(&positions, CommitMode::Async)
            .map_err(|e| {
                MessagingError::acknowledge(
                    &message.topic,
                    message.partition,
                    message.offset,
                    e.to_string(),
                )
            })
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Producer used for both dead-letter paths
pub struct KafkaDeadLetterSink {
    producer: FutureProducer,
    timeout: Duration,
}

impl KafkaDeadLetterSink {
    pub fn new(config: &KafkaConfig) -> MessagingResult<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", config.bootstrap_servers())
            .set("message.timeout.ms", config.producer_timeout_ms.to_string())
            .set("acks", "all")
            .create()
            .map_err(|e| MessagingError::configuration("kafka_producer", e.to_string()))?;

        Ok(Self {
            producer,
            timeout: config.producer_timeout(),
        })
    }
}

#[async_trait]
impl DeadLetterSink for KafkaDeadLetterSink {
    async fn send(
        &self,
        topic: &str,
        key: Option<&[u8]>,
        payload: Vec<u8>,
    ) -> MessagingResult<()> {
        let mut record = FutureRecord::<[u8], [u8]>::to(topic).payload(payload.as_slice());
        if let Some(key) = key {
            record = record.key(key);
        }

        match self.producer.send(record, Timeout::After(self.timeout)).await {
            Ok((partition, offset)) => {
                debug!(topic = %topic, partition, offset, "Dead letter delivered");
                Ok(())
            }
            Err((KafkaError::MessageProduction(RDKafkaErrorCode::MessageTimedOut), _)) => Err(
                MessagingError::publish_timeout(topic, self.timeout.as_millis() as u64),
            ),
            Err((e, _)) => Err(MessagingError::publish(topic, e.to_string())),
        }
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}
