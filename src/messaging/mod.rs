//! # Messaging Module
//!
//! Inbound side of the service: the [`MessageSource`] port the consumer loop
//! reads from, the raw [`InboundMessage`] shape, trace-context extraction and
//! the topic-routed [`EventDecoder`]. The Kafka transport lives behind the
//! `kafka` feature.

pub mod decoder;
pub mod errors;
#[cfg(feature = "kafka")]
pub mod kafka;
pub mod message;
pub mod source;
pub mod trace_context;

pub use decoder::{decode_payload, DecodeError, EventDecoder, TopicRouter};
pub use errors::{MessagingError, MessagingResult};
#[cfg(feature = "kafka")]
pub use kafka::{KafkaDeadLetterSink, KafkaMessageSource};
pub use message::{InboundMessage, MessageHeaders};
pub use source::{InMemoryMessageSource, InMemoryProducer, MessagePosition, MessageSource};
