//! # Messaging Error Types
//!
//! Structured errors for the inbound message source and the dead-letter
//! transport, using thiserror instead of `Box<dyn Error>`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MessagingError {
    #[error("Failed to read from message source {source_name}: {message}")]
    SourceRead {
        source_name: String,
        message: String,
    },

    #[error("Message source closed: {source_name}")]
    SourceClosed { source_name: String },

    #[error("Failed to acknowledge {topic}[{partition}]@{offset}: {message}")]
    Acknowledge {
        topic: String,
        partition: i32,
        offset: i64,
        message: String,
    },

    #[error("Failed to publish to {topic}: {message}")]
    Publish { topic: String, message: String },

    #[error("Publish to {topic} timed out after {timeout_ms}ms")]
    PublishTimeout { topic: String, timeout_ms: u64 },

    #[error("Message serialization error: {message}")]
    MessageSerialization { message: String },

    #[error("No dead-letter destination configured for event kind {event_kind}")]
    DestinationNotConfigured { event_kind: String },

    #[error("Configuration error: {component}: {message}")]
    Configuration { component: String, message: String },
}

impl MessagingError {
    pub fn source_read(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceRead {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub fn source_closed(source_name: impl Into<String>) -> Self {
        Self::SourceClosed {
            source_name: source_name.into(),
        }
    }

    pub fn acknowledge(
        topic: impl Into<String>,
        partition: i32,
        offset: i64,
        message: impl Into<String>,
    ) -> Self {
        Self::Acknowledge {
            topic: topic.into(),
            partition,
            offset,
            message: message.into(),
        }
    }

    pub fn publish(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Publish {
            topic: topic.into(),
            message: message.into(),
        }
    }

    pub fn publish_timeout(topic: impl Into<String>, timeout_ms: u64) -> Self {
        Self::PublishTimeout {
            topic: topic.into(),
            timeout_ms,
        }
    }

    pub fn message_serialization(message: impl Into<String>) -> Self {
        Self::MessageSerialization {
            message: message.into(),
        }
    }

    pub fn destination_not_configured(event_kind: impl Into<String>) -> Self {
        Self::DestinationNotConfigured {
            event_kind: event_kind.into(),
        }
    }

    pub fn configuration(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Whether the error leaves the message source unusable.
    ///
    /// Terminal errors end the consumer loop; anything else is logged and
    /// the loop keeps reading.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::SourceClosed { .. } | Self::Configuration { .. }
        )
    }
}

impl From<serde_json::Error> for MessagingError {
    fn from(err: serde_json::Error) -> Self {
        MessagingError::message_serialization(err.to_string())
    }
}

pub type MessagingResult<T> = Result<T, MessagingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_classification() {
        assert!(MessagingError::source_closed("kafka").is_terminal());
        assert!(MessagingError::configuration("kafka", "bad brokers").is_terminal());
        assert!(!MessagingError::source_read("kafka", "broker down").is_terminal());
        assert!(!MessagingError::publish("orders.dlq", "queue full").is_terminal());
    }

    #[test]
    fn test_error_display() {
        let err = MessagingError::acknowledge("orders.created", 2, 41, "rebalance");
        let display = format!("{err}");
        assert!(display.contains("orders.created[2]@41"));
        assert!(display.contains("rebalance"));

        let err = MessagingError::publish_timeout("orders.dlq", 5000);
        assert!(err.to_string().contains("5000ms"));
    }

    #[test]
    fn test_serde_json_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        let err: MessagingError = json_err.into();
        assert!(matches!(err, MessagingError::MessageSerialization { .. }));
    }
}
