//! # Inbound Messages
//!
//! Broker-agnostic representation of one consumed message.

use std::collections::BTreeMap;

/// Header map carried alongside the payload (trace-context key/value pairs).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageHeaders {
    entries: BTreeMap<String, String>,
}

impl MessageHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MessageHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (key, value) in iter {
            headers.insert(key, value);
        }
        headers
    }
}

/// A message read from the inbound source, tagged with its log position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub key: Option<Vec<u8>>,
    pub value: Vec<u8>,
    pub partition: i32,
    pub offset: i64,
    pub headers: MessageHeaders,
}

impl InboundMessage {
    pub fn new(topic: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            key: None,
            value: value.into(),
            partition: 0,
            offset: 0,
            headers: MessageHeaders::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_position(mut self, partition: i32, offset: i64) -> Self {
        self.partition = partition;
        self.offset = offset;
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_position_and_headers() {
        let message = InboundMessage::new("orders.created", b"{}".to_vec())
            .with_key(b"k1".to_vec())
            .with_position(3, 17)
            .with_header("traceparent", "00-abc-def-01");

        assert_eq!(message.partition, 3);
        assert_eq!(message.offset, 17);
        assert_eq!(message.key.as_deref(), Some(&b"k1"[..]));
        assert_eq!(message.headers.get("traceparent"), Some("00-abc-def-01"));
        assert_eq!(message.headers.len(), 1);
    }

    #[test]
    fn test_headers_from_iterator() {
        let headers: MessageHeaders = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(headers.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(!headers.is_empty());
    }
}
