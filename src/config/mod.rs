//! # Service Configuration
//!
//! YAML-based configuration with per-environment overrides, loaded through
//! [`ConfigManager`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use order_svc::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let pipeline = &manager.config().pipeline;
//! println!("batch size {} every {:?}", pipeline.batch_size, pipeline.batch_timeout());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::topics;
use crate::messaging::TopicRouter;
use crate::models::EventKind;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration mirroring `config/order-svc.yaml`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OrderSvcConfig {
    pub database: DatabaseConfig,
    pub kafka: KafkaConfig,
    pub pipeline: PipelineConfig,
}

impl OrderSvcConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        self.database.validate()?;
        self.kafka.validate()?;
        self.pipeline.validate()?;
        Ok(())
    }
}

/// Postgres connection pool settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub max_lifetime_seconds: u64,
    pub idle_timeout_seconds: u64,
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_seconds: 10,
            max_lifetime_seconds: 30 * 60,
            idle_timeout_seconds: 10 * 60,
            run_migrations: true,
        }
    }
}

impl DatabaseConfig {
    pub fn database_url(&self) -> ConfigResult<&str> {
        self.url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ConfigurationError::missing_required("database.url"))
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }

    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_seconds)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_seconds)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.max_connections == 0 {
            return Err(ConfigurationError::invalid_value(
                "database.max_connections",
                "0",
                "must be positive",
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(ConfigurationError::invalid_value(
                "database.min_connections",
                self.min_connections.to_string(),
                "cannot exceed max_connections",
            ));
        }
        Ok(())
    }
}

/// Source topic and its dead-letter destination for one event kind
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TopicConfig {
    pub name: String,
    pub dlq: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KafkaConfig {
    pub brokers: Vec<String>,
    pub group_id: String,
    /// Destination for messages that could not be decoded or routed
    pub raw_dlq_topic: String,
    pub topics: HashMap<EventKind, TopicConfig>,
    pub producer_timeout_ms: u64,
    pub session_timeout_ms: u64,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: vec!["localhost:9092".to_string()],
            group_id: "order_svc".to_string(),
            raw_dlq_topic: topics::RAW_DLQ.to_string(),
            topics: HashMap::from([
                (
                    EventKind::OrderCreated,
                    TopicConfig {
                        name: topics::ORDER_CREATED.to_string(),
                        dlq: topics::ORDER_CREATED_DLQ.to_string(),
                    },
                ),
                (
                    EventKind::OrderStatusUpdated,
                    TopicConfig {
                        name: topics::ORDER_STATUS_UPDATED.to_string(),
                        dlq: topics::ORDER_STATUS_UPDATED_DLQ.to_string(),
                    },
                ),
            ]),
            producer_timeout_ms: 5_000,
            session_timeout_ms: 10_000,
        }
    }
}

impl KafkaConfig {
    pub fn bootstrap_servers(&self) -> String {
        self.brokers.join(",")
    }

    pub fn producer_timeout(&self) -> Duration {
        Duration::from_millis(self.producer_timeout_ms)
    }

    /// Topic → event kind table used by the decoder
    pub fn topic_router(&self) -> TopicRouter {
        TopicRouter::from_routes(
            self.topics
                .iter()
                .map(|(kind, topic)| (topic.name.clone(), *kind)),
        )
    }

    /// Event kind → dead-letter topic table used by the typed publisher
    pub fn typed_dlq_topics(&self) -> HashMap<EventKind, String> {
        self.topics
            .iter()
            .map(|(kind, topic)| (*kind, topic.dlq.clone()))
            .collect()
    }

    /// Every topic the service publishes to or consumes from
    pub fn all_topics(&self) -> Vec<String> {
        let mut all: Vec<String> = self
            .topics
            .values()
            .flat_map(|topic| [topic.name.clone(), topic.dlq.clone()])
            .chain(std::iter::once(self.raw_dlq_topic.clone()))
            .collect();
        all.sort();
        all.dedup();
        all
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.brokers.is_empty() || self.brokers.iter().any(|b| b.trim().is_empty()) {
            return Err(ConfigurationError::invalid_value(
                "kafka.brokers",
                format!("{:?}", self.brokers),
                "at least one non-empty broker address is required",
            ));
        }
        if self.group_id.trim().is_empty() {
            return Err(ConfigurationError::missing_required("kafka.group_id"));
        }
        if self.raw_dlq_topic.trim().is_empty() {
            return Err(ConfigurationError::missing_required("kafka.raw_dlq_topic"));
        }

        let mut seen = HashSet::new();
        for kind in EventKind::ALL {
            let topic = self.topics.get(&kind).ok_or_else(|| {
                ConfigurationError::missing_required(format!("kafka.topics.{kind}"))
            })?;
            if topic.name.trim().is_empty() || topic.dlq.trim().is_empty() {
                return Err(ConfigurationError::invalid_value(
                    format!("kafka.topics.{kind}"),
                    format!("{topic:?}"),
                    "topic and dlq names must be non-empty",
                ));
            }
            if !seen.insert(topic.name.as_str()) {
                return Err(ConfigurationError::invalid_value(
                    format!("kafka.topics.{kind}.name"),
                    topic.name.clone(),
                    "a topic can only be routed to one event kind",
                ));
            }
        }

        if self.producer_timeout_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "kafka.producer_timeout_ms",
                "0",
                "must be positive",
            ));
        }
        Ok(())
    }
}

/// Queue, batching and worker settings for the ingestion pipeline
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Capacity of each type-routed queue
    pub queue_capacity: usize,
    pub batch_size: usize,
    pub batch_timeout_ms: u64,
    pub workers_per_kind: usize,
    /// Flush the batch a worker already holds when shutdown is requested
    pub flush_on_shutdown: bool,
    pub shutdown_flush_timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1_000,
            batch_size: 50,
            batch_timeout_ms: 200,
            workers_per_kind: 2,
            flush_on_shutdown: true,
            shutdown_flush_timeout_ms: 5_000,
        }
    }
}

impl PipelineConfig {
    pub fn batch_timeout(&self) -> Duration {
        Duration::from_millis(self.batch_timeout_ms)
    }

    pub fn shutdown_flush_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_flush_timeout_ms)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let positive = [
            ("pipeline.queue_capacity", self.queue_capacity as u64),
            ("pipeline.batch_size", self.batch_size as u64),
            ("pipeline.batch_timeout_ms", self.batch_timeout_ms),
            ("pipeline.workers_per_kind", self.workers_per_kind as u64),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigurationError::invalid_value(
                    field,
                    "0",
                    "must be positive",
                ));
            }
        }
        Ok(())
    }
}
