#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Order Service
//!
//! Asynchronous ingestion pipeline for order events.
//!
//! ## Overview
//!
//! A single consumer loop reads order events from a partitioned broker,
//! decodes them by topic and hands them to one bounded queue per event kind.
//! A pool of batch workers drains each queue, flushing on size or on a
//! timer, and persists every event independently. Nothing blocks on a bad
//! message: decode failures go to a raw dead-letter topic, persistence
//! failures to a typed dead-letter topic per event kind.
//!
//! ## Module Organization
//!
//! - [`models`] - Orders, order events and event kinds
//! - [`messaging`] - Inbound message port, decoder, Kafka transport
//! - [`pipeline`] - Consumer loop, type-routed queues, batch worker pool
//! - [`dlq`] - Dead-letter records and publishers
//! - [`persistence`] - Order repository port and implementations
//! - [`database`] - Postgres pool and migrations
//! - [`config`] - YAML configuration with environment overrides
//! - [`bootstrap`] - Pipeline wiring and shutdown signal
//! - [`error`] - Structured error handling
//!
//! ## Delivery Semantics
//!
//! Messages are acknowledged once they are queued or dead-lettered, before
//! they are persisted. A crash between acknowledgement and flush loses the
//! events held in memory; a persistence failure is recoverable only by
//! replaying the typed dead-letter topic.
//!
//! ## Testing
//!
//! Every port has an in-memory implementation, so the full pipeline runs in
//! tests without a broker or a database:
//!
//! ```bash
//! cargo test
//! cargo test --features kafka
//! ```

pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod database;
pub mod dlq;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod persistence;
pub mod pipeline;

pub use bootstrap::{shutdown_signal, OrderPipeline};
pub use config::{ConfigManager, OrderSvcConfig};
pub use error::{OrderSvcError, Result};
pub use models::{EventKind, NewOrder, Order, OrderEvent, OrderItems, OrderStatus};
pub use persistence::{OrderRepository, RepositoryError};
pub use pipeline::{OrderConsumer, WorkerPool};
