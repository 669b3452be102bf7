//! # Ingestion Pipeline
//!
//! consumer loop → type-routed queues → batch workers → repository, with
//! failures at each stage routed to a dead-letter destination.
//!
//! All three stages share one [`CancellationToken`](tokio_util::sync::CancellationToken)
//! and every blocking point races it.

pub mod consumer;
pub mod queues;
pub mod stats;
pub mod worker_pool;

pub use consumer::{ConsumerError, OrderConsumer};
pub use queues::{event_queues, EnqueueError, EventQueues, QueueReceivers, SharedReceiver};
pub use stats::{ConsumerStats, ConsumerStatsSnapshot, WorkerPoolStats, WorkerPoolStatsSnapshot};
pub use worker_pool::{PersistError, WorkerPool, WorkerPoolHandle};
