//! # Pipeline Bootstrap
//!
//! Wires the consumer loop, the type-routed queues, the worker pool and both
//! dead-letter publishers from configuration plus the three external
//! collaborators (message source, repository, dead-letter transport).
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use order_svc::bootstrap::{shutdown_signal, OrderPipeline};
//! use order_svc::config::OrderSvcConfig;
//! use order_svc::dlq::InMemoryDeadLetterSink;
//! use order_svc::messaging::InMemoryMessageSource;
//! use order_svc::persistence::InMemoryOrderRepository;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> order_svc::Result<()> {
//! let (source, _producer) = InMemoryMessageSource::new(64);
//! let pipeline = OrderPipeline::new(
//!     &OrderSvcConfig::default(),
//!     Arc::new(source),
//!     Arc::new(InMemoryOrderRepository::new()),
//!     Arc::new(InMemoryDeadLetterSink::new()),
//! )?;
//!
//! let cancel = CancellationToken::new();
//! let trigger = cancel.clone();
//! tokio::spawn(async move {
//!     shutdown_signal().await;
//!     trigger.cancel();
//! });
//! pipeline.run(cancel).await
//! # }
//! ```

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::OrderSvcConfig;
use crate::dlq::{DeadLetterSink, RawDlqPublisher, TypedDlqPublisher};
use crate::error::Result;
use crate::messaging::{EventDecoder, MessageSource};
use crate::persistence::OrderRepository;
use crate::pipeline::{
    event_queues, ConsumerError, ConsumerStats, OrderConsumer, QueueReceivers, WorkerPool,
    WorkerPoolStats,
};

pub struct OrderPipeline {
    consumer: OrderConsumer,
    workers: WorkerPool,
    receivers: QueueReceivers,
}

impl OrderPipeline {
    pub fn new(
        config: &OrderSvcConfig,
        source: Arc<dyn MessageSource>,
        repository: Arc<dyn OrderRepository>,
        dead_letter_sink: Arc<dyn DeadLetterSink>,
    ) -> Result<Self> {
        config.kafka.validate()?;
        config.pipeline.validate()?;

        let decoder = EventDecoder::new(config.kafka.topic_router());
        let raw_publisher = RawDlqPublisher::new(
            Arc::clone(&dead_letter_sink),
            config.kafka.raw_dlq_topic.clone(),
        );
        let typed_publisher =
            TypedDlqPublisher::new(dead_letter_sink, config.kafka.typed_dlq_topics());

        let (queues, receivers) = event_queues(config.pipeline.queue_capacity);
        let consumer = OrderConsumer::new(source, decoder, queues, Arc::new(raw_publisher));
        let workers = WorkerPool::new(
            repository,
            Arc::new(typed_publisher),
            config.pipeline.clone(),
        );

        Ok(Self {
            consumer,
            workers,
            receivers,
        })
    }

    pub fn consumer_stats(&self) -> Arc<ConsumerStats> {
        self.consumer.stats()
    }

    pub fn worker_stats(&self) -> Arc<WorkerPoolStats> {
        self.workers.stats()
    }

    /// Run until `cancel` fires or the message source fails.
    ///
    /// On cancellation every stage stops at its current blocking point and
    /// `Ok(())` is returned. On a source failure the queues are closed, the
    /// workers drain what was already queued, and the failure is returned.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let Self {
            consumer,
            workers,
            receivers,
        } = self;

        let pool = workers.start(&receivers, cancel.clone());
        drop(receivers);

        let reason = consumer.run(cancel).await;
        pool.join().await;

        match reason {
            ConsumerError::Cancelled => {
                info!("✅ Order pipeline shut down");
                Ok(())
            }
            other => Err(other.into()),
        }
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("🛑 Ctrl-C received, shutting down"),
        _ = terminate => info!("🛑 SIGTERM received, shutting down"),
    }
}
