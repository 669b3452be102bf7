//! # Batch Worker Pool
//!
//! A fixed set of workers per [`EventKind`]. Each worker owns its batch
//! buffer and a reset-on-flush timer and wakes on three sources:
//!
//! - **cancellation**: stop; optionally flush the held batch (bounded by
//!   `shutdown_flush_timeout`)
//! - **timer**: flush a non-empty batch, then reset the timer regardless
//! - **queue item**: append; flush and reset the timer once the batch is full
//!
//! A flush persists each event independently in dequeue order. A failed
//! event is dead-lettered as a [`TypedDlqRecord`] and the rest of the batch
//! carries on. Nothing is retried.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::queues::{QueueReceivers, SharedReceiver};
use super::stats::WorkerPoolStats;
use crate::config::PipelineConfig;
use crate::dlq::{DeadLetterPublisher, TypedDlqRecord};
use crate::logging::log_batch_operation;
use crate::models::{EventKind, OrderEvent};
use crate::persistence::{OrderRepository, RepositoryError};

/// Why a single event could not be persisted
#[derive(Error, Debug)]
pub enum PersistError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("{kind} event is missing {field}")]
    Incomplete {
        kind: EventKind,
        field: &'static str,
    },
}

pub struct WorkerPool {
    repository: Arc<dyn OrderRepository>,
    dead_letters: Arc<dyn DeadLetterPublisher<TypedDlqRecord>>,
    config: PipelineConfig,
    stats: Arc<WorkerPoolStats>,
}

impl WorkerPool {
    pub fn new(
        repository: Arc<dyn OrderRepository>,
        dead_letters: Arc<dyn DeadLetterPublisher<TypedDlqRecord>>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            repository,
            dead_letters,
            config,
            stats: Arc::new(WorkerPoolStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<WorkerPoolStats> {
        Arc::clone(&self.stats)
    }

    /// Spawn `workers_per_kind` workers for every event kind
    pub fn start(&self, receivers: &QueueReceivers, cancel: CancellationToken) -> WorkerPoolHandle {
        let mut handles = Vec::new();

        for kind in EventKind::ALL {
            let Some(receiver) = receivers.receiver(kind) else {
                warn!(event_kind = %kind, "No queue for event kind - no workers started");
                continue;
            };

            for index in 0..self.config.workers_per_kind {
                let worker = BatchWorker {
                    worker_id: format!("{kind}-{index}"),
                    receiver: receiver.clone(),
                    repository: Arc::clone(&self.repository),
                    dead_letters: Arc::clone(&self.dead_letters),
                    stats: Arc::clone(&self.stats),
                    batch_size: self.config.batch_size.max(1),
                    batch_timeout: self.config.batch_timeout(),
                    flush_on_shutdown: self.config.flush_on_shutdown,
                    shutdown_flush_timeout: self.config.shutdown_flush_timeout(),
                };
                let span = info_span!("batch_worker", worker_id = %worker.worker_id, event_kind = %kind);
                handles.push(tokio::spawn(worker.run(cancel.clone()).instrument(span)));
            }
        }

        info!(
            workers = handles.len(),
            workers_per_kind = self.config.workers_per_kind,
            batch_size = self.config.batch_size,
            batch_timeout_ms = self.config.batch_timeout_ms,
            "🚀 Worker pool started"
        );

        WorkerPoolHandle { handles }
    }
}

/// Running workers
pub struct WorkerPoolHandle {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPoolHandle {
    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// Wait for every worker to stop
    pub async fn join(self) {
        let total = self.handles.len();
        let results = join_all(self.handles).await;
        let failed = results.iter().filter(|result| result.is_err()).count();

        for result in results {
            if let Err(e) = result {
                error!(error = %e, "Batch worker terminated abnormally");
            }
        }
        info!(workers = total, failed = failed, "🛑 Worker pool stopped");
    }
}

struct BatchWorker {
    worker_id: String,
    receiver: SharedReceiver,
    repository: Arc<dyn OrderRepository>,
    dead_letters: Arc<dyn DeadLetterPublisher<TypedDlqRecord>>,
    stats: Arc<WorkerPoolStats>,
    batch_size: usize,
    batch_timeout: Duration,
    flush_on_shutdown: bool,
    shutdown_flush_timeout: Duration,
}

impl BatchWorker {
    async fn run(self, cancel: CancellationToken) {
        let mut batch: Vec<OrderEvent> = Vec::with_capacity(self.batch_size);
        let timer = time::sleep(self.batch_timeout);
        tokio::pin!(timer);

        debug!("Batch worker started");

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    self.shutdown(&mut batch).await;
                    break;
                }

                _ = &mut timer => {
                    if !batch.is_empty() {
                        self.flush(&mut batch, "timeout").await;
                    }
                    timer.as_mut().reset(Instant::now() + self.batch_timeout);
                }

                received = self.receiver.recv() => match received {
                    Some(event) => {
                        batch.push(event);
                        if batch.len() >= self.batch_size {
                            self.flush(&mut batch, "size").await;
                            timer.as_mut().reset(Instant::now() + self.batch_timeout);
                        }
                    }
                    None => {
                        if !batch.is_empty() {
                            self.flush(&mut batch, "queue_closed").await;
                        }
                        debug!("Queue closed");
                        break;
                    }
                },
            }
        }

        debug!("Batch worker stopped");
    }

    async fn shutdown(&self, batch: &mut Vec<OrderEvent>) {
        if batch.is_empty() {
            return;
        }
        if !self.flush_on_shutdown {
            warn!(dropped = batch.len(), "Shutdown with unflushed events");
            return;
        }

        let pending = batch.len();
        if time::timeout(self.shutdown_flush_timeout, self.flush(batch, "shutdown"))
            .await
            .is_err()
        {
            warn!(
                pending = pending,
                timeout_ms = self.shutdown_flush_timeout.as_millis() as u64,
                "Shutdown flush timed out"
            );
        }
    }

    async fn flush(&self, batch: &mut Vec<OrderEvent>, trigger: &str) {
        let started = Instant::now();
        let size = batch.len();
        let mut failed = 0;

        for event in batch.drain(..) {
            if let Err(error) = self.persist(&event).await {
                failed += 1;
                self.dead_letter(event, error).await;
            }
        }

        self.stats.record_flush(size - failed, failed);
        debug!(trigger = trigger, "Batch flushed");
        log_batch_operation(
            "flush",
            &self.worker_id,
            self.receiver.kind().as_str(),
            size,
            failed,
            Some(started.elapsed().as_millis() as u64),
        );
    }

    async fn persist(&self, event: &OrderEvent) -> Result<(), PersistError> {
        match event.kind() {
            EventKind::OrderCreated => {
                let id = self.repository.create(&event.to_new_order()).await?;
                debug!(order_id = %id, "Order created");
            }
            EventKind::OrderStatusUpdated => {
                let kind = event.kind();
                let id = event.order_id.ok_or(PersistError::Incomplete {
                    kind,
                    field: "order_id",
                })?;
                let status = event.status.ok_or(PersistError::Incomplete {
                    kind,
                    field: "status",
                })?;
                self.repository.update_status(id, status).await?;
                debug!(order_id = %id, status = %status, "Order status updated");
            }
        }
        Ok(())
    }

    async fn dead_letter(&self, event: OrderEvent, error: PersistError) {
        warn!(
            event_kind = %event.kind(),
            order_id = ?event.order_id,
            error = %error,
            "Persisting event failed - dead-lettering"
        );

        let record = TypedDlqRecord::new(event, &error);
        if let Err(e) = self.dead_letters.publish(&record).await {
            self.stats.record_dead_letter_failure();
            error!(
                event_kind = %record.event_kind(),
                order_id = ?record.event.order_id,
                error = %e,
                persist_error = %record.error,
                "❌ Dead-letter publish failed - event lost"
            );
        }
    }
}
