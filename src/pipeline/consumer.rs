//! # Consumer Loop
//!
//! Reads one message at a time from the [`MessageSource`], decodes it and
//! hands the event to its type-routed queue. Undecodable or unroutable
//! messages go to the raw dead-letter destination.
//!
//! A message is acknowledged as soon as it has been queued or
//! dead-lettered, before any persistence happens. Persistence failures are
//! recovered from the typed dead-letter destination, not by redelivery.

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::queues::{EnqueueError, EventQueues};
use super::stats::ConsumerStats;
use crate::dlq::{DeadLetterPublisher, RawDlqReason, RawDlqRecord};
use crate::messaging::trace_context::trace_id;
use crate::messaging::{EventDecoder, InboundMessage, MessageSource, MessagingError};
use crate::models::EventKind;

/// Why the consumer loop stopped
#[derive(Error, Debug)]
pub enum ConsumerError {
    #[error("Consumer cancelled")]
    Cancelled,

    #[error("Message source failed: {0}")]
    Source(#[source] MessagingError),

    #[error("Queue for {kind} closed while consuming")]
    QueueClosed { kind: EventKind },
}

impl From<EnqueueError> for ConsumerError {
    fn from(err: EnqueueError) -> Self {
        match err {
            EnqueueError::Cancelled => Self::Cancelled,
            EnqueueError::Closed { kind } => Self::QueueClosed { kind },
        }
    }
}

pub struct OrderConsumer {
    source: Arc<dyn MessageSource>,
    decoder: EventDecoder,
    queues: EventQueues,
    raw_dead_letters: Arc<dyn DeadLetterPublisher<RawDlqRecord>>,
    stats: Arc<ConsumerStats>,
}

impl OrderConsumer {
    pub fn new(
        source: Arc<dyn MessageSource>,
        decoder: EventDecoder,
        queues: EventQueues,
        raw_dead_letters: Arc<dyn DeadLetterPublisher<RawDlqRecord>>,
    ) -> Self {
        Self {
            source,
            decoder,
            queues,
            raw_dead_letters,
            stats: Arc::new(ConsumerStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<ConsumerStats> {
        Arc::clone(&self.stats)
    }

    /// Consume until cancelled or until the source becomes unusable.
    ///
    /// Always ends with the terminal reason. The queues are closed when the
    /// loop returns, which lets the workers finish.
    pub async fn run(self, cancel: CancellationToken) -> ConsumerError {
        info!(
            source = self.source.provider_name(),
            topics = ?self.decoder.router().topics(),
            "🚀 Order consumer started"
        );

        let reason = self.consume(&cancel).await;
        match &reason {
            ConsumerError::Cancelled => info!("🛑 Order consumer stopped"),
            other => error!(error = %other, "❌ Order consumer terminated"),
        }
        reason
    }

    async fn consume(&self, cancel: &CancellationToken) -> ConsumerError {
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return ConsumerError::Cancelled,
                next = self.source.next_message() => next,
            };

            let message = match next {
                Ok(message) => message,
                Err(e) if e.is_terminal() => return ConsumerError::Source(e),
                Err(e) => {
                    self.stats.record_read_error();
                    warn!(error = %e, "Failed to read message - continuing");
                    continue;
                }
            };

            self.stats.record_received();
            let span = info_span!(
                "order_consumer.message",
                topic = %message.topic,
                partition = message.partition,
                offset = message.offset,
                trace_id = tracing::field::Empty,
            );
            if let Some(trace_id) = trace_id(&message.headers) {
                span.record("trace_id", trace_id.as_str());
            }

            if let Err(reason) = self.handle_message(message, cancel).instrument(span).await {
                return reason;
            }
        }
    }

    async fn handle_message(
        &self,
        message: InboundMessage,
        cancel: &CancellationToken,
    ) -> Result<(), ConsumerError> {
        match self.decoder.decode(&message) {
            Ok(event) => {
                let kind = event.kind();
                self.queues.enqueue(event, cancel).await?;
                self.stats.record_enqueued();
                debug!(event_kind = %kind, "Event queued");
            }
            Err(e) => {
                warn!(error = %e, reason = %e.dlq_reason(), "Message could not be decoded");
                self.dead_letter(&message, e.dlq_reason()).await;
            }
        }

        if let Err(e) = self.source.ack(&message).await {
            self.stats.record_ack_failure();
            warn!(error = %e, "Failed to acknowledge message");
        }
        Ok(())
    }

    async fn dead_letter(&self, message: &InboundMessage, reason: RawDlqReason) {
        let record = RawDlqRecord::from_message(message, reason);
        match self.raw_dead_letters.publish(&record).await {
            Ok(()) => self.stats.record_dead_lettered(),
            Err(e) => {
                self.stats.record_dead_letter_failure();
                error!(
                    error = %e,
                    reason = %reason,
                    "❌ Raw dead-letter publish failed - message lost"
                );
            }
        }
    }
}
