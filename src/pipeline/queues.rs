//! # Type-Routed Queues
//!
//! One bounded tokio channel per [`EventKind`]. The consumer loop holds the
//! sending side ([`EventQueues`]) and blocks when a queue is full; every
//! worker of a kind shares that kind's receiving side ([`SharedReceiver`]).
//!
//! Dropping [`EventQueues`] closes every queue. Workers then drain what is
//! left and observe the closure.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::models::{EventKind, OrderEvent};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnqueueError {
    #[error("Enqueue cancelled by shutdown")]
    Cancelled,

    #[error("Queue for {kind} is closed")]
    Closed { kind: EventKind },
}

/// Create one queue of `capacity` per event kind
pub fn event_queues(capacity: usize) -> (EventQueues, QueueReceivers) {
    let mut senders = HashMap::new();
    let mut receivers = HashMap::new();
    for kind in EventKind::ALL {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        senders.insert(kind, sender);
        receivers.insert(
            kind,
            SharedReceiver {
                kind,
                inner: Arc::new(Mutex::new(receiver)),
            },
        );
    }
    (EventQueues { senders }, QueueReceivers { receivers })
}

/// Sending side of the type-routed queues
#[derive(Debug)]
pub struct EventQueues {
    senders: HashMap<EventKind, mpsc::Sender<OrderEvent>>,
}

impl EventQueues {
    /// Hand `event` to the queue of its kind, waiting for space when full.
    ///
    /// Returns [`EnqueueError::Cancelled`] if `cancel` fires first, in which
    /// case the event was not queued.
    pub async fn enqueue(
        &self,
        event: OrderEvent,
        cancel: &CancellationToken,
    ) -> Result<(), EnqueueError> {
        let kind = event.kind();
        let sender = self
            .senders
            .get(&kind)
            .ok_or(EnqueueError::Closed { kind })?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(EnqueueError::Cancelled),
            sent = sender.send(event) => sent.map_err(|_| EnqueueError::Closed { kind }),
        }
    }

    /// Events currently waiting in the queue for `kind`
    pub fn depth(&self, kind: EventKind) -> usize {
        self.senders
            .get(&kind)
            .map(|sender| sender.max_capacity() - sender.capacity())
            .unwrap_or(0)
    }
}

/// Receiving side of the type-routed queues
#[derive(Debug)]
pub struct QueueReceivers {
    receivers: HashMap<EventKind, SharedReceiver>,
}

impl QueueReceivers {
    pub fn receiver(&self, kind: EventKind) -> Option<SharedReceiver> {
        self.receivers.get(&kind).cloned()
    }
}

/// Queue handle shared by every worker of one kind.
///
/// Only one worker waits on the channel at a time; the others wait on the
/// lock. `recv` is cancel-safe, so it can be raced in `select!`.
#[derive(Debug, Clone)]
pub struct SharedReceiver {
    kind: EventKind,
    inner: Arc<Mutex<mpsc::Receiver<OrderEvent>>>,
}

impl SharedReceiver {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Next event, or `None` once the queue is closed and empty
    pub async fn recv(&self) -> Option<OrderEvent> {
        self.inner.lock().await.recv().await
    }
}
