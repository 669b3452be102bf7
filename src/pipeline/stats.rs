//! Counters for the consumer loop and the worker pool.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Consumer loop counters
#[derive(Debug, Default)]
pub struct ConsumerStats {
    received: AtomicU64,
    enqueued: AtomicU64,
    dead_lettered: AtomicU64,
    dead_letter_failures: AtomicU64,
    read_errors: AtomicU64,
    ack_failures: AtomicU64,
}

impl ConsumerStats {
    pub fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dead_lettered(&self) {
        self.dead_lettered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dead_letter_failure(&self) {
        self.dead_letter_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_read_error(&self) {
        self.read_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ack_failure(&self) {
        self.ack_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ConsumerStatsSnapshot {
        ConsumerStatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dead_lettered: self.dead_lettered.load(Ordering::Relaxed),
            dead_letter_failures: self.dead_letter_failures.load(Ordering::Relaxed),
            read_errors: self.read_errors.load(Ordering::Relaxed),
            ack_failures: self.ack_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConsumerStatsSnapshot {
    pub received: u64,
    pub enqueued: u64,
    pub dead_lettered: u64,
    pub dead_letter_failures: u64,
    pub read_errors: u64,
    pub ack_failures: u64,
}

/// Worker pool counters, shared by every worker of every kind
#[derive(Debug, Default)]
pub struct WorkerPoolStats {
    batches_flushed: AtomicU64,
    events_persisted: AtomicU64,
    events_failed: AtomicU64,
    dead_letter_failures: AtomicU64,
}

impl WorkerPoolStats {
    pub fn record_flush(&self, persisted: usize, failed: usize) {
        self.batches_flushed.fetch_add(1, Ordering::Relaxed);
        self.events_persisted
            .fetch_add(persisted as u64, Ordering::Relaxed);
        self.events_failed.fetch_add(failed as u64, Ordering::Relaxed);
    }

    pub fn record_dead_letter_failure(&self) {
        self.dead_letter_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> WorkerPoolStatsSnapshot {
        WorkerPoolStatsSnapshot {
            batches_flushed: self.batches_flushed.load(Ordering::Relaxed),
            events_persisted: self.events_persisted.load(Ordering::Relaxed),
            events_failed: self.events_failed.load(Ordering::Relaxed),
            dead_letter_failures: self.dead_letter_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerPoolStatsSnapshot {
    pub batches_flushed: u64,
    pub events_persisted: u64,
    pub events_failed: u64,
    pub dead_letter_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_pool_flush_accounting() {
        let stats = WorkerPoolStats::default();
        stats.record_flush(3, 0);
        stats.record_flush(1, 1);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.batches_flushed, 2);
        assert_eq!(snapshot.events_persisted, 4);
        assert_eq!(snapshot.events_failed, 1);
    }
}
