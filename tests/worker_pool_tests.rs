mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use common::*;
use order_svc::config::{KafkaConfig, PipelineConfig};
use order_svc::dlq::{InMemoryDeadLetterSink, TypedDlqPublisher};
use order_svc::models::{OrderEvent, OrderStatus};
use order_svc::pipeline::{event_queues, EventQueues, WorkerPool};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

struct Harness {
    repository: Arc<RecordingRepository>,
    sink: Arc<InMemoryDeadLetterSink>,
    pool: WorkerPool,
}

fn harness(repository: RecordingRepository, config: PipelineConfig) -> Harness {
    let repository = Arc::new(repository);
    let sink = Arc::new(InMemoryDeadLetterSink::new());
    let publisher = TypedDlqPublisher::new(sink.clone(), KafkaConfig::default().typed_dlq_topics());
    let pool = WorkerPool::new(repository.clone(), Arc::new(publisher), config);
    Harness {
        repository,
        sink,
        pool,
    }
}

fn created(n: u32) -> OrderEvent {
    OrderEvent::created(items(&[("sku", n)]), None)
}

async fn enqueue_created(queues: &EventQueues, range: std::ops::RangeInclusive<u32>) {
    let cancel = CancellationToken::new();
    for n in range {
        queues.enqueue(created(n), &cancel).await.unwrap();
    }
}

fn quantity(call: &RepositoryCall) -> u32 {
    match call {
        RepositoryCall::Create(order) => order.items["sku"],
        other => panic!("unexpected call {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_flushes_full_batch_then_remainder_on_timeout() {
    let h = harness(RecordingRepository::new(), pipeline_config(3, 100, 1));
    let (queues, receivers) = event_queues(16);
    let cancel = CancellationToken::new();

    let started = Instant::now();
    enqueue_created(&queues, 1..=5).await;
    let workers = h.pool.start(&receivers, cancel.clone());

    tokio::time::sleep(Duration::from_millis(150)).await;

    let recorded = h.repository.recorded().await;
    assert_eq!(recorded.len(), 5);
    let quantities: Vec<u32> = recorded.iter().map(|r| quantity(&r.call)).collect();
    assert_eq!(quantities, vec![1, 2, 3, 4, 5], "dequeue order is preserved");

    // E1..E3 flushed on size immediately, E4..E5 only once the timer fired
    for r in &recorded[..3] {
        assert!(r.at - started < Duration::from_millis(100));
    }
    for r in &recorded[3..] {
        assert!(r.at - started >= Duration::from_millis(100));
    }

    let stats = h.pool.stats().snapshot();
    assert_eq!(stats.batches_flushed, 2);
    assert_eq!(stats.events_persisted, 5);

    cancel.cancel();
    workers.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_single_event_flushed_after_timeout() {
    let h = harness(RecordingRepository::new(), pipeline_config(100, 50, 1));
    let (queues, receivers) = event_queues(16);
    let cancel = CancellationToken::new();

    let started = Instant::now();
    let workers = h.pool.start(&receivers, cancel.clone());
    enqueue_created(&queues, 1..=1).await;

    tokio::time::sleep(Duration::from_millis(49)).await;
    assert_eq!(h.repository.call_count().await, 0);

    tokio::time::sleep(Duration::from_millis(20)).await;
    let recorded = h.repository.recorded().await;
    assert_eq!(recorded.len(), 1);
    let elapsed = recorded[0].at - started;
    assert!(elapsed >= Duration::from_millis(50) && elapsed < Duration::from_millis(60));

    cancel.cancel();
    workers.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_failed_item_is_dead_lettered_and_batch_continues() {
    let h = harness(RecordingRepository::failing_on([2]), pipeline_config(3, 1_000, 1));
    let (queues, receivers) = event_queues(16);
    let cancel = CancellationToken::new();

    enqueue_created(&queues, 1..=3).await;
    let workers = h.pool.start(&receivers, cancel.clone());
    tokio::time::sleep(Duration::from_millis(10)).await;

    let calls = h.repository.calls().await;
    assert_eq!(calls.iter().map(quantity).collect::<Vec<_>>(), vec![1, 2, 3]);

    let dead_letters = h.sink.sent().await;
    assert_eq!(dead_letters.len(), 1);
    assert_eq!(dead_letters[0].topic, CREATED_DLQ_TOPIC);
    let record = dead_letters[0].json().unwrap();
    assert_eq!(record["reason"], "persist_create_failed");
    assert_eq!(record["event"]["items"]["sku"], 2);
    assert_eq!(dead_letters[0].key, None, "creation failures are sent unkeyed");
    assert!(record["error"]
        .as_str()
        .unwrap()
        .contains("injected failure on call 2"));

    let stats = h.pool.stats().snapshot();
    assert_eq!(stats.events_persisted, 2);
    assert_eq!(stats.events_failed, 1);

    cancel.cancel();
    workers.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_failed_status_update_routes_to_status_dead_letter_topic() {
    let h = harness(RecordingRepository::failing_on([1]), pipeline_config(1, 1_000, 1));
    let (queues, receivers) = event_queues(16);
    let cancel = CancellationToken::new();
    let id = Uuid::new_v4();

    let workers = h.pool.start(&receivers, cancel.clone());
    queues
        .enqueue(OrderEvent::status_updated(id, OrderStatus::Confirmed), &cancel)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(
        h.repository.calls().await,
        vec![RepositoryCall::UpdateStatus(id, OrderStatus::Confirmed)]
    );
    let dead_letters = h.sink.sent_to(STATUS_DLQ_TOPIC).await;
    assert_eq!(dead_letters.len(), 1);
    assert_eq!(dead_letters[0].key, Some(id.to_string().into_bytes()));
    assert_eq!(dead_letters[0].json().unwrap()["reason"], "persist_update_failed");

    cancel.cancel();
    workers.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_dead_letter_failure_is_counted_not_fatal() {
    let repository = Arc::new(RecordingRepository::failing_on([1]));
    let sink = Arc::new(InMemoryDeadLetterSink::new());
    // No destinations: every typed publish fails
    let publisher = TypedDlqPublisher::new(sink.clone(), HashMap::new());
    let pool = WorkerPool::new(repository.clone(), Arc::new(publisher), pipeline_config(2, 1_000, 1));
    let (queues, receivers) = event_queues(16);
    let cancel = CancellationToken::new();

    enqueue_created(&queues, 1..=2).await;
    let workers = pool.start(&receivers, cancel.clone());
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(repository.call_count().await, 2);
    assert!(sink.is_empty().await);
    let stats = pool.stats().snapshot();
    assert_eq!(stats.dead_letter_failures, 1);
    assert_eq!(stats.events_persisted, 1);

    cancel.cancel();
    workers.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_flushes_held_batch_only() {
    let h = harness(RecordingRepository::new(), pipeline_config(10, 60_000, 1));
    let (queues, receivers) = event_queues(16);
    let cancel = CancellationToken::new();

    let workers = h.pool.start(&receivers, cancel.clone());
    enqueue_created(&queues, 1..=2).await;
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(h.repository.call_count().await, 0);

    cancel.cancel();
    workers.join().await;
    assert_eq!(h.repository.call_count().await, 2);

    // Nothing is consumed after the signal
    enqueue_created(&queues, 3..=3).await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(h.repository.call_count().await, 2);
    assert_eq!(queues.depth(order_svc::EventKind::OrderCreated), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_without_shutdown_flush_drops_batch() {
    let config = PipelineConfig {
        flush_on_shutdown: false,
        ..pipeline_config(10, 60_000, 1)
    };
    let h = harness(RecordingRepository::new(), config);
    let (queues, receivers) = event_queues(16);
    let cancel = CancellationToken::new();

    let workers = h.pool.start(&receivers, cancel.clone());
    enqueue_created(&queues, 1..=2).await;
    tokio::time::sleep(Duration::from_millis(1)).await;

    cancel.cancel();
    workers.join().await;
    assert_eq!(h.repository.call_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_closed_queues_are_drained_before_workers_exit() {
    let h = harness(RecordingRepository::new(), pipeline_config(4, 60_000, 2));
    let (queues, receivers) = event_queues(16);

    enqueue_created(&queues, 1..=10).await;
    let workers = h.pool.start(&receivers, CancellationToken::new());
    assert_eq!(workers.worker_count(), 4);
    drop(queues);

    workers.join().await;
    let mut quantities: Vec<u32> = h.repository.calls().await.iter().map(quantity).collect();
    quantities.sort_unstable();
    assert_eq!(quantities, (1..=10).collect::<Vec<_>>());
}
