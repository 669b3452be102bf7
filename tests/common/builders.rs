//! Payload and configuration builders shared by the integration suites.

use order_svc::config::{OrderSvcConfig, PipelineConfig};
use order_svc::constants::topics;
use order_svc::models::OrderItems;
use serde_json::json;
use uuid::Uuid;

pub const CREATED_TOPIC: &str = topics::ORDER_CREATED;
pub const STATUS_TOPIC: &str = topics::ORDER_STATUS_UPDATED;
pub const RAW_DLQ_TOPIC: &str = topics::RAW_DLQ;
pub const CREATED_DLQ_TOPIC: &str = topics::ORDER_CREATED_DLQ;
pub const STATUS_DLQ_TOPIC: &str = topics::ORDER_STATUS_UPDATED_DLQ;

pub fn items(entries: &[(&str, u32)]) -> OrderItems {
    entries
        .iter()
        .map(|(sku, quantity)| (sku.to_string(), *quantity))
        .collect()
}

pub fn created_payload(entries: &[(&str, u32)], status: Option<&str>) -> Vec<u8> {
    let mut payload = json!({ "items": items(entries) });
    if let Some(status) = status {
        payload["status"] = json!(status);
    }
    payload.to_string().into_bytes()
}

pub fn status_payload(id: Uuid, status: &str) -> Vec<u8> {
    json!({ "id": id.to_string(), "status": status })
        .to_string()
        .into_bytes()
}

pub fn pipeline_config(batch_size: usize, batch_timeout_ms: u64, workers: usize) -> PipelineConfig {
    PipelineConfig {
        queue_capacity: 16,
        batch_size,
        batch_timeout_ms,
        workers_per_kind: workers,
        flush_on_shutdown: true,
        shutdown_flush_timeout_ms: 1_000,
    }
}

/// Default topics with the given pipeline settings
pub fn service_config(pipeline: PipelineConfig) -> OrderSvcConfig {
    OrderSvcConfig {
        pipeline,
        ..OrderSvcConfig::default()
    }
}
