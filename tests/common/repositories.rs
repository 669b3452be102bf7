//! Repository doubles that record every call with its (tokio) timestamp.

use std::collections::HashSet;

use async_trait::async_trait;
use order_svc::models::{NewOrder, Order, OrderStatus};
use order_svc::persistence::{OrderRepository, RepositoryError, RepositoryResult};
use tokio::sync::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryCall {
    Create(NewOrder),
    UpdateStatus(Uuid, OrderStatus),
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub call: RepositoryCall,
    pub at: Instant,
}

/// Records calls and fails the ones whose 1-based position is in `fail_on`
#[derive(Debug, Default)]
pub struct RecordingRepository {
    calls: Mutex<Vec<RecordedCall>>,
    fail_on: HashSet<usize>,
}

impl RecordingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(calls: impl IntoIterator<Item = usize>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_on: calls.into_iter().collect(),
        }
    }

    pub async fn calls(&self) -> Vec<RepositoryCall> {
        self.calls
            .lock()
            .await
            .iter()
            .map(|recorded| recorded.call.clone())
            .collect()
    }

    pub async fn recorded(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    async fn record(&self, call: RepositoryCall) -> RepositoryResult<()> {
        let mut calls = self.calls.lock().await;
        calls.push(RecordedCall {
            call,
            at: Instant::now(),
        });
        if self.fail_on.contains(&calls.len()) {
            return Err(RepositoryError::Database(format!(
                "injected failure on call {}",
                calls.len()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for RecordingRepository {
    async fn create(&self, order: &NewOrder) -> RepositoryResult<Uuid> {
        self.record(RepositoryCall::Create(order.clone())).await?;
        Ok(order.id.unwrap_or_else(Uuid::new_v4))
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> RepositoryResult<()> {
        self.record(RepositoryCall::UpdateStatus(id, status)).await
    }

    async fn get_by_id(&self, _id: Uuid) -> RepositoryResult<Option<Order>> {
        Ok(None)
    }

    async fn list_by_status(&self, _status: OrderStatus) -> RepositoryResult<Vec<Order>> {
        Ok(Vec::new())
    }
}
