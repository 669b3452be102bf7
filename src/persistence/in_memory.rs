use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repository::{OrderRepository, RepositoryError, RepositoryResult};
use crate::models::{NewOrder, Order, OrderStatus};

/// HashMap-backed repository with the same semantics as the Postgres one
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<Uuid, Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, order: &NewOrder) -> RepositoryResult<Uuid> {
        let id = order.id.unwrap_or_else(Uuid::new_v4);
        let mut orders = self.orders.write().await;
        if orders.contains_key(&id) {
            return Err(RepositoryError::Database(format!(
                "duplicate key value violates unique constraint: {id}"
            )));
        }

        let now = Utc::now();
        orders.insert(
            id,
            Order {
                id,
                items: order.items.clone(),
                status: order.effective_status(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> RepositoryResult<()> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&id)
            .ok_or(RepositoryError::OrderNotFound { id })?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn list_by_status(&self, status: OrderStatus) -> RepositoryResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|order| order.status == status)
            .cloned()
            .collect();
        orders.sort_by_key(|order| order.created_at);
        Ok(orders)
    }
}
