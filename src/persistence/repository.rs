use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewOrder, Order, OrderStatus};

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Order not found: {id}")]
    OrderNotFound { id: Uuid },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Storage port for orders.
///
/// Calls are not idempotent: `create` with a repeated id fails, and the
/// workers never retry. Timestamps are owned by the implementation.
#[async_trait]
pub trait OrderRepository: Send + Sync + 'static {
    /// Insert an order, generating the id when absent and defaulting the
    /// status to pending. Returns the stored id.
    async fn create(&self, order: &NewOrder) -> RepositoryResult<Uuid>;

    /// Set the status of an existing order.
    ///
    /// Fails with [`RepositoryError::OrderNotFound`] when no row matches.
    async fn update_status(&self, id: Uuid, status: OrderStatus) -> RepositoryResult<()>;

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Order>>;

    async fn list_by_status(&self, status: OrderStatus) -> RepositoryResult<Vec<Order>>;
}
