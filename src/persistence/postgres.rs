//! Postgres-backed [`OrderRepository`].
//!
//! Maps to the `orders` table created by `migrations/20250601000000_create_orders.sql`.
//! `status` is a Postgres enum and is cast to and from text at the query
//! boundary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use super::repository::{OrderRepository, RepositoryError, RepositoryResult};
use crate::models::{NewOrder, Order, OrderItems, OrderStatus};

#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    items: Json<OrderItems>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<OrderStatus>()
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        Ok(Order {
            id: row.id,
            items: row.items.0,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn create(&self, order: &NewOrder) -> RepositoryResult<Uuid> {
        let id = order.id.unwrap_or_else(Uuid::new_v4);
        let status = order.status.map(|s| s.as_str());

        sqlx::query(
            r#"
            INSERT INTO orders (id, items, status)
            VALUES ($1, $2, COALESCE($3::order_status, 'pending'::order_status))
            "#,
        )
        .bind(id)
        .bind(Json(&order.items))
        .bind(status)
        .execute(&self.pool)
        .await?;

        debug!(order_id = %id, "Inserted order");
        Ok(id)
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> RepositoryResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2::order_status, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::OrderNotFound { id });
        }
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> RepositoryResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, items, status::text AS status, created_at, updated_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    async fn list_by_status(&self, status: OrderStatus) -> RepositoryResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, items, status::text AS status, created_at, updated_at
            FROM orders
            WHERE status = $1::order_status
            ORDER BY created_at
            "#,
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }
}
