//! # Order Aggregate
//!
//! The persisted order and the shape handed to the repository on creation.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// SKU → quantity. Ordered so serialized payloads are deterministic.
pub type OrderItems = BTreeMap<String, u32>;

/// Lifecycle status of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Failed,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 3] = [Self::Pending, Self::Confirmed, Self::Failed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the known statuses
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid order status: {0:?}")]
pub struct InvalidOrderStatus(pub String);

impl FromStr for OrderStatus {
    type Err = InvalidOrderStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "failed" => Ok(Self::Failed),
            other => Err(InvalidOrderStatus(other.to_string())),
        }
    }
}

/// A stored order. Timestamps are owned by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub items: OrderItems,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for `OrderRepository::create`.
///
/// `id` is generated by the repository when absent and `status` falls back
/// to [`OrderStatus::Pending`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewOrder {
    pub id: Option<Uuid>,
    pub items: OrderItems,
    pub status: Option<OrderStatus>,
}

impl NewOrder {
    pub fn new(items: OrderItems) -> Self {
        Self {
            id: None,
            items,
            status: None,
        }
    }

    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Status that will be stored once defaults are applied
    pub fn effective_status(&self) -> OrderStatus {
        self.status.unwrap_or_default()
    }
}
