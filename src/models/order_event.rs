//! # Order Events
//!
//! The unit of work flowing from the consumer through the queues to the
//! batch workers. Built once by the decoder and never mutated afterwards.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::order::{NewOrder, OrderItems, OrderStatus};

/// Domain event category. Each kind has its own queue and worker set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    OrderCreated,
    OrderStatusUpdated,
}

impl EventKind {
    pub const ALL: [EventKind; 2] = [Self::OrderCreated, Self::OrderStatusUpdated];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderCreated => "OrderCreated",
            Self::OrderStatusUpdated => "OrderStatusUpdated",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderEvent {
    /// Absent for creation events; the repository assigns the id.
    pub order_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<OrderItems>,
    pub status: Option<OrderStatus>,
    pub event_type: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl OrderEvent {
    pub fn created(items: OrderItems, status: Option<OrderStatus>) -> Self {
        Self {
            order_id: None,
            items: Some(items),
            status,
            event_type: EventKind::OrderCreated,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn status_updated(order_id: Uuid, status: OrderStatus) -> Self {
        Self {
            order_id: Some(order_id),
            items: None,
            status: Some(status),
            event_type: EventKind::OrderStatusUpdated,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_timestamps(
        mut self,
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.created_at = created_at;
        self.updated_at = updated_at;
        self
    }

    pub fn kind(&self) -> EventKind {
        self.event_type
    }

    /// Repository input for a creation event. Missing items become an empty map.
    pub fn to_new_order(&self) -> NewOrder {
        NewOrder {
            id: self.order_id,
            items: self.items.clone().unwrap_or_default(),
            status: self.status,
        }
    }

    /// Key used when the event is republished (dead-lettered)
    pub fn partition_key(&self) -> Option<String> {
        self.order_id.map(|id| id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_serializes_as_type_name() {
        assert_eq!(
            serde_json::to_string(&EventKind::OrderStatusUpdated).unwrap(),
            "\"OrderStatusUpdated\""
        );
        assert_eq!(EventKind::OrderCreated.to_string(), "OrderCreated");
    }

    #[test]
    fn test_created_event_to_new_order() {
        let mut items = OrderItems::new();
        items.insert("sku_1".to_string(), 2);

        let event = OrderEvent::created(items.clone(), Some(OrderStatus::Pending));
        let order = event.to_new_order();

        assert_eq!(order.id, None);
        assert_eq!(order.items, items);
        assert_eq!(order.status, Some(OrderStatus::Pending));
        assert_eq!(event.partition_key(), None);
    }

    #[test]
    fn test_status_updated_event_json_shape() {
        let id = Uuid::new_v4();
        let event = OrderEvent::status_updated(id, OrderStatus::Confirmed);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["order_id"], id.to_string());
        assert_eq!(json["status"], "confirmed");
        assert_eq!(json["event_type"], "OrderStatusUpdated");
        assert!(json.get("items").is_none());
        assert_eq!(event.partition_key(), Some(id.to_string()));
    }
}
