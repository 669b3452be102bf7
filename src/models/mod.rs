//! # Domain Models
//!
//! - [`order`] - the persisted aggregate and its creation input
//! - [`order_event`] - events flowing through the ingestion pipeline

pub mod order;
pub mod order_event;

pub use order::{InvalidOrderStatus, NewOrder, Order, OrderItems, OrderStatus};
pub use order_event::{EventKind, OrderEvent};
