//! # Order Persistence
//!
//! The [`OrderRepository`] port the batch workers write through, with a
//! Postgres implementation and an in-memory one used by tests and local runs.

pub mod in_memory;
pub mod postgres;
pub mod repository;

pub use in_memory::InMemoryOrderRepository;
pub use postgres::PgOrderRepository;
pub use repository::{OrderRepository, RepositoryError, RepositoryResult};
