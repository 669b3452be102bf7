//! # Database Operations
//!
//! Connection pooling and schema migrations for the order store.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use order_svc::config::DatabaseConfig;
//! use order_svc::database::{run_migrations, DatabaseConnection};
//!
//! # async fn example(config: &DatabaseConfig) -> order_svc::Result<()> {
//! let db = DatabaseConnection::connect(config).await?;
//! run_migrations(db.pool()).await?;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod migrations;

pub use connection::DatabaseConnection;
pub use migrations::run_migrations;
