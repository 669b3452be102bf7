//! # Crate Error Types
//!
//! Top-level error aggregating the subsystem errors. Components return their
//! own error enums; wiring code and the binary work with [`OrderSvcError`].

use thiserror::Error;

use crate::config::ConfigurationError;
use crate::messaging::MessagingError;
use crate::persistence::RepositoryError;
use crate::pipeline::ConsumerError;

#[derive(Error, Debug)]
pub enum OrderSvcError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Messaging error: {0}")]
    Messaging(#[from] MessagingError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Consumer error: {0}")]
    Consumer(#[from] ConsumerError),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for OrderSvcError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for OrderSvcError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Database(format!("migration failed: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, OrderSvcError>;
