use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::Result;

pub struct DatabaseConnection {
    pool: PgPool,
}

impl DatabaseConnection {
    /// Open a pool sized and timed from `config`
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let database_url = config.database_url()?;

        info!(
            "Initializing database pool with {}..{} connections",
            config.min_connections, config.max_connections
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout())
            .idle_timeout(config.idle_timeout())
            .max_lifetime(config.max_lifetime())
            .connect(database_url)
            .await?;

        info!(
            "Database pool initialized: {} connections, {}s acquire timeout",
            pool.size(),
            config.acquire_timeout_seconds
        );

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}
