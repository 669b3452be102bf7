//! Order Service Binary
//!
//! Consumes order events from Kafka, persists them to Postgres in batches
//! and dead-letters failures. Stops on Ctrl-C or SIGTERM.

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use order_svc::bootstrap::{shutdown_signal, OrderPipeline};
use order_svc::config::ConfigManager;
use order_svc::database::{run_migrations, DatabaseConnection};
use order_svc::logging::{init_structured_logging, log_error};
use order_svc::messaging::{KafkaDeadLetterSink, KafkaMessageSource};
use order_svc::persistence::PgOrderRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_structured_logging();

    let manager = ConfigManager::load().context("loading configuration")?;
    let config = manager.config();
    info!(
        environment = %manager.environment(),
        config_path = %manager.config_path().display(),
        "Starting order service"
    );
    debug!(config = %manager.debug_config(), "Effective configuration");

    let db = DatabaseConnection::connect(&config.database)
        .await
        .context("connecting to database")?;
    if config.database.run_migrations {
        run_migrations(db.pool())
            .await
            .context("running migrations")?;
    }

    let topics = config.kafka.topic_router().topics();
    let source = KafkaMessageSource::new(&config.kafka, &topics).context("creating consumer")?;
    let sink = KafkaDeadLetterSink::new(&config.kafka).context("creating producer")?;
    let repository = PgOrderRepository::new(db.pool().clone());

    let pipeline = OrderPipeline::new(
        config,
        Arc::new(source),
        Arc::new(repository),
        Arc::new(sink),
    )?;
    let consumer_stats = pipeline.consumer_stats();
    let worker_stats = pipeline.worker_stats();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        trigger.cancel();
    });

    let result = pipeline.run(cancel).await;
    if let Err(e) = &result {
        log_error("order_svc", "pipeline_run", &e.to_string(), None);
    }

    info!(
        consumer = ?consumer_stats.snapshot(),
        workers = ?worker_stats.snapshot(),
        "Order service stopped"
    );
    db.close().await;

    result.map_err(Into::into)
}
