//! # Service Constants
//!
//! Environment variable names, configuration defaults and the reason codes
//! written into dead-letter records.

/// Environment variables consulted at startup
pub mod env {
    pub const ORDER_SVC_ENV: &str = "ORDER_SVC_ENV";
    pub const APP_ENV: &str = "APP_ENV";
    pub const ORDER_SVC_HOME: &str = "ORDER_SVC_HOME";
    pub const ORDER_SVC_CONFIG_PATH: &str = "ORDER_SVC_CONFIG_PATH";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const KAFKA_BROKERS: &str = "KAFKA_BROKERS";
}

/// Known deployment environments
pub mod environments {
    pub const DEVELOPMENT: &str = "development";
    pub const TEST: &str = "test";
    pub const PRODUCTION: &str = "production";

    pub const ALL: [&str; 3] = [DEVELOPMENT, TEST, PRODUCTION];
}

/// Reason codes carried by dead-letter records
pub mod dlq_reasons {
    pub const DECODE_FAILED: &str = "decode_failed";
    pub const UNKNOWN_EVENT_TYPE: &str = "unknown_event_type";
    pub const PERSIST_CREATE_FAILED: &str = "persist_create_failed";
    pub const PERSIST_UPDATE_FAILED: &str = "persist_update_failed";
}

/// Default configuration file name, resolved under `config/`
pub const DEFAULT_CONFIG_FILE: &str = "order-svc.yaml";

/// Default directory for JSON log files
pub const DEFAULT_LOG_DIR: &str = "log";

/// Default topic names per event kind
pub mod topics {
    pub const ORDER_CREATED: &str = "orders.created";
    pub const ORDER_STATUS_UPDATED: &str = "orders.status_updated";
    pub const ORDER_CREATED_DLQ: &str = "orders.created.dlq";
    pub const ORDER_STATUS_UPDATED_DLQ: &str = "orders.status_updated.dlq";
    pub const RAW_DLQ: &str = "orders.dlq";
}
