//! # Structured Logging Module
//!
//! Environment-aware structured logging that outputs to both console and a
//! JSON log file, so a message can be followed from the consumer loop through
//! a queue into a batch flush.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::OnceLock;

use chrono::Utc;
use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::ConfigManager;
use crate::constants::{self, environments};

/// Keeps the background file writer alive for the life of the process
static FILE_WRITER_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the console and JSON-file subscribers.
///
/// Safe to call more than once; only the first call has an effect. When the
/// log file cannot be opened, logs go to the console only. An already
/// installed global subscriber (an embedding process, a test harness) is
/// left in place.
pub fn init_structured_logging() {
    static INIT: OnceLock<()> = OnceLock::new();
    INIT.get_or_init(|| {
        let environment = ConfigManager::detect_environment();
        let level = get_log_level(&environment);

        let log_file = match open_log_file(Path::new(constants::DEFAULT_LOG_DIR), &environment) {
            Ok(log_file) => log_file,
            Err(reason) => {
                let _ = tracing_subscriber::registry()
                    .with(console_layer(&level))
                    .try_init();
                tracing::warn!(reason = %reason, "Log file unavailable - logging to console only");
                return;
            }
        };

        let (writer, guard) = tracing_appender::non_blocking(log_file.appender);
        let _ = FILE_WRITER_GUARD.set(guard);

        let installed = tracing_subscriber::registry()
            .with(console_layer(&level))
            .with(json_file_layer(writer, &level))
            .try_init()
            .is_ok();

        tracing::info!(
            environment = %environment,
            level = %level,
            log_file = %log_file.path.display(),
            subscriber_installed = installed,
            "Order service logging ready"
        );
    });
}

struct LogFile {
    path: PathBuf,
    appender: RollingFileAppender,
}

/// `<dir>/<env>.<pid>.<timestamp>.log`, one file per process run
fn open_log_file(dir: &Path, environment: &str) -> Result<LogFile, String> {
    let file_name = format!(
        "{environment}.{}.{}.log",
        process::id(),
        Utc::now().format("%Y%m%d_%H%M%S")
    );
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(&file_name)
        .build(dir)
        .map_err(|e| format!("{}: {e}", dir.display()))?;

    Ok(LogFile {
        path: dir.join(file_name),
        appender,
    })
}

fn console_layer<S>(level: &str) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_filter(env_filter(level))
}

fn json_file_layer<S>(writer: NonBlocking, level: &str) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .json()
        .with_current_span(true)
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(env_filter(level))
}

/// `RUST_LOG` wins over the environment default
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> String {
    match environment {
        environments::PRODUCTION => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log structured data for a batch flush
pub fn log_batch_operation(
    operation: &str,
    worker_id: &str,
    event_kind: &str,
    batch_size: usize,
    failed: usize,
    duration_ms: Option<u64>,
) {
    tracing::info!(
        operation = %operation,
        worker_id = %worker_id,
        event_kind = %event_kind,
        batch_size = batch_size,
        failed = failed,
        duration_ms = duration_ms,
        timestamp = %Utc::now().to_rfc3339(),
        "Batch operation complete"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "❌ Operation failed"
    );
}
