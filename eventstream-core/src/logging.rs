//! Logging infrastructure for eventstream
//!
//! Logs are written to `~/.local/state/eventstream/eventstream.log` following XDG standards.
//! Forwarder outcomes reach the log through a [`LogSink`]; [`TracingLogSink`]
//! is the production sink and emits under the `webscale_eventstream` target.

use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Structured log sink used by the forwarder
///
/// `context` is a JSON object carrying the entry's structured fields.
pub trait LogSink: Send + Sync {
    fn info(&self, message: &str, context: serde_json::Value);
    fn warning(&self, message: &str, context: serde_json::Value);
    fn error(&self, message: &str, context: serde_json::Value);
}

/// [`LogSink`] backed by `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn info(&self, message: &str, context: serde_json::Value) {
        tracing::info!(target: "webscale_eventstream", context = %context, "{}", message);
    }

    fn warning(&self, message: &str, context: serde_json::Value) {
        tracing::warn!(target: "webscale_eventstream", context = %context, "{}", message);
    }

    fn error(&self, message: &str, context: serde_json::Value) {
        tracing::error!(target: "webscale_eventstream", context = %context, "{}", message);
    }
}

/// Initialize the logging system
///
/// Sets up tracing with:
/// - File output to XDG state directory
/// - Daily rotation, keeping `max_files` files
/// - Configurable log level via config or RUST_LOG env var
/// - With `verbose`, a `debug` floor and a copy of every entry on stderr
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<LoggingGuard> {
    let log_dir = Config::state_dir();

    // Create log directory if it doesn't exist
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("eventstream.log")
        .max_log_files(config.max_files.max(1))
        .build(&log_dir)
        .map_err(|e| Error::Config(format!("failed to create log appender: {}", e)))?;

    // Non-blocking writer, flushed when the guard drops
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Build the filter from config or env var
    let level = if verbose { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let stderr_layer = verbose.then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("failed to install subscriber: {}", e)))?;

    tracing::info!(
        log_dir = %log_dir.display(),
        level = %level,
        "Logging initialized"
    );

    Ok(LoggingGuard { _guard: guard })
}

/// Initialize logging for tests (logs to stdout)
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .with_span_events(FmtSpan::CLOSE)
        .try_init();
}

/// Guard that keeps the logging system alive
///
/// When dropped, flushes any pending log writes.
pub struct LoggingGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Returns the log file path (rotated files carry a date suffix)
pub fn log_file_path() -> PathBuf {
    Config::log_path()
}
