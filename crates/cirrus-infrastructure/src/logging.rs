//! Tracing subscriber setup.

use std::path::Path;

use cirrus_core::error::{CirrusError, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_PREFIX: &str = "cirrus-desktop.log";
const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber: `RUST_LOG`-driven filter, stderr output,
/// and a daily rolling file under `logs_dir`.
///
/// The returned guard flushes the file writer on drop; keep it alive for the
/// lifetime of the process.
pub fn init_logging(logs_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)?;

    let file_appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()
        .map_err(|e| CirrusError::initialization(format!("Logging already initialized: {}", e)))?;

    tracing::info!("[Logging] Writing logs to {}", logs_dir.display());
    Ok(guard)
}
