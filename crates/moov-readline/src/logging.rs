use anyhow::{Context, Result};
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    Layer, filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Handle to keep the logging worker thread alive
pub struct LogGuard {
    _guard: WorkerGuard,
}

/// Sends all logs to a daily rolling file under `logs_dir`.
///
/// The terminal is left to the chat. `RUST_LOG` overrides the default
/// `info` level.
pub fn init(logs_dir: &Path) -> Result<LogGuard> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create log directory {:?}", logs_dir))?;

    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    let appender = tracing_appender::rolling::daily(logs_dir, "moov.log");
    let (non_blocking, worker_guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(filter);

    tracing_subscriber::registry().with(file_layer).init();

    tracing::info!("Logging to {:?}", logs_dir);
    Ok(LogGuard {
        _guard: worker_guard,
    })
}
