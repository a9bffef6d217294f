//! File-only `tracing` setup. The TUI owns the terminal, so nothing is
//! ever written to stdout/stderr; `RUST_LOG` controls the level
//! (default `info`).

use anyhow::{anyhow, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Keeps the non-blocking writer alive. Dropping it flushes pending
/// entries and closes the log file.
pub struct LoggingGuard {
    _guard: WorkerGuard,
}

/// Write daily-rotated logs to `{data_dir}/dues/logs/dues.log.YYYY-MM-DD`.
pub fn init() -> Result<LoggingGuard> {
    let logs_dir = dirs::data_dir()
        .ok_or_else(|| anyhow!("Could not determine data directory"))?
        .join("dues")
        .join("logs");

    std::fs::create_dir_all(&logs_dir)
        .map_err(|e| anyhow!("failed to create logs directory {}: {e}", logs_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(logs_dir, "dues.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    Ok(LoggingGuard { _guard: guard })
}
