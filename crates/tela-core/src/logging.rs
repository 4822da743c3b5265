//! File-backed logging.
//!
//! The TUI owns the terminal, so log lines go to `{TELA_HOME}/logs/tela.log`
//! instead of stderr. Filtering comes from `TELA_LOG` (default "info").

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the tracing filter directive.
pub const LOG_ENV_VAR: &str = "TELA_LOG";

const LOG_FILE_NAME: &str = "tela.log";

/// Initializes file logging and returns the flush guard.
///
/// The guard must outlive all logging; dropping it stops the background
/// writer, so callers keep it for the process duration.
pub fn init() -> Result<WorkerGuard> {
    let logs_dir = crate::config::paths::logs_dir();
    std::fs::create_dir_all(&logs_dir)
        .with_context(|| format!("Failed to create log directory {}", logs_dir.display()))?;

    let appender = tracing_appender::rolling::never(&logs_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}
