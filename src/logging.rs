//! File-based logging
//!
//! The TUI owns the terminal, so tracing output goes to a daily-rotating
//! file instead of stderr.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "podtui";

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "podtui=debug,warn";

/// Initialize the logging system.
///
/// Logs are written to `<dir>/podtui.YYYY-MM-DD` with daily rotation. The
/// returned guard flushes buffered lines when dropped, so keep it alive for
/// the lifetime of the program.
pub fn init_logging(dir: &Path) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    tracing::info!(dir = %dir.display(), "logging initialized");
    Ok(guard)
}
