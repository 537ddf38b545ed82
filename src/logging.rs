use std::path::Path;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::Result;

/// Environment variable holding a filter directive, e.g. `docnav=debug`.
pub const LOG_ENV: &str = "DOCNAV_LOG";

/// Build the filter: `DOCNAV_LOG` if set, otherwise the configured level.
pub fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Route tracing output to `log_file`. The terminal belongs to the UI, so
/// nothing is written to stdout. Keep the guard alive until exit.
pub fn init(log_file: &Path, default_level: &str) -> Result<WorkerGuard> {
    let dir = log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let file_name = log_file
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "docnav.log".into());

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .with(filter(default_level))
        .init();

    info!(file = %log_file.display(), "logging initialised");
    Ok(guard)
}
