use std::fs;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Settings;

/// Initialize tracing into the log file.
///
/// The terminal is owned by the TUI, so nothing is written to stdout or
/// stderr. `RUST_LOG` wins over `logging.level`. Returns `None` when no log
/// location can be determined; the guard must be kept alive until exit so
/// buffered lines are flushed.
///
/// # Errors
/// Returns error if the log directory cannot be created or a global
/// subscriber is already installed.
pub fn init(settings: &Settings) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let Some(path) = settings.log_path() else {
        return Ok(None);
    };

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "spindle.log".into());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_thread_names(true)
                .with_writer(non_blocking),
        )
        .try_init()?;

    Ok(Some(guard))
}
