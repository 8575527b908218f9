use anyhow::Result;
use chrono::Local;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing: stdout always, plus a timestamped file
/// (`promo-YYYY-MM-DD-HH-MM-SS.log`) when `log_dir` is given.
///
/// The returned guard flushes the file writer on drop; keep it alive for the
/// lifetime of the program.
pub fn init_logging(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    // Set up filter (default to INFO, can be overridden with RUST_LOG env var)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stdout_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let (file_layer, guard) = match log_dir {
        Some(logs_dir) => {
            std::fs::create_dir_all(logs_dir)?;

            let timestamp = Local::now().format("%Y-%m-%d-%H-%M-%S");
            let log_filename = format!("promo-{}.log", timestamp);

            let file_appender = tracing_appender::rolling::never(logs_dir, &log_filename);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false) // No ANSI codes in log file
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true);

            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()?;

    if let Some(logs_dir) = log_dir {
        tracing::info!(log_dir = %logs_dir.display(), "File logging enabled");
    }

    Ok(guard)
}
