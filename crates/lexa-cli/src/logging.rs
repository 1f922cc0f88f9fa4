//! Tracing setup for the `lexa` binary.

use std::path::PathBuf;

use anyhow::{Context, Result};
use lexa_infrastructure::LexaPaths;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "warn";
const LOG_FILE_PREFIX: &str = "lexa.log";

/// Installs the global subscriber.
///
/// Logs always go to stderr so they never mix with command output. When
/// `log_dir` is given, a daily-rolling file is written as well; keep the
/// returned guard alive until exit or buffered lines are lost.
pub fn init(log_dir: Option<&Option<PathBuf>>) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let dir = match dir {
                Some(dir) => dir.clone(),
                None => LexaPaths::log_dir()?,
            };
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

            let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}
