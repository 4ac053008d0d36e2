//! Logging setup and configuration.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::Config;
use crate::error::AppError;

/// Sets up logging with both console and a daily rolling file under
/// `config.logs_path`.
///
/// The returned guard flushes the file writer when dropped; keep it alive
/// for as long as the process logs.
pub fn setup_logging(config: &Config) -> Result<WorkerGuard, AppError> {
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("masjid-feed")
        .filename_suffix("log")
        .max_log_files(7)
        .build(&config.logs_path)
        .map_err(|e| AppError::ConfigurationError {
            msg: format!(
                "Failed to initialize rolling file appender at '{}': {}",
                config.logs_path.to_string_lossy(),
                e
            ),
        })?;

    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("masjid_feed=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stdout).with_ansi(true))
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .try_init()
        .map_err(|e| AppError::ConfigurationError {
            msg: format!("Failed to install global logger: {e}"),
        })?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_logging_creates_log_dir_and_installs_once() {
        let mut config = Config::new();
        config.logs_path =
            std::env::temp_dir().join(format!("masjid-feed-logs-{}", std::process::id()));

        let guard = setup_logging(&config).expect("Failed to set up logging");
        assert!(config.logs_path.is_dir());

        let second = setup_logging(&config);
        assert!(matches!(second, Err(AppError::ConfigurationError { .. })));

        drop(guard);
        let _ = std::fs::remove_dir_all(&config.logs_path);
    }
}
