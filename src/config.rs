//! Environment-driven configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;
use crate::service::event_feed_service::DEFAULT_POLL_INTERVAL;

#[derive(Clone, Debug)]
pub struct Config {
    /// Time between timer-driven scrape cycles (`POLL_INTERVAL`, seconds).
    pub poll_interval: Duration,
    /// Directory for rolling log files (`LOGS_PATH`).
    pub logs_path: PathBuf,
}

impl Config {
    pub fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            logs_path: PathBuf::from("logs"),
        }
    }

    /// Overrides the defaults with whatever is set in the environment.
    pub fn load(&mut self) -> Result<(), AppError> {
        if let Ok(value) = std::env::var("POLL_INTERVAL") {
            let secs = value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| AppError::ConfigurationError {
                    msg: format!(
                        "POLL_INTERVAL must be a positive number of seconds, got \"{value}\""
                    ),
                })?;
            self.poll_interval = Duration::from_secs(secs);
        }

        if let Ok(value) = std::env::var("LOGS_PATH") {
            if value.trim().is_empty() {
                return Err(AppError::MissingConfig {
                    key: "LOGS_PATH".to_string(),
                });
            }
            self.logs_path = PathBuf::from(value);
        }

        Ok(())
    }
}
