//! Logging configuration module
//!
//! Console output always goes to stderr so that rendered manifests on stdout
//! can be piped straight into other tools. An optional JSON log file is
//! written through a non-blocking rolling appender.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "libra-storage.log";

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) when RUST_LOG is unset
    pub level: String,
    /// Emit console logs as JSON
    pub json_format: bool,
    /// Directory for JSON log files; no file logging when unset
    pub log_dir: Option<PathBuf>,
    pub rotation: LogRotation,
}

/// Log rotation policy
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Hourly,
    Daily,
    Never,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            log_dir: None,
            rotation: LogRotation::Daily,
        }
    }
}

impl LoggingConfig {
    /// Install the global subscriber.
    ///
    /// The returned guard flushes the file appender on drop and must be held
    /// until the process exits.
    pub fn init(&self) -> anyhow::Result<Option<WorkerGuard>> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        let console_layer = if self.json_format {
            fmt::layer()
                .json()
                .with_target(true)
                .with_writer(io::stderr)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(true)
                .with_writer(io::stderr)
                .boxed()
        };

        let (file_layer, guard) = match &self.log_dir {
            Some(dir) => {
                let appender = match self.rotation {
                    LogRotation::Hourly => rolling::hourly(dir, LOG_FILE_PREFIX),
                    LogRotation::Daily => rolling::daily(dir, LOG_FILE_PREFIX),
                    LogRotation::Never => rolling::never(dir, LOG_FILE_PREFIX),
                };
                let (writer, guard) = non_blocking(appender);

                let layer = fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .json()
                    .with_writer(writer);

                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .try_init()?;

        tracing::debug!(level = %self.level, file = self.log_dir.is_some(), "Logging initialized");

        Ok(guard)
    }
}
