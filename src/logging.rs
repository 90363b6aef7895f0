//! Logging Module
//!
//! Tracing setup: console output always, plus a JSON file log when debug
//! mode is on. The env filter honors RUST_LOG over the configured level.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    debug_mode: bool,
    log_dir: PathBuf,
    level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self {
            debug_mode: false,
            log_dir: PathBuf::from(".crabvoice").join("logs"),
            level: "info".to_string(),
        }
    }

    /// Enable debug mode: debug-level filter plus a file log.
    pub fn with_debug_mode(mut self, debug: bool) -> Self {
        self.debug_mode = debug;
        self
    }

    /// Override the log directory used in debug mode.
    pub fn with_log_dir(mut self, dir: PathBuf) -> Self {
        self.log_dir = dir;
        self
    }

    /// Override the base log level.
    pub fn with_level(mut self, level: String) -> Self {
        self.level = level;
        self
    }
}

/// Initialize the global tracing subscriber. Returns the file-writer guard
/// when debug mode is on; hold it for the process lifetime.
pub fn init_logging(config: LogConfig) -> Result<Option<WorkerGuard>> {
    let default_level = if config.debug_mode { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    if config.debug_mode {
        std::fs::create_dir_all(&config.log_dir)
            .with_context(|| format!("Failed to create log directory: {:?}", config.log_dir))?;

        let file_appender = tracing_appender::rolling::daily(&config.log_dir, "crabvoice.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .with(fmt::layer().json().with_ansi(false).with_writer(non_blocking))
            .init();

        Ok(Some(guard))
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_defaults() {
        let config = LogConfig::new();
        assert!(!config.debug_mode);
        assert_eq!(config.level, "info");
        assert!(config.log_dir.ends_with("logs"));
    }

    #[test]
    fn test_log_config_builders() {
        let config = LogConfig::new()
            .with_debug_mode(true)
            .with_level("trace".to_string())
            .with_log_dir(PathBuf::from("/tmp/logs"));
        assert!(config.debug_mode);
        assert_eq!(config.level, "trace");
        assert_eq!(config.log_dir, PathBuf::from("/tmp/logs"));
    }
}
