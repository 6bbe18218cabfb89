//! Structured logging for the replicated log
//!
//! Installs a `tracing` subscriber with console output (human-readable or
//! JSONL), optional JSONL file output, and replica context tagging.
//!
//! # Quick Start
//!
//! ```ignore
//! use replog_logging::{LogConfig, ReplogSubscriberBuilder};
//!
//! // Pretty console output at info level
//! let _guard = ReplogSubscriberBuilder::new().init();
//!
//! // Verbose development output
//! let _guard = ReplogSubscriberBuilder::new()
//!     .with_config(LogConfig::development())
//!     .init();
//! ```
//!
//! # Replica Context
//!
//! Use [`ReplicaContextGuard`] to tag every span opened in a scope with the
//! replica being acted on:
//!
//! ```ignore
//! let _guard = ReplicaContextGuard::new(ReplicaId::new(2));
//! let _span = tracing::info_span!("command").entered();
//! ```

pub mod config;
pub mod context;
pub mod layers;

pub use config::{ConsoleConfig, FileConfig, JsonlConfig, LogConfig, RotationStrategy};
pub use context::{ReplicaContextData, ReplicaContextGuard};
pub use layers::{ReplicaContextExtension, ReplicaContextLayer};

use std::fs::{self, File};
use std::io;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Builder for configuring and initializing the logging subscriber
pub struct ReplogSubscriberBuilder {
    config: LogConfig,
}

impl ReplogSubscriberBuilder {
    /// Create a new subscriber builder with default configuration
    pub fn new() -> Self {
        Self {
            config: LogConfig::default(),
        }
    }

    /// Use a specific configuration
    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the default log level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config.default_level = level.into();
        self
    }

    /// Enable or disable console output
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.config.console.enabled = enabled;
        self
    }

    /// Configure file output
    pub fn with_file_output(mut self, config: FileConfig) -> Self {
        self.config.file = Some(config);
        self
    }

    /// Initialize the subscriber globally
    ///
    /// Returns the file writer guard, which must be kept alive for the
    /// duration of the program when file output is enabled.
    ///
    /// # Panics
    ///
    /// Panics if a global subscriber has already been set or the log file
    /// cannot be created. Use [`Self::try_init`] to handle both.
    pub fn init(self) -> Option<WorkerGuard> {
        match self.try_init() {
            Ok(guard) => guard,
            Err(e) => panic!("failed to initialize logging: {e}"),
        }
    }

    /// Try to initialize the subscriber globally
    pub fn try_init(self) -> Result<Option<WorkerGuard>, InitError> {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.config.default_level));

        let registry = Registry::default()
            .with(env_filter)
            .with(ReplicaContextLayer::new());

        let console = &self.config.console;
        let jsonl = &self.config.jsonl;

        let (writer, guard) = match &self.config.file {
            Some(file_config) => {
                let (writer, guard) = file_writer(file_config)?;
                (Some(writer), Some(guard))
            }
            None => (None, None),
        };

        // Separate arms for pretty vs JSONL console to satisfy the type system
        let result = match (console.enabled, console.pretty) {
            (true, true) => {
                let console_layer = tracing_subscriber::fmt::layer()
                    .with_ansi(console.ansi)
                    .with_target(true);
                let file_layer = writer.map(|w| layers::jsonl_layer(w, jsonl));
                registry.with(console_layer).with(file_layer).try_init()
            }
            (true, false) => {
                let console_layer = tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(jsonl.include_spans)
                    .flatten_event(jsonl.flatten_events)
                    .with_file(jsonl.include_location)
                    .with_line_number(jsonl.include_location);
                let file_layer = writer.map(|w| layers::jsonl_layer(w, jsonl));
                registry.with(console_layer).with(file_layer).try_init()
            }
            (false, _) => {
                let file_layer = writer.map(|w| layers::jsonl_layer(w, jsonl));
                registry.with(file_layer).try_init()
            }
        };

        result.map_err(|e| InitError::AlreadySet(e.to_string()))?;
        Ok(guard)
    }
}

impl Default for ReplogSubscriberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors from installing the global subscriber
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// A global subscriber is already installed
    #[error("global subscriber already set: {0}")]
    AlreadySet(String),
    /// The log file or directory could not be created
    #[error("log file: {0}")]
    Io(#[from] io::Error),
}

/// Create the file writer; `Never` truncates a single file, the others roll.
fn file_writer(config: &FileConfig) -> io::Result<(NonBlocking, WorkerGuard)> {
    fs::create_dir_all(&config.directory)?;
    let writer = match config.rotation {
        RotationStrategy::Never => {
            let path = config.directory.join(format!("{}.log", config.prefix));
            tracing_appender::non_blocking(File::create(path)?)
        }
        RotationStrategy::Daily => {
            tracing_appender::non_blocking(rolling(config, Rotation::DAILY)?)
        }
        RotationStrategy::Hourly => {
            tracing_appender::non_blocking(rolling(config, Rotation::HOURLY)?)
        }
    };
    Ok(writer)
}

fn rolling(config: &FileConfig, rotation: Rotation) -> io::Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(&config.prefix)
        .build(&config.directory)
        .map_err(io::Error::other)
}

/// Initialize logging with default settings
pub fn init_default() -> Option<WorkerGuard> {
    ReplogSubscriberBuilder::new().init()
}

/// Initialize logging for development (verbose, pretty console output)
pub fn init_development() -> Option<WorkerGuard> {
    ReplogSubscriberBuilder::new()
        .with_config(LogConfig::development())
        .init()
}

/// Initialize logging for testing (minimal output, ignores double init)
pub fn init_testing() {
    let _ = ReplogSubscriberBuilder::new()
        .with_config(LogConfig::testing())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_creation() {
        let builder = ReplogSubscriberBuilder::new();
        assert_eq!(builder.config.default_level, "info");
        assert!(builder.config.console.pretty);
    }

    #[test]
    fn test_builder_with_config() {
        let builder = ReplogSubscriberBuilder::new().with_config(LogConfig::testing());
        assert_eq!(builder.config.default_level, "warn");
    }

    #[test]
    fn test_builder_with_level() {
        let builder = ReplogSubscriberBuilder::new().with_level("trace");
        assert_eq!(builder.config.default_level, "trace");
    }

    #[test]
    fn test_builder_with_console() {
        let builder = ReplogSubscriberBuilder::new().with_console(false);
        assert!(!builder.config.console.enabled);
    }

    #[test]
    fn test_file_writer_creates_single_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = FileConfig {
            directory: dir.path().join("nested").join("logs"),
            ..Default::default()
        };

        let (_writer, guard) = file_writer(&config).unwrap();
        drop(guard);

        assert!(config.directory.join("replog.log").is_file());
    }

    #[test]
    fn test_file_writer_rolling_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        for rotation in [RotationStrategy::Daily, RotationStrategy::Hourly] {
            let config = FileConfig {
                directory: dir.path().join(format!("{rotation:?}")),
                prefix: "rolling".to_string(),
                rotation,
            };
            let (_writer, _guard) = file_writer(&config).unwrap();
            assert!(config.directory.is_dir());
        }
    }

    #[test]
    fn test_file_writer_rejects_file_as_directory() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = FileConfig {
            directory: file.path().to_path_buf(),
            ..Default::default()
        };

        assert!(file_writer(&config).is_err());
    }

    #[test]
    fn test_io_error_converts_to_init_error() {
        let err: InitError = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, InitError::Io(_)));
        assert_eq!(err.to_string(), "log file: denied");
    }

    #[test]
    fn test_init_testing_twice_is_harmless() {
        init_testing();
        init_testing();
    }
}
