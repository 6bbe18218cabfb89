//! Where replica logs go and how they are formatted

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Logging setup for a simulator run
///
/// Console output is for watching a session; file output keeps a JSONL
/// record of every replica operation for later inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is unset, e.g. `"warn"` or `"replog_core=trace"`
    pub default_level: String,

    pub console: ConsoleConfig,

    /// JSONL log file, off unless set
    pub file: Option<FileConfig>,

    /// Shape of JSONL records, shared by console and file output
    pub jsonl: JsonlConfig,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            console: ConsoleConfig::default(),
            file: None,
            jsonl: JsonlConfig::default(),
        }
    }
}

impl LogConfig {
    /// Debug-level console output with colors
    pub fn development() -> Self {
        Self {
            default_level: "debug".to_string(),
            console: ConsoleConfig {
                enabled: true,
                pretty: true,
                ansi: true,
            },
            ..Default::default()
        }
    }

    /// Silent console, JSONL written under `log_dir`; for long chaos runs
    pub fn production(log_dir: PathBuf) -> Self {
        Self {
            default_level: "info".to_string(),
            console: ConsoleConfig {
                enabled: false,
                pretty: false,
                ansi: false,
            },
            file: Some(FileConfig {
                directory: log_dir,
                ..FileConfig::default()
            }),
            jsonl: JsonlConfig::default(),
        }
    }

    /// Warnings only, no colors, so test output stays readable
    pub fn testing() -> Self {
        Self {
            default_level: "warn".to_string(),
            console: ConsoleConfig {
                enabled: true,
                pretty: true,
                ansi: false,
            },
            ..Default::default()
        }
    }
}

/// Console sink
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Write to stdout at all
    pub enabled: bool,
    /// Human-readable lines; `false` prints one JSON object per event
    pub pretty: bool,
    /// Color the level and target
    pub ansi: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pretty: true,
            ansi: true,
        }
    }
}

/// JSONL file sink
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    /// Created if missing
    pub directory: PathBuf,
    /// `{prefix}.log`, or the prefix of each rolled file
    pub prefix: String,
    pub rotation: RotationStrategy,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./logs"),
            prefix: "replog".to_string(),
            rotation: RotationStrategy::Never,
        }
    }
}

/// How often the log file starts over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RotationStrategy {
    /// New file each day
    Daily,
    /// New file each hour
    Hourly,
    /// One file, truncated at startup
    #[default]
    Never,
}

/// JSONL record shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonlConfig {
    /// Put fields such as `replica` and `transmission` at the top level
    pub flatten_events: bool,
    /// Attach the enclosing `command` spans to each record
    pub include_spans: bool,
    /// Record source file and line
    pub include_location: bool,
}

impl Default for JsonlConfig {
    fn default() -> Self {
        Self {
            flatten_events: true,
            include_spans: true,
            include_location: false,
        }
    }
}
