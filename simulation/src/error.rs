//! Front-end and configuration errors

use std::io;

use replog_core::SystemError;
use thiserror::Error;

/// Errors from parsing or executing a text command
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Malformed command: {0}")]
    Malformed(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Incorrect arguments for {command}: expected {expected}, got {actual}")]
    WrongArity {
        command: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    System(#[from] SystemError),
}

/// Errors from loading or validating a [`SimConfig`](crate::config::SimConfig)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Errors from a chaos run
#[derive(Debug, Error)]
pub enum ChaosError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    System(#[from] SystemError),
}
