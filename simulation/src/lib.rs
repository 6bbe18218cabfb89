//! # Replicated Log Simulation
//!
//! A text-command front end and scenario runner for the replicated counter
//! store in `replog-core`.
//!
//! ## Overview
//!
//! - **Commands** (`command.rs`): Parsing lines such as `Increment(1, "X")`
//! - **Session** (`session.rs`): Executing commands and producing console output
//! - **Format** (`format.rs`): The `PrintState` layout
//! - **Config** (`config.rs`): Settings for randomized fault-injection runs
//! - **Scenarios** (`scenarios.rs`): Scripted walkthroughs and chaos runs
//!
//! ## Example
//!
//! ```rust,ignore
//! use replog_simulation::Session;
//!
//! let session = Session::new(3)?;
//! session.execute_line("Increment(1, \"X\")")?;
//! assert_eq!(
//!     session.execute_line("SendLog(1, 2)")?.as_deref(),
//!     Some("Transmission number: 1")
//! );
//! session.execute_line("ReceiveLog(1)")?;
//! assert_eq!(session.execute_line("GetValue(2, X)")?.as_deref(), Some("1"));
//! ```
//!
//! ## Console Protocol
//!
//! 1. **Local operations** are applied at once and print nothing
//! 2. **SendLog** queues a transmission and prints its number
//! 3. **ReceiveLog** delivers a queued transmission, consuming it
//! 4. **DropLog** and **DuplicateLog** inject loss and duplication

pub mod command;
pub mod config;
pub mod error;
pub mod format;
pub mod scenarios;
pub mod session;

// Re-export main types
pub use command::{Command, help_text};
pub use config::SimConfig;
pub use error::{ChaosError, CommandError, ConfigError};
pub use format::{format_state, format_value};
pub use scenarios::{
    ChaosReport, print_chaos_report, run_canonical_scenario, run_chaos,
    run_duplicate_hazard_scenario, run_relay_scenario,
};
pub use session::Session;
