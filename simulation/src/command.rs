//! Text commands such as `Increment(1, "X")` or `SendLog(1,2)`
//!
//! Whitespace and quotes (straight or typographic) are ignored, the command
//! name is case-insensitive, and arguments are separated by `(`, `)` and `,`.

use std::str::FromStr;

use replog_core::{EventKind, ReplicaId, TransmissionId};

use crate::error::CommandError;

/// A parsed front-end command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Originate an increment or decrement at a replica
    Local {
        kind: EventKind,
        replica: ReplicaId,
        key: String,
    },
    GetValue {
        replica: ReplicaId,
        key: String,
    },
    PrintState {
        replica: ReplicaId,
    },
    SendLog {
        source: ReplicaId,
        destination: ReplicaId,
    },
    ReceiveLog {
        transmission: TransmissionId,
    },
    DropLog {
        transmission: TransmissionId,
    },
    DuplicateLog {
        transmission: TransmissionId,
    },
    Help,
}

const IGNORED: &[char] = &['"', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}'];

impl Command {
    /// Parse one command line.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let cleaned: String = line
            .chars()
            .filter(|c| !c.is_whitespace() && !IGNORED.contains(c))
            .collect();

        let mut parts: Vec<&str> = cleaned.split(['(', ')', ',']).collect();
        while parts.last().is_some_and(|part| part.is_empty()) {
            parts.pop();
        }

        let Some((name, args)) = parts.split_first() else {
            return Err(CommandError::Malformed("empty command".to_string()));
        };

        match name.to_ascii_lowercase().as_str() {
            "increment" => {
                let [replica, key] = arity::<2>("Increment", args)?;
                Ok(Command::Local {
                    kind: EventKind::Increment,
                    replica: replica_id(replica)?,
                    key: key.to_string(),
                })
            }
            "decrement" => {
                let [replica, key] = arity::<2>("Decrement", args)?;
                Ok(Command::Local {
                    kind: EventKind::Decrement,
                    replica: replica_id(replica)?,
                    key: key.to_string(),
                })
            }
            "getvalue" => {
                let [replica, key] = arity::<2>("GetValue", args)?;
                Ok(Command::GetValue {
                    replica: replica_id(replica)?,
                    key: key.to_string(),
                })
            }
            "printstate" => {
                let [replica] = arity::<1>("PrintState", args)?;
                Ok(Command::PrintState {
                    replica: replica_id(replica)?,
                })
            }
            "sendlog" => {
                let [source, destination] = arity::<2>("SendLog", args)?;
                Ok(Command::SendLog {
                    source: replica_id(source)?,
                    destination: replica_id(destination)?,
                })
            }
            "receivelog" => {
                let [transmission] = arity::<1>("ReceiveLog", args)?;
                Ok(Command::ReceiveLog {
                    transmission: transmission_id(transmission)?,
                })
            }
            "droplog" => {
                let [transmission] = arity::<1>("DropLog", args)?;
                Ok(Command::DropLog {
                    transmission: transmission_id(transmission)?,
                })
            }
            "duplicatelog" => {
                let [transmission] = arity::<1>("DuplicateLog", args)?;
                Ok(Command::DuplicateLog {
                    transmission: transmission_id(transmission)?,
                })
            }
            "help" => {
                arity::<0>("Help", args)?;
                Ok(Command::Help)
            }
            _ => Err(CommandError::UnknownCommand(name.to_string())),
        }
    }

    /// The replica this command acts on, if it names exactly one
    pub fn target_replica(&self) -> Option<ReplicaId> {
        match self {
            Command::Local { replica, .. }
            | Command::GetValue { replica, .. }
            | Command::PrintState { replica } => Some(*replica),
            Command::SendLog { source, .. } => Some(*source),
            _ => None,
        }
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::parse(s)
    }
}

fn arity<'a, const N: usize>(
    command: &'static str,
    args: &[&'a str],
) -> Result<[&'a str; N], CommandError> {
    <[&str; N]>::try_from(args).map_err(|_| CommandError::WrongArity {
        command,
        expected: N,
        actual: args.len(),
    })
}

fn replica_id(arg: &str) -> Result<ReplicaId, CommandError> {
    arg.parse::<u32>()
        .map(ReplicaId::new)
        .map_err(|_| CommandError::Malformed(format!("invalid replica id \"{arg}\"")))
}

fn transmission_id(arg: &str) -> Result<TransmissionId, CommandError> {
    arg.parse::<u64>()
        .map(TransmissionId::new)
        .map_err(|_| CommandError::Malformed(format!("invalid transmission id \"{arg}\"")))
}

/// Usage text for the `Help` command
pub fn help_text() -> &'static str {
    "-- Help --\n\
     The following commands are accepted:\n\
     Increment(replicaId, key) -- Increments the value stored at 'key' in replica 'replicaId'\n\
     Decrement(replicaId, key) -- Decrements the value stored at 'key' in replica 'replicaId'\n\
     GetValue(replicaId, key) -- Prints the value stored at 'key' in replica 'replicaId'\n\
     PrintState(replicaId) -- Prints the log and time table of replica 'replicaId'\n\
     SendLog(srcReplicaId, destReplicaId) -- Sends what 'srcReplicaId' believes 'destReplicaId' lacks; prints the transmission ID\n\
     ReceiveLog(transmissionId) -- Delivers the transmission with 'transmissionId'\n\
     DropLog(transmissionId) -- Loses the transmission with 'transmissionId'\n\
     DuplicateLog(transmissionId) -- Copies the transmission with 'transmissionId'; prints the new ID"
}
