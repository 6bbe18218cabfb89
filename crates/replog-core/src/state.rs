//! Serializable dumps of replica state

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::event::{Event, EventKind};
use crate::identity::ReplicaId;

/// One log line of a [`ReplicaState`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub kind: EventKind,
    pub key: String,
    pub origin: ReplicaId,
    pub origin_seq: u64,
}

impl From<&Event> for LogEntry {
    fn from(event: &Event) -> Self {
        Self {
            kind: event.kind(),
            key: event.key().to_owned(),
            origin: event.origin(),
            origin_seq: event.origin_seq(),
        }
    }
}

/// Point-in-time copy of a replica's log, time table and values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaState {
    pub id: ReplicaId,
    pub local_clock: u64,
    pub log: Vec<LogEntry>,
    pub time_table: Vec<Vec<u64>>,
    pub values: BTreeMap<String, i64>,
}
