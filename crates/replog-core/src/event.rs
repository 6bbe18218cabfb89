//! Counter events and their causal origin stamps

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::identity::ReplicaId;

/// The operation an event performs on its key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Increment,
    Decrement,
}

impl EventKind {
    /// Lowercase name used in log listings
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Increment => "increment",
            EventKind::Decrement => "decrement",
        }
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `(origin replica, origin sequence)`: unique system-wide
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OriginStamp {
    pub replica: ReplicaId,
    pub seq: u64,
}

impl Display for OriginStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.replica, self.seq)
    }
}

/// A single counter operation stamped with where and when it was created
///
/// Events are immutable once built; replicas copy them between logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    kind: EventKind,
    key: String,
    origin: OriginStamp,
}

impl Event {
    pub fn new(kind: EventKind, key: impl Into<String>, origin: ReplicaId, seq: u64) -> Self {
        Self {
            kind,
            key: key.into(),
            origin: OriginStamp {
                replica: origin,
                seq,
            },
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn origin(&self) -> ReplicaId {
        self.origin.replica
    }

    pub fn origin_seq(&self) -> u64 {
        self.origin.seq
    }

    pub fn stamp(&self) -> OriginStamp {
        self.origin
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.key)
    }
}
