//! Replica and transmission identities
//!
//! Replica ids are 1-based (`1..=N`) and map onto zero-based time table
//! indices. Transmission ids are handed out by the [`Network`](crate::Network)
//! starting at 1.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Identity of a replica, `1..=N`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReplicaId(pub u32);

impl ReplicaId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// All replica ids of a system with `count` replicas, capped at `u32::MAX`
    pub fn range(count: usize) -> impl Iterator<Item = ReplicaId> {
        let last = u32::try_from(count).unwrap_or(u32::MAX);
        (1..=last).map(ReplicaId)
    }

    /// Zero-based index into a time table, `None` for the invalid id 0
    pub fn index(self) -> Option<usize> {
        (self.0 as usize).checked_sub(1)
    }

    /// Whether this id names a replica in a system of `count` replicas
    pub fn is_valid_for(self, count: usize) -> bool {
        self.0 >= 1 && (self.0 as usize) <= count
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Display for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ReplicaId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Identity of a transmission held by the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransmissionId(pub u64);

impl TransmissionId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl Display for TransmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TransmissionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}
