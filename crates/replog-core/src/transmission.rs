//! Anti-entropy messages between replicas
//!
//! A [`Transmission`] is an owned snapshot: the events the source believes
//! the destination lacks, plus a copy of the source's whole time table at the
//! instant it was built. Nothing in it aliases the source's live state.

use serde::{Deserialize, Serialize};

use crate::error::{SystemError, SystemResult};
use crate::event::Event;
use crate::identity::ReplicaId;
use crate::time_table::TimeTable;

/// Event diff plus time table snapshot, addressed from one replica to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transmission {
    source: ReplicaId,
    destination: ReplicaId,
    events: Vec<Event>,
    time_table: TimeTable,
}

impl Transmission {
    pub(crate) fn new(
        source: ReplicaId,
        destination: ReplicaId,
        events: Vec<Event>,
        time_table: TimeTable,
    ) -> Self {
        Self {
            source,
            destination,
            events,
            time_table,
        }
    }

    pub fn source(&self) -> ReplicaId {
        self.source
    }

    pub fn destination(&self) -> ReplicaId {
        self.destination
    }

    /// The events carried, in the source's log order
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// The source's time table at build time
    pub fn time_table(&self) -> &TimeTable {
        &self.time_table
    }

    /// Whether the diff is empty (the snapshot is still worth merging)
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Serialize to the postcard wire format.
    pub fn encode(&self) -> SystemResult<Vec<u8>> {
        postcard::to_allocvec(self).map_err(|e| SystemError::Codec(e.to_string()))
    }

    /// Deserialize bytes produced by [`Self::encode`].
    pub fn decode(bytes: &[u8]) -> SystemResult<Self> {
        postcard::from_bytes(bytes).map_err(|e| SystemError::Codec(e.to_string()))
    }
}
