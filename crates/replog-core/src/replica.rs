//! Replica state machine
//!
//! A replica owns an append-only event log, the counter values derived from
//! it, a local clock and its own time table. It changes state in exactly two
//! ways:
//!
//! - [`Replica::record_local`]: a locally originated operation
//! - [`Replica::apply_transmission`]: merging a message from another replica
//!
//! [`Replica::build_transmission`] only reads.
//!
//! ## Knowledge filtering
//!
//! When building a transmission for `dest`, the replica consults its *own*
//! time table row for `dest` as a proxy for what `dest` has seen. That row is
//! only as fresh as the last merge that carried `dest`'s knowledge here,
//! directly or through a third replica. If it is stale the diff over-ships,
//! and because receivers do not deduplicate, an event reaching a replica by
//! two paths is applied twice.

use tracing::{debug, trace};

use crate::error::{SystemError, SystemResult};
use crate::event::{Event, EventKind};
use crate::identity::ReplicaId;
use crate::state::{LogEntry, ReplicaState};
use crate::store::ValueStore;
use crate::time_table::TimeTable;
use crate::transmission::Transmission;

/// One replica of the counter store
#[derive(Debug, Clone)]
pub struct Replica {
    id: ReplicaId,
    local_clock: u64,
    log: Vec<Event>,
    store: ValueStore,
    time_table: TimeTable,
}

impl Replica {
    /// Fresh replica in a system of `replica_count` replicas.
    ///
    /// Fails if `id` is not in `1..=replica_count`.
    pub fn new(id: ReplicaId, replica_count: usize) -> SystemResult<Self> {
        if !id.is_valid_for(replica_count) {
            return Err(SystemError::ReplicaNotFound(id));
        }
        Ok(Self {
            id,
            local_clock: 0,
            log: Vec::new(),
            store: ValueStore::new(),
            time_table: TimeTable::new(replica_count),
        })
    }

    pub fn id(&self) -> ReplicaId {
        self.id
    }

    pub fn local_clock(&self) -> u64 {
        self.local_clock
    }

    /// Every event this replica has logged, in arrival order
    pub fn log(&self) -> &[Event] {
        &self.log
    }

    pub fn store(&self) -> &ValueStore {
        &self.store
    }

    pub fn time_table(&self) -> &TimeTable {
        &self.time_table
    }

    /// Execute a locally originated operation and return the event it created.
    pub fn record_local(&mut self, kind: EventKind, key: impl Into<String>) -> &Event {
        self.local_clock += 1;
        self.time_table.raise(self.id, self.id, self.local_clock);

        let event = Event::new(kind, key, self.id, self.local_clock);
        debug!(
            replica = %self.id,
            kind = %kind,
            key = event.key(),
            seq = self.local_clock,
            "Recorded local event"
        );
        self.append(event)
    }

    fn append(&mut self, event: Event) -> &Event {
        if !self.store.apply(&event) {
            trace!(
                replica = %self.id,
                stamp = %event.stamp(),
                key = event.key(),
                "Decrement of absent key had no effect"
            );
        }
        self.log.push(event);
        &self.log[self.log.len() - 1]
    }

    /// Current value of `key`, `None` if it was never incremented here
    pub fn query(&self, key: &str) -> Option<i64> {
        self.store.get(key)
    }

    /// Whether, according to this replica's time table, `observer` has
    /// already incorporated `event`
    pub fn has_knowledge_of(&self, observer: ReplicaId, event: &Event) -> bool {
        self.time_table.knows(observer, event.stamp())
    }

    /// Build a transmission for `destination` carrying every logged event the
    /// destination is not known to have, plus a copy of the time table.
    ///
    /// Does not assume the transmission will ever be delivered.
    pub fn build_transmission(&self, destination: ReplicaId) -> SystemResult<Transmission> {
        if !destination.is_valid_for(self.time_table.size()) {
            return Err(SystemError::ReplicaNotFound(destination));
        }

        let diff: Vec<Event> = self
            .log
            .iter()
            .filter(|event| {
                let known = self.has_knowledge_of(destination, event);
                trace!(
                    replica = %self.id,
                    destination = %destination,
                    stamp = %event.stamp(),
                    known,
                    "Filtering event"
                );
                !known
            })
            .cloned()
            .collect();

        debug!(
            replica = %self.id,
            destination = %destination,
            diff = diff.len(),
            log = self.log.len(),
            "Built transmission"
        );
        Ok(Transmission::new(
            self.id,
            destination,
            diff,
            self.time_table.clone(),
        ))
    }

    /// Merge a transmission addressed to this replica.
    ///
    /// Carried events are appended and applied in order with no duplicate
    /// detection, then the snapshot is merged into the time table. Nothing
    /// changes if the transmission is misaddressed or sized for another system.
    pub fn apply_transmission(&mut self, transmission: &Transmission) -> SystemResult<()> {
        if transmission.destination() != self.id {
            return Err(SystemError::Misaddressed {
                expected: transmission.destination(),
                actual: self.id,
            });
        }
        let snapshot = transmission.time_table();
        if snapshot.size() != self.time_table.size() {
            return Err(SystemError::DimensionMismatch {
                expected: self.time_table.size(),
                actual: snapshot.size(),
            });
        }

        for event in transmission.events() {
            self.append(event.clone());
        }
        self.time_table
            .merge_from(self.id, transmission.source(), snapshot)?;

        debug!(
            replica = %self.id,
            source = %transmission.source(),
            events = transmission.events().len(),
            "Applied transmission"
        );
        Ok(())
    }

    /// Owned copy of the log, time table and values
    pub fn snapshot(&self) -> ReplicaState {
        ReplicaState {
            id: self.id,
            local_clock: self.local_clock,
            log: self.log.iter().map(LogEntry::from).collect(),
            time_table: self.time_table.rows(),
            values: self.store.to_map(),
        }
    }
}
