//! A fixed set of replicas wired to a simulated network
//!
//! [`ReplicatedSystem`] is the driver-facing surface: local operations,
//! queries, sends, deliveries and state dumps, addressed by replica and
//! transmission id.
//!
//! Each replica sits behind its own mutex and every operation locks exactly
//! one replica, so operations on different replicas can run in parallel
//! while operations on the same replica serialize. The only thing that
//! crosses between replicas is an owned [`Transmission`].

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::error::{SystemError, SystemResult};
use crate::event::EventKind;
use crate::identity::{ReplicaId, TransmissionId};
use crate::network::Network;
use crate::replica::Replica;
use crate::state::ReplicaState;
use crate::transmission::Transmission;

/// Replicas `1..=N` plus the network between them
#[derive(Debug)]
pub struct ReplicatedSystem {
    replicas: Vec<Mutex<Replica>>,
    network: Network,
}

impl ReplicatedSystem {
    /// Create `replica_count` empty replicas with ids `1..=replica_count`.
    pub fn new(replica_count: usize) -> SystemResult<Self> {
        // Ids are u32 and each replica holds an N x N table of u64 cells
        let table_fits = replica_count
            .checked_mul(replica_count)
            .and_then(|cells| cells.checked_mul(size_of::<u64>()))
            .is_some_and(|bytes| bytes <= isize::MAX as usize);
        if replica_count == 0 || replica_count > u32::MAX as usize || !table_fits {
            return Err(SystemError::InvalidReplicaCount(replica_count));
        }
        let replicas = ReplicaId::range(replica_count)
            .map(|id| Replica::new(id, replica_count).map(Mutex::new))
            .collect::<SystemResult<Vec<_>>>()?;

        info!(replicas = replica_count, "Created replicated system");
        Ok(Self {
            replicas,
            network: Network::new(),
        })
    }

    pub fn replica_count(&self) -> usize {
        self.replicas.len()
    }

    pub fn replica_ids(&self) -> impl Iterator<Item = ReplicaId> {
        ReplicaId::range(self.replicas.len())
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    fn replica(&self, id: ReplicaId) -> SystemResult<&Mutex<Replica>> {
        id.index()
            .and_then(|index| self.replicas.get(index))
            .ok_or_else(|| {
                warn!(replica = %id, "Unknown replica");
                SystemError::ReplicaNotFound(id)
            })
    }

    /// Run `f` against a replica under its lock.
    pub fn inspect<T>(&self, id: ReplicaId, f: impl FnOnce(&Replica) -> T) -> SystemResult<T> {
        let replica = self.replica(id)?.lock();
        Ok(f(&replica))
    }

    /// Execute an increment or decrement originated at `id`.
    pub fn local_op(&self, id: ReplicaId, kind: EventKind, key: &str) -> SystemResult<()> {
        self.replica(id)?.lock().record_local(kind, key);
        Ok(())
    }

    /// Value of `key` at replica `id`, `None` when absent there
    pub fn query(&self, id: ReplicaId, key: &str) -> SystemResult<Option<i64>> {
        self.inspect(id, |replica| replica.query(key))
    }

    /// Build a transmission from `source` to `destination` and put it on the
    /// network. Nothing reaches `destination` until [`Self::deliver`].
    pub fn send(&self, source: ReplicaId, destination: ReplicaId) -> SystemResult<TransmissionId> {
        self.replica(destination)?;
        let transmission = self.replica(source)?.lock().build_transmission(destination)?;
        let id = self.network.enqueue(transmission);
        info!(
            transmission = %id,
            source = %source,
            destination = %destination,
            "Sent transmission"
        );
        Ok(id)
    }

    /// Hand a pending transmission to its destination.
    ///
    /// The transmission is consumed whether or not the merge succeeds.
    pub fn deliver(&self, id: TransmissionId) -> SystemResult<()> {
        let transmission = self.network.take(id)?;
        self.apply(&transmission)?;
        info!(
            transmission = %id,
            destination = %transmission.destination(),
            events = transmission.events().len(),
            "Delivered transmission"
        );
        Ok(())
    }

    fn apply(&self, transmission: &Transmission) -> SystemResult<()> {
        self.replica(transmission.destination())?
            .lock()
            .apply_transmission(transmission)
    }

    /// Lose a pending transmission.
    pub fn drop_transmission(&self, id: TransmissionId) -> SystemResult<()> {
        self.network.drop_transmission(id).map(|_| ())
    }

    /// Copy a pending transmission under a new id so it can be delivered twice.
    pub fn duplicate_transmission(&self, id: TransmissionId) -> SystemResult<TransmissionId> {
        self.network.duplicate(id)
    }

    /// Ids of transmissions sent but not yet delivered or dropped
    pub fn pending_transmissions(&self) -> Vec<TransmissionId> {
        self.network.pending_ids()
    }

    /// Log, time table and values of replica `id`
    pub fn dump_state(&self, id: ReplicaId) -> SystemResult<ReplicaState> {
        self.inspect(id, Replica::snapshot)
    }
}
