//! Simulated network holding transmissions between send and delivery
//!
//! Sending and delivering are separate steps so a driver can lose
//! (never deliver, or [`Network::drop_transmission`]), duplicate
//! ([`Network::duplicate`]) or reorder (deliver out of id order) messages.
//! Contents are never altered in flight.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::error::{SystemError, SystemResult};
use crate::identity::TransmissionId;
use crate::transmission::Transmission;

/// In-memory store of pending transmissions keyed by id
///
/// Uses `DashMap` so senders and deliverers on different threads do not
/// contend on a single lock.
#[derive(Debug)]
pub struct Network {
    next_id: AtomicU64,
    pending: DashMap<TransmissionId, Transmission>,
}

impl Network {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            pending: DashMap::new(),
        }
    }

    fn allocate_id(&self) -> TransmissionId {
        TransmissionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Store a transmission under a fresh, strictly increasing id.
    pub fn enqueue(&self, transmission: Transmission) -> TransmissionId {
        let id = self.allocate_id();
        debug!(
            transmission = %id,
            source = %transmission.source(),
            destination = %transmission.destination(),
            events = transmission.events().len(),
            "Enqueued transmission"
        );
        self.pending.insert(id, transmission);
        id
    }

    /// Remove a pending transmission so it can be delivered.
    ///
    /// Each id can be taken once; afterwards it is `TransmissionNotFound`.
    pub fn take(&self, id: TransmissionId) -> SystemResult<Transmission> {
        self.pending
            .remove(&id)
            .map(|(_, transmission)| transmission)
            .ok_or_else(|| {
                warn!(transmission = %id, "Unknown or already consumed transmission");
                SystemError::TransmissionNotFound(id)
            })
    }

    /// Discard a pending transmission, simulating loss.
    pub fn drop_transmission(&self, id: TransmissionId) -> SystemResult<Transmission> {
        let dropped = self.take(id)?;
        debug!(transmission = %id, "Dropped transmission");
        Ok(dropped)
    }

    /// Re-enqueue an independent copy of a pending transmission under a new id.
    pub fn duplicate(&self, id: TransmissionId) -> SystemResult<TransmissionId> {
        let copy = self
            .peek(id)
            .ok_or(SystemError::TransmissionNotFound(id))?;
        let new_id = self.enqueue(copy);
        debug!(transmission = %id, copy = %new_id, "Duplicated transmission");
        Ok(new_id)
    }

    /// Copy of a pending transmission, if any
    pub fn peek(&self, id: TransmissionId) -> Option<Transmission> {
        self.pending.get(&id).map(|entry| entry.value().clone())
    }

    /// Pending ids in ascending order
    pub fn pending_ids(&self) -> Vec<TransmissionId> {
        let mut ids: Vec<_> = self.pending.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}
