//! Per-replica counter values derived from the event log

use std::collections::BTreeMap;

use crate::event::{Event, EventKind};

/// Counter values keyed by name
///
/// Values are derived incrementally: each event is applied exactly once, at
/// the moment it enters the owning replica's log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueStore {
    values: BTreeMap<String, i64>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an event's effect.
    ///
    /// A decrement of a key that was never incremented here is dropped
    /// entirely: the key stays absent. Delivery order therefore matters, and
    /// a decrement that overtakes its increment is lost for good. Returns
    /// whether the store changed.
    pub fn apply(&mut self, event: &Event) -> bool {
        match event.kind() {
            EventKind::Increment => {
                *self.values.entry(event.key().to_owned()).or_insert(0) += 1;
                true
            }
            EventKind::Decrement => match self.values.get_mut(event.key()) {
                Some(value) => {
                    *value -= 1;
                    true
                }
                None => false,
            },
        }
    }

    /// Current value of `key`, `None` if it was never incremented
    pub fn get(&self, key: &str) -> Option<i64> {
        self.values.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.values.iter().map(|(key, value)| (key.as_str(), *value))
    }

    pub fn to_map(&self) -> BTreeMap<String, i64> {
        self.values.clone()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
