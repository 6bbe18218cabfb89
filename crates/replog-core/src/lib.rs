//! # Replog Core
//!
//! Optimistic replication of a counter store across a fixed set of
//! replicas, using a matrix clock ("time table") to decide which events a
//! peer still needs.
//!
//! ## Key Types
//!
//! - [`Event`]: an increment or decrement stamped with its origin replica and sequence
//! - [`TimeTable`]: N×N matrix of what each replica knows of every other replica's clock
//! - [`Replica`]: event log, derived values and time table of one replica
//! - [`Transmission`]: event diff plus time table snapshot from one replica to another
//! - [`Network`]: pending transmissions between send and delivery
//! - [`ReplicatedSystem`]: N replicas and their network behind one facade
//!
//! ## Example
//!
//! ```rust
//! use replog_core::{EventKind, ReplicaId, ReplicatedSystem};
//!
//! let system = ReplicatedSystem::new(3).unwrap();
//! let (a, b) = (ReplicaId::new(1), ReplicaId::new(2));
//!
//! system.local_op(a, EventKind::Increment, "X").unwrap();
//! assert_eq!(system.query(b, "X").unwrap(), None);
//!
//! let id = system.send(a, b).unwrap();
//! system.deliver(id).unwrap();
//! assert_eq!(system.query(b, "X").unwrap(), Some(1));
//! ```

pub mod error;
pub mod event;
pub mod identity;
pub mod network;
pub mod replica;
pub mod state;
pub mod store;
pub mod system;
pub mod time_table;
pub mod transmission;

pub use error::{SystemError, SystemResult};
pub use event::{Event, EventKind, OriginStamp};
pub use identity::{ReplicaId, TransmissionId};
pub use network::Network;
pub use replica::Replica;
pub use state::{LogEntry, ReplicaState};
pub use store::ValueStore;
pub use system::ReplicatedSystem;
pub use time_table::TimeTable;
pub use transmission::Transmission;
