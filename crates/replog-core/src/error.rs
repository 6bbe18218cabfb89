//! Error types for the replicated log

use thiserror::Error;

use crate::identity::{ReplicaId, TransmissionId};

/// Errors raised by the replica system and its network
///
/// Every variant is recoverable: the operation that produced it had no
/// effect on any replica and the system keeps running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SystemError {
    #[error("A system needs at least one replica, got {0}")]
    InvalidReplicaCount(usize),

    #[error("Replica with ID \"{0}\" does not exist")]
    ReplicaNotFound(ReplicaId),

    #[error("Transmission with ID \"{0}\" does not exist")]
    TransmissionNotFound(TransmissionId),

    #[error("Transmission addressed to replica {expected} was handed to replica {actual}")]
    Misaddressed {
        expected: ReplicaId,
        actual: ReplicaId,
    },

    #[error("Time table dimension mismatch: expected {expected}x{expected}, got {actual}x{actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Codec error: {0}")]
    Codec(String),
}

/// Result alias used throughout the core crate
pub type SystemResult<T> = Result<T, SystemError>;
