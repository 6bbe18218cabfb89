//! Replica context injection for logging
//!
//! Thread-local storage for the replica a scope is acting on, so every span
//! opened in that scope can be tagged with it.

use std::cell::RefCell;

use replog_core::ReplicaId;
use uuid::Uuid;

/// Replica context data stored in thread-local storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaContextData {
    /// The replica being acted on
    pub replica_id: ReplicaId,
    /// Unique id of this logging session
    pub instance_id: Uuid,
}

thread_local! {
    static REPLICA_CONTEXT: RefCell<Option<ReplicaContextData>> = const { RefCell::new(None) };
}

/// RAII guard for replica context
///
/// Sets the replica context for the current thread on creation and restores
/// the previous one (if any) on drop.
///
/// ```ignore
/// let _guard = ReplicaContextGuard::new(ReplicaId::new(2));
/// tracing::info!("Applying command");
/// ```
pub struct ReplicaContextGuard {
    previous: Option<ReplicaContextData>,
}

impl ReplicaContextGuard {
    pub fn new(replica_id: ReplicaId) -> Self {
        Self::with_instance_id(replica_id, Uuid::new_v4())
    }

    /// Create a guard with a specific instance ID, e.g. one per CLI session
    pub fn with_instance_id(replica_id: ReplicaId, instance_id: Uuid) -> Self {
        let previous = REPLICA_CONTEXT.with(|ctx| {
            ctx.replace(Some(ReplicaContextData {
                replica_id,
                instance_id,
            }))
        });
        Self { previous }
    }

    /// Get the current replica context (if any)
    pub fn current() -> Option<ReplicaContextData> {
        REPLICA_CONTEXT.with(|ctx| ctx.borrow().clone())
    }

    /// Get the current replica ID (if set)
    pub fn current_replica_id() -> Option<ReplicaId> {
        Self::current().map(|ctx| ctx.replica_id)
    }
}

impl Drop for ReplicaContextGuard {
    fn drop(&mut self) {
        REPLICA_CONTEXT.with(|ctx| *ctx.borrow_mut() = self.previous.take());
    }
}
