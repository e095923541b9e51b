//! Error types for corral

use thiserror::Error;

use crate::identity::PoolIdentity;

/// Core error type for pooling operations
#[derive(Error, Debug)]
pub enum PoolingError {
    /// The pool is at capacity and waiting is disabled.
    #[error("pool capacity of {capacity} exceeded")]
    CapacityExceeded { capacity: usize },

    /// The pool is at capacity and no resource was freed within the
    /// configured wait timeout.
    #[error("no available resources and wait time {waited_ms} ms expired")]
    WaitTimeout { waited_ms: u64 },

    /// The allocator failed to produce a new physical resource. The
    /// capacity slot reserved for it has already been rolled back.
    #[error("resource creation failed: {0}")]
    CreationFailed(anyhow::Error),

    /// An acquire was issued against a pool identity that is not
    /// registered. This is a configuration error, not a capacity event.
    #[error("unknown pool: {0}")]
    UnknownPool(PoolIdentity),

    /// The operation requires an initialized pool, but the pool has not
    /// served a request yet.
    #[error("pool {0} is not initialized")]
    PoolNotInitialized(PoolIdentity),

    /// The pool was emptied or killed while the caller was waiting.
    #[error("pool shut down")]
    Shutdown,
}

impl PoolingError {
    /// Whether the caller can reasonably retry the failed operation.
    ///
    /// Capacity and timeout failures are transient by nature; everything
    /// else needs intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PoolingError::CapacityExceeded { .. } | PoolingError::WaitTimeout { .. }
        )
    }
}

/// Result type alias for pooling operations
pub type Result<T> = std::result::Result<T, PoolingError>;
