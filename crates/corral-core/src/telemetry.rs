use uuid::Uuid;

use crate::identity::PoolIdentity;

/// Fire-and-forget hooks the pool invokes on lifecycle events.
///
/// Every method has a no-op default so listeners only override what
/// they care about. Hooks are called synchronously from pool threads
/// while no internal lock is held; implementations should return
/// quickly and must not call back into the pool.
#[allow(unused_variables)]
pub trait PoolListener: Send + Sync {
    fn pool_created(&self, pool: &PoolIdentity) {}

    fn pool_destroyed(&self, pool: &PoolIdentity) {}

    fn resource_created(&self, pool: &PoolIdentity, handle_id: Uuid) {}

    fn resource_destroyed(&self, pool: &PoolIdentity, handle_id: Uuid) {}

    fn resource_acquired(&self, pool: &PoolIdentity, handle_id: Uuid) {}

    fn resource_released(&self, pool: &PoolIdentity, handle_id: Uuid) {}

    fn resource_matched(&self, pool: &PoolIdentity, handle_id: Uuid) {}

    fn resource_not_matched(&self, pool: &PoolIdentity) {}

    fn acquire_timed_out(&self, pool: &PoolIdentity) {}

    fn request_queued(&self, pool: &PoolIdentity) {}

    fn request_dequeued(&self, pool: &PoolIdentity) {}

    fn leak_detected(&self, pool: &PoolIdentity, handle_id: Uuid) {}
}

/// Listener that discards every event. Useful as a default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl PoolListener for NoopListener {}
