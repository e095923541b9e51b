use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

use crate::spec::ResourceSpec;

/// The opaque physical resource being pooled.
///
/// The pool never inspects the resource beyond these hooks; everything
/// it tracks (busy/free, enlistment, age) lives on the handle wrapping
/// it. Implementations must be safe to share across threads because a
/// free resource can be claimed by any waiting thread.
pub trait PooledResource: Send + Sync + Debug + 'static {
    /// Downcast hook so callers can recover the concrete resource type.
    fn as_any(&self) -> &dyn Any;

    /// Whether the underlying physical resource is still usable.
    ///
    /// Called during validation sweeps; a `false` return gets the
    /// resource destroyed rather than handed out.
    fn is_valid(&self) -> bool {
        true
    }

    /// Release the underlying physical resource.
    ///
    /// Called exactly once, after the handle has left the pool. Must not
    /// panic; failures should be logged by the implementation.
    fn close(&self);
}

/// Factory and matcher for physical resources.
///
/// An allocator is bound to one pool at creation time and is the only
/// component that knows how to talk to the backing system.
pub trait ResourceAllocator: Send + Sync {
    /// Create a new physical resource satisfying `spec`.
    ///
    /// Failures are surfaced to the acquiring caller as
    /// `PoolingError::CreationFailed`; the pool rolls back the capacity
    /// slot it reserved for the attempt.
    fn create(&self, spec: &ResourceSpec) -> anyhow::Result<Arc<dyn PooledResource>>;

    /// Whether an existing free resource, created under `actual`, can
    /// serve a request for `wanted`.
    ///
    /// Only consulted when the pool has matching enabled. The default
    /// accepts everything, which is correct for homogeneous pools.
    fn matches(&self, actual: &ResourceSpec, wanted: &ResourceSpec) -> bool {
        let _ = (actual, wanted);
        true
    }

    /// Destroy a physical resource that is leaving the pool.
    ///
    /// The default delegates to `PooledResource::close`.
    fn destroy(&self, resource: &Arc<dyn PooledResource>) {
        resource.close();
    }
}
