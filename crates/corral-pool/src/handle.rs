//! Pooled resource handles and their busy/free state

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use uuid::Uuid;

use corral_core::{PooledResource, ResourceSpec, TransactionRef};

#[cfg(test)]
mod tests;

const FREE: u8 = 0;
const BUSY: u8 = 1;

/// Busy/free state of a pooled handle.
///
/// The two views are a single atomic byte, so `is_busy() == !is_free()`
/// holds at every instant. Exclusivity is enforced through `try_claim`:
/// several threads may race for the same free handle, but the CAS lets
/// exactly one of them win.
#[derive(Debug)]
pub struct ResourceState {
    busy: AtomicU8,
    last_used: Mutex<Instant>,
}

impl ResourceState {
    /// A fresh state, free and just touched.
    pub fn new() -> Self {
        Self {
            busy: AtomicU8::new(FREE),
            last_used: Mutex::new(Instant::now()),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire) == BUSY
    }

    pub fn is_free(&self) -> bool {
        !self.is_busy()
    }

    /// Unconditionally flip the state.
    pub fn set_busy(&self, busy: bool) {
        let v = if busy { BUSY } else { FREE };
        self.busy.store(v, Ordering::Release);
    }

    /// Attempt to take the handle for exclusive use.
    ///
    /// Returns true iff this caller moved the state from free to busy.
    /// A false return means another thread already holds it.
    pub fn try_claim(&self) -> bool {
        self.busy
            .compare_exchange(FREE, BUSY, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Record a use, resetting the idle clock.
    pub fn touch(&self) {
        *self.last_used.lock() = Instant::now();
    }

    /// How long the handle has sat since the last touch.
    pub fn idle_duration(&self) -> Duration {
        self.last_used.lock().elapsed()
    }
}

impl Default for ResourceState {
    fn default() -> Self {
        Self::new()
    }
}

/// A physical resource wrapped for pooling.
///
/// The handle carries everything the pool tracks about a resource: its
/// identity, busy/free state, a sticky error flag, and the transaction
/// it is currently enlisted in. Enlistment is independent of busy/free;
/// a handle released back to the pool can still be enlisted until its
/// transaction completes.
#[derive(Debug)]
pub struct ResourceHandle {
    id: Uuid,
    resource: Arc<dyn PooledResource>,
    spec: ResourceSpec,
    state: ResourceState,
    errored: AtomicBool,
    enlisted: Mutex<Option<Arc<dyn TransactionRef>>>,
}

impl ResourceHandle {
    pub fn new(resource: Arc<dyn PooledResource>, spec: ResourceSpec) -> Self {
        Self {
            id: Uuid::new_v4(),
            resource,
            spec,
            state: ResourceState::new(),
            errored: AtomicBool::new(false),
            enlisted: Mutex::new(None),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn resource(&self) -> &Arc<dyn PooledResource> {
        &self.resource
    }

    /// The spec the resource was created under, used for matching.
    pub fn spec(&self) -> &ResourceSpec {
        &self.spec
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub fn is_free(&self) -> bool {
        self.state.is_free()
    }

    pub fn set_busy(&self, busy: bool) {
        self.state.set_busy(busy);
    }

    pub fn try_claim(&self) -> bool {
        self.state.try_claim()
    }

    pub fn touch(&self) {
        self.state.touch();
    }

    pub fn idle_duration(&self) -> Duration {
        self.state.idle_duration()
    }

    /// Mark the handle as damaged.
    ///
    /// Sticky: once set the handle is never matched again and is
    /// destroyed when it next returns to the pool.
    pub fn mark_error(&self) {
        self.errored.store(true, Ordering::Release);
    }

    pub fn has_error(&self) -> bool {
        self.errored.load(Ordering::Acquire)
    }

    /// Associate the handle with a unit of work and notify it.
    pub fn enlist(&self, tx: Arc<dyn TransactionRef>) {
        tx.enlist(self.id);
        *self.enlisted.lock() = Some(tx);
    }

    /// Drop the transaction association, notifying the transaction.
    ///
    /// No-op when the handle is not enlisted.
    pub fn delist(&self) {
        if let Some(tx) = self.enlisted.lock().take() {
            tx.delist(self.id);
        }
    }

    /// Clear the association without a delist notification.
    ///
    /// Used at transaction completion, where the coordinator already
    /// knows the outcome.
    pub fn clear_enlistment(&self) {
        *self.enlisted.lock() = None;
    }

    pub fn is_enlisted(&self) -> bool {
        self.enlisted.lock().is_some()
    }

    /// Whether the handle is enlisted in the given unit of work.
    pub fn enlisted_in(&self, tx_id: Uuid) -> bool {
        self.enlisted
            .lock()
            .as_ref()
            .is_some_and(|tx| tx.id() == tx_id)
    }
}

impl PartialEq for ResourceHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ResourceHandle {}

impl std::hash::Hash for ResourceHandle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
