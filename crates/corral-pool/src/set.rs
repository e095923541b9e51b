//! The container holding a pool's handles

use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use corral_core::{ResourceAllocator, ResourceSpec};

use crate::handle::ResourceHandle;

#[cfg(test)]
mod tests;

/// Insertion-ordered collection of a pool's handles.
///
/// Matching walks the set in insertion order, so the oldest free handle
/// wins a tie and the newest ones accumulate idle time for the resizer
/// to collect. Lookups take the shared lock; membership changes take
/// the exclusive lock. Claiming happens under the shared lock because
/// the busy/free CAS on the handle already serializes competitors.
#[derive(Debug, Default)]
pub struct ResourceSet {
    handles: RwLock<Vec<Arc<ResourceHandle>>>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, handle: Arc<ResourceHandle>) {
        self.handles.write().push(handle);
    }

    /// Remove a handle by id, returning it if present.
    pub fn remove(&self, id: Uuid) -> Option<Arc<ResourceHandle>> {
        let mut handles = self.handles.write();
        let pos = handles.iter().position(|h| h.id() == id)?;
        Some(handles.remove(pos))
    }

    pub fn len(&self) -> usize {
        self.handles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.read().is_empty()
    }

    pub fn free_count(&self) -> usize {
        self.handles.read().iter().filter(|h| h.is_free()).count()
    }

    pub fn busy_count(&self) -> usize {
        self.handles.read().iter().filter(|h| h.is_busy()).count()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.handles.read().iter().any(|h| h.id() == id)
    }

    /// Copy of the current membership, in insertion order.
    pub fn snapshot(&self) -> Vec<Arc<ResourceHandle>> {
        self.handles.read().clone()
    }

    /// Remove every handle regardless of state.
    pub fn drain(&self) -> Vec<Arc<ResourceHandle>> {
        std::mem::take(&mut *self.handles.write())
    }

    /// Whether a free, unerrored handle exists that the allocator
    /// would accept, without claiming it.
    pub fn has_free_match(
        &self,
        wanted: &ResourceSpec,
        allocator: &dyn ResourceAllocator,
        matching: bool,
    ) -> bool {
        let handles = self.handles.read();
        handles.iter().any(|h| {
            h.is_free() && !h.has_error() && (!matching || allocator.matches(h.spec(), wanted))
        })
    }

    /// Claim the first free, unerrored handle the allocator accepts.
    ///
    /// When `matching` is false every free handle is acceptable. The
    /// claim itself is a CAS on the handle, so two concurrent calls can
    /// never return the same handle.
    pub fn claim_free_match(
        &self,
        wanted: &ResourceSpec,
        allocator: &dyn ResourceAllocator,
        matching: bool,
    ) -> Option<Arc<ResourceHandle>> {
        let handles = self.handles.read();
        for handle in handles.iter() {
            if handle.is_busy() || handle.has_error() {
                continue;
            }
            if matching && !allocator.matches(handle.spec(), wanted) {
                continue;
            }
            if handle.try_claim() {
                return Some(handle.clone());
            }
        }
        None
    }
}
