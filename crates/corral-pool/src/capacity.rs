//! Capacity accounting for a pool

use std::sync::atomic::{AtomicUsize, Ordering};

use corral_core::{PoolingError, Result};

#[cfg(test)]
mod tests;

/// Guards the number of live resources in a pool.
///
/// The count only moves through `try_increment` and `decrement`, so it
/// can never exceed the fixed capacity no matter how many threads race
/// for the last slot. Callers reserve a slot before creating a resource
/// and give it back when the resource is destroyed or creation fails.
#[derive(Debug)]
pub struct PoolCapacity {
    capacity: usize,
    count: AtomicUsize,
}

impl PoolCapacity {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            count: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Reserve one slot.
    ///
    /// Fails with `CapacityExceeded` when the pool is full. Under
    /// contention for the last slot exactly one caller succeeds.
    pub fn try_increment(&self) -> Result<()> {
        let mut current = self.count.load(Ordering::Acquire);
        loop {
            if current >= self.capacity {
                return Err(PoolingError::CapacityExceeded {
                    capacity: self.capacity,
                });
            }
            match self.count.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(()),
                Err(observed) => current = observed,
            }
        }
    }

    /// Give a slot back, clamping at zero.
    ///
    /// A decrement without a matching increment is ignored rather than
    /// underflowing; double-release is a caller bug the pool absorbs.
    pub fn decrement(&self) {
        let mut current = self.count.load(Ordering::Acquire);
        loop {
            if current == 0 {
                return;
            }
            match self.count.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(observed) => current = observed,
            }
        }
    }
}
