//! Pool counters and status snapshots

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use corral_core::PoolIdentity;

/// Cumulative event counters for a pool.
///
/// Monotonic over the pool's registered lifetime; emptying the pool
/// does not reset them.
#[derive(Debug, Default)]
pub struct PoolCounters {
    created: AtomicU64,
    destroyed: AtomicU64,
    acquired: AtomicU64,
    released: AtomicU64,
    matched: AtomicU64,
    not_matched: AtomicU64,
    timed_out: AtomicU64,
    leaked: AtomicU64,
}

impl PoolCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_created(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_destroyed(&self) {
        self.destroyed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_acquired(&self) {
        self.acquired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_released(&self) {
        self.released.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_matched(&self) {
        self.matched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_matched(&self) {
        self.not_matched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timed_out(&self) {
        self.timed_out.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_leaked(&self) {
        self.leaked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            created: self.created.load(Ordering::Relaxed),
            destroyed: self.destroyed.load(Ordering::Relaxed),
            acquired: self.acquired.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            matched: self.matched.load(Ordering::Relaxed),
            not_matched: self.not_matched.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            leaked: self.leaked.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `PoolCounters`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub created: u64,
    pub destroyed: u64,
    pub acquired: u64,
    pub released: u64,
    pub matched: u64,
    pub not_matched: u64,
    pub timed_out: u64,
    pub leaked: u64,
}

/// Read-only snapshot of a pool's state
///
/// Derived, not authoritative: the numbers are recomputed on each call
/// and can drift from each other while the pool keeps moving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStatus {
    identity: PoolIdentity,
    total: usize,
    free: usize,
    busy: usize,
    waiting: usize,
    counters: CounterSnapshot,
    taken_at: DateTime<Utc>,
}

impl PoolStatus {
    pub fn new(
        identity: PoolIdentity,
        total: usize,
        free: usize,
        busy: usize,
        waiting: usize,
        counters: CounterSnapshot,
    ) -> Self {
        Self {
            identity,
            total,
            free,
            busy,
            waiting,
            counters,
            taken_at: Utc::now(),
        }
    }

    pub fn identity(&self) -> &PoolIdentity {
        &self.identity
    }

    /// Total number of live resources (free + busy)
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn free(&self) -> usize {
        self.free
    }

    pub fn busy(&self) -> usize {
        self.busy
    }

    /// Number of acquirers parked waiting for a resource
    pub fn waiting(&self) -> usize {
        self.waiting
    }

    pub fn counters(&self) -> &CounterSnapshot {
        &self.counters
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// Pool utilization as a fraction (0.0 to 1.0)
    ///
    /// Returns 0.0 for an empty pool to avoid division by zero.
    pub fn utilization(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.busy as f64 / self.total as f64
        }
    }
}
