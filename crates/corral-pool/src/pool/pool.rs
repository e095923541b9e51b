//! The pool engine

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use parking_lot::{Condvar, Mutex, RwLock};
use uuid::Uuid;

use corral_core::{
    NoopListener, PoolIdentity, PoolListener, PoolingError, ResourceAllocator, ResourceSpec,
    Result, TransactionOutcome, TransactionRef,
};

use crate::capacity::PoolCapacity;
use crate::handle::ResourceHandle;
use crate::set::ResourceSet;

use super::config::PoolConfig;
use super::stats::{PoolCounters, PoolStatus};

/// Allocator and spec cached at first use, for maintenance work that
/// runs without a caller (steady refill, flush, eviction).
struct Maintenance {
    allocator: Arc<dyn ResourceAllocator>,
    spec: ResourceSpec,
}

/// A pool of reusable physical resources.
///
/// The pool is lazy: constructing it creates no resources. The first
/// `get_resource` fills it to `steady_size` and it grows on demand up
/// to `max_size`, with the wait policy deciding what happens beyond
/// that. Releases and evictions are driven by the caller reporting
/// `resource_closed`, `resource_error_occurred` or
/// `resource_abort_occurred` for handles it obtained here.
pub struct ConnectionPool {
    identity: PoolIdentity,
    config: PoolConfig,
    set: ResourceSet,
    capacity: PoolCapacity,
    counters: PoolCounters,
    listener: Arc<dyn PoolListener>,
    /// Guards the condvar; never held while touching the set beyond a
    /// quick availability re-check.
    wait_lock: Mutex<()>,
    wait_cond: Condvar,
    waiting: AtomicUsize,
    initialized: AtomicBool,
    shut_down: AtomicBool,
    maintenance: RwLock<Option<Maintenance>>,
}

impl ConnectionPool {
    pub fn new(identity: PoolIdentity, config: PoolConfig) -> Self {
        Self::with_listener(identity, config, Arc::new(NoopListener))
    }

    pub fn with_listener(
        identity: PoolIdentity,
        config: PoolConfig,
        listener: Arc<dyn PoolListener>,
    ) -> Self {
        let capacity = PoolCapacity::new(config.max_size());
        Self {
            identity,
            config,
            set: ResourceSet::new(),
            capacity,
            counters: PoolCounters::new(),
            listener,
            wait_lock: Mutex::new(()),
            wait_cond: Condvar::new(),
            waiting: AtomicUsize::new(0),
            initialized: AtomicBool::new(false),
            shut_down: AtomicBool::new(false),
            maintenance: RwLock::new(None),
        }
    }

    pub fn identity(&self) -> &PoolIdentity {
        &self.identity
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Number of live resources, free and busy.
    pub fn size(&self) -> usize {
        self.set.len()
    }

    /// Acquire a resource satisfying `spec`.
    ///
    /// Tries, in order: claim an existing free match, create new
    /// resources up to `max_size`, then apply the wait policy. Returns
    /// the handle busy; the caller owns it until it reports
    /// `resource_closed` (or an error/abort) for it.
    #[tracing::instrument(skip(self, spec, allocator, tx), fields(pool = %self.identity))]
    pub fn get_resource(
        &self,
        spec: &ResourceSpec,
        allocator: &Arc<dyn ResourceAllocator>,
        tx: Option<&Arc<dyn TransactionRef>>,
    ) -> Result<Arc<ResourceHandle>> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(PoolingError::Shutdown);
        }
        self.ensure_initialized(spec, allocator);

        let started = Instant::now();
        let deadline = self
            .config
            .wait_policy()
            .timeout()
            .map(|timeout| started + timeout);

        loop {
            if let Some(handle) = self
                .set
                .claim_free_match(spec, allocator.as_ref(), self.config.matching())
            {
                self.counters.record_matched();
                self.listener.resource_matched(&self.identity, handle.id());
                return Ok(self.hand_out(handle, tx));
            }
            if self.config.matching() && self.set.free_count() > 0 {
                self.counters.record_not_matched();
                self.listener.resource_not_matched(&self.identity);
            }

            if let Some(handle) = self.scale_up(spec, allocator)? {
                return Ok(self.hand_out(handle, tx));
            }

            // Full. Fail or park, per policy.
            let Some(deadline) = deadline else {
                tracing::debug!(capacity = self.config.max_size(), "pool full, failing fast");
                return Err(PoolingError::CapacityExceeded {
                    capacity: self.config.max_size(),
                });
            };

            // The deadline bounds the whole acquire, not a single
            // park: every pass through here checks it, no matter how
            // the previous wait ended.
            if Instant::now() >= deadline {
                return Err(self.acquire_timed_out(started));
            }

            self.waiting.fetch_add(1, Ordering::SeqCst);
            self.listener.request_queued(&self.identity);
            {
                let mut guard = self.wait_lock.lock();
                // A release may have slipped in between our failed claim
                // and taking the lock; re-check before parking. Only a
                // handle this request could actually claim counts as
                // available; a free handle for some other spec does not.
                if !self.claimable(spec, allocator.as_ref())
                    && !self.shut_down.load(Ordering::Acquire)
                {
                    self.wait_cond.wait_until(&mut guard, deadline);
                }
            }
            self.waiting.fetch_sub(1, Ordering::SeqCst);
            self.listener.request_dequeued(&self.identity);

            if self.shut_down.load(Ordering::Acquire) {
                return Err(PoolingError::Shutdown);
            }
        }
    }

    fn acquire_timed_out(&self, started: Instant) -> PoolingError {
        let waited_ms = started.elapsed().as_millis() as u64;
        tracing::warn!(waited_ms, "no available resources and wait time expired");
        self.counters.record_timed_out();
        self.listener.acquire_timed_out(&self.identity);
        PoolingError::WaitTimeout { waited_ms }
    }

    /// Whether this request could make progress right now, either by
    /// claiming a matching free handle or by creating a new resource.
    fn claimable(&self, spec: &ResourceSpec, allocator: &dyn ResourceAllocator) -> bool {
        self.capacity.count() < self.config.max_size()
            || self
                .set
                .has_free_match(spec, allocator, self.config.matching())
    }

    /// The caller is done with a handle it acquired.
    ///
    /// An errored handle is evicted; a healthy one goes back to the
    /// free side of the set, keeping any transaction enlistment it
    /// still has. Reporting a handle that is already free is a caller
    /// bug; it is logged and absorbed, never an error.
    #[tracing::instrument(skip(self, handle), fields(pool = %self.identity, handle_id = %handle.id()))]
    pub fn resource_closed(&self, handle: &Arc<ResourceHandle>) {
        if handle.has_error() {
            self.evict(handle);
        } else if handle.is_free() {
            // Already free: nothing was released, so the counters and
            // listener stay untouched.
            tracing::warn!("resource closed but is already free");
        } else {
            handle.set_busy(false);
            handle.touch();
            self.counters.record_released();
            self.listener.resource_released(&self.identity, handle.id());
            tracing::debug!("resource released");
        }
        self.wake_one();
    }

    /// The caller saw the resource fail.
    ///
    /// The handle is marked, evicted and destroyed. The transaction
    /// association, if any, is left for `transaction_completed` to
    /// clear.
    #[tracing::instrument(skip(self, handle), fields(pool = %self.identity, handle_id = %handle.id()))]
    pub fn resource_error_occurred(&self, handle: &Arc<ResourceHandle>) {
        tracing::debug!("resource error reported");
        handle.mark_error();
        handle.set_busy(false);
        self.evict(handle);
        self.wake_one();
    }

    /// The caller's unit of work aborted while holding the resource.
    ///
    /// Same eviction as an error, but the handle is delisted from its
    /// transaction first.
    #[tracing::instrument(skip(self, handle), fields(pool = %self.identity, handle_id = %handle.id()))]
    pub fn resource_abort_occurred(&self, handle: &Arc<ResourceHandle>) {
        tracing::debug!("resource abort reported");
        handle.delist();
        handle.mark_error();
        handle.set_busy(false);
        self.evict(handle);
        self.wake_one();
    }

    /// A unit of work completed; clear every enlistment it held.
    ///
    /// Busy/free state is untouched: a handle still in use stays busy,
    /// one already released simply becomes fully free.
    pub fn transaction_completed(&self, tx_id: Uuid, outcome: TransactionOutcome) {
        for handle in self.set.snapshot() {
            if handle.enlisted_in(tx_id) {
                handle.clear_enlistment();
                tracing::debug!(
                    pool = %self.identity,
                    handle_id = %handle.id(),
                    ?outcome,
                    "enlistment cleared"
                );
            }
        }
    }

    /// Destroy every resource in the pool, busy or free.
    ///
    /// Counters keep their cumulative values and the pool re-fills
    /// lazily on the next acquire.
    #[tracing::instrument(skip(self), fields(pool = %self.identity))]
    pub fn empty_pool(&self) {
        let drained = self.set.drain();
        tracing::info!(count = drained.len(), "emptying pool");
        for handle in drained {
            self.destroy_resource(&handle);
            self.capacity.decrement();
        }
        self.initialized.store(false, Ordering::Release);
        self.wake_all();
    }

    /// Empty the pool and refill it to `steady_size`.
    ///
    /// Fails with `PoolNotInitialized` if the pool has never served a
    /// request, since there is nothing to recycle yet.
    #[tracing::instrument(skip(self), fields(pool = %self.identity))]
    pub fn flush(&self) -> Result<()> {
        if !self.initialized.load(Ordering::Acquire) {
            return Err(PoolingError::PoolNotInitialized(self.identity.clone()));
        }
        tracing::info!("flushing pool");
        self.empty_pool();
        let maintenance = self.maintenance.read();
        if let Some(m) = maintenance.as_ref() {
            self.initialized.store(true, Ordering::Release);
            self.fill_to_steady(&m.spec, &m.allocator);
        }
        Ok(())
    }

    /// Maintenance pass: evict idle resources and settle back to
    /// `steady_size`.
    ///
    /// Skipped entirely while acquirers are waiting; shrinking a pool
    /// that is under pressure only makes the queue longer. Busy handles
    /// are never touched because victims are claimed through the same
    /// CAS acquirers use.
    #[tracing::instrument(skip(self), fields(pool = %self.identity, forced))]
    pub fn resize_pool(&self, forced: bool) {
        if self.waiting.load(Ordering::SeqCst) > 0 {
            tracing::debug!("skipping resize, acquirers are waiting");
            return;
        }
        if !self.initialized.load(Ordering::Acquire) {
            return;
        }

        let limit = if forced {
            self.config.resize_quantity()
        } else {
            self.capacity
                .count()
                .saturating_sub(self.config.steady_size())
        };

        let mut evicted = 0;
        if limit > 0 {
            for handle in self.set.snapshot() {
                if evicted >= limit {
                    break;
                }
                if handle.is_busy() || handle.idle_duration() < self.config.idle_timeout() {
                    continue;
                }
                if !handle.try_claim() {
                    continue;
                }
                self.evict(&handle);
                evicted += 1;
            }
        }
        if evicted > 0 {
            tracing::info!(evicted, "idle resources evicted");
        }

        let maintenance = self.maintenance.read();
        if let Some(m) = maintenance.as_ref() {
            self.fill_to_steady(&m.spec, &m.allocator);
        }
    }

    /// Reclaim a handle whose owner never reported it closed.
    ///
    /// The resource is destroyed, not reused; a caller that leaked the
    /// handle may still be holding the raw resource.
    #[tracing::instrument(skip(self, handle), fields(pool = %self.identity, handle_id = %handle.id()))]
    pub fn reclaim(&self, handle: &Arc<ResourceHandle>) {
        tracing::warn!("reclaiming leaked resource");
        self.counters.record_leaked();
        self.listener.leak_detected(&self.identity, handle.id());
        self.evict(handle);
        self.wake_one();
    }

    /// Point-in-time snapshot of the pool's state.
    pub fn status(&self) -> PoolStatus {
        PoolStatus::new(
            self.identity.clone(),
            self.set.len(),
            self.set.free_count(),
            self.set.busy_count(),
            self.waiting.load(Ordering::SeqCst),
            self.counters.snapshot(),
        )
    }

    /// Refuse further acquires and wake every parked waiter.
    pub(crate) fn shutdown(&self) {
        self.shut_down.store(true, Ordering::Release);
        self.wake_all();
    }

    /// Evict every currently free handle, leaving busy ones alone.
    pub(crate) fn kill_free_resources(&self) {
        for handle in self.set.snapshot() {
            if handle.try_claim() {
                self.evict(&handle);
            }
        }
        self.wake_all();
    }

    // First acquire fills the pool to steady size and caches the
    // allocator for maintenance work.
    fn ensure_initialized(&self, spec: &ResourceSpec, allocator: &Arc<dyn ResourceAllocator>) {
        if self.initialized.swap(true, Ordering::AcqRel) {
            return;
        }
        *self.maintenance.write() = Some(Maintenance {
            allocator: allocator.clone(),
            spec: spec.clone(),
        });
        tracing::info!(
            pool = %self.identity,
            steady = self.config.steady_size(),
            "initializing pool"
        );
        self.fill_to_steady(spec, allocator);
    }

    fn fill_to_steady(&self, spec: &ResourceSpec, allocator: &Arc<dyn ResourceAllocator>) {
        while self.capacity.count() < self.config.steady_size() {
            if self.capacity.try_increment().is_err() {
                break;
            }
            match self.create_handle(spec, allocator.as_ref()) {
                Ok(handle) => self.set.add(Arc::new(handle)),
                Err(error) => {
                    self.capacity.decrement();
                    tracing::warn!(pool = %self.identity, %error, "steady fill creation failed");
                    break;
                }
            }
        }
    }

    // Grow the pool the way a miss demands: below steady, fill the gap;
    // otherwise add a resize step, capped at max. The first new handle
    // is returned busy, the rest join the free side. Returns None when
    // no slot could be reserved at all.
    fn scale_up(
        &self,
        spec: &ResourceSpec,
        allocator: &Arc<dyn ResourceAllocator>,
    ) -> Result<Option<Arc<ResourceHandle>>> {
        let current = self.capacity.count();
        let quantity = if current < self.config.steady_size() {
            self.config.steady_size() - current
        } else {
            self.config.resize_quantity()
        }
        .max(1);

        let mut claimed = None;
        for _ in 0..quantity {
            if self.capacity.try_increment().is_err() {
                // At max. Free handles this request cannot use, whether
                // errored or created for a different spec, can be
                // purged to make room for one it can.
                if claimed.is_some()
                    || self.purge_unusable(spec, allocator.as_ref()) == 0
                    || self.capacity.try_increment().is_err()
                {
                    break;
                }
            }
            match self.create_handle(spec, allocator.as_ref()) {
                Ok(handle) => {
                    let handle = Arc::new(handle);
                    if claimed.is_none() {
                        handle.set_busy(true);
                        claimed = Some(handle.clone());
                    }
                    self.set.add(handle);
                }
                Err(error) => {
                    self.capacity.decrement();
                    if claimed.is_none() {
                        return Err(error);
                    }
                    // The acquirer already has its handle; losing an
                    // extra is not its problem.
                    tracing::warn!(pool = %self.identity, %error, "extra resource creation failed");
                    break;
                }
            }
        }
        Ok(claimed)
    }

    // Evict free handles this request could never claim, up to one
    // resize step. Victims are claimed through the usual CAS first, so
    // a busy handle is never purged.
    fn purge_unusable(&self, wanted: &ResourceSpec, allocator: &dyn ResourceAllocator) -> usize {
        let mut purged = 0;
        for handle in self.set.snapshot() {
            if purged >= self.config.resize_quantity() {
                break;
            }
            let unusable = handle.has_error()
                || (self.config.matching() && !allocator.matches(handle.spec(), wanted));
            if !unusable || !handle.try_claim() {
                continue;
            }
            self.evict(&handle);
            purged += 1;
        }
        if purged > 0 {
            tracing::debug!(pool = %self.identity, purged, "unusable free resources purged");
        }
        purged
    }

    fn create_handle(
        &self,
        spec: &ResourceSpec,
        allocator: &dyn ResourceAllocator,
    ) -> Result<ResourceHandle> {
        let resource = allocator
            .create(spec)
            .map_err(PoolingError::CreationFailed)?;
        let handle = ResourceHandle::new(resource, spec.clone());
        self.counters.record_created();
        self.listener.resource_created(&self.identity, handle.id());
        tracing::debug!(pool = %self.identity, handle_id = %handle.id(), "resource created");
        Ok(handle)
    }

    fn hand_out(
        &self,
        handle: Arc<ResourceHandle>,
        tx: Option<&Arc<dyn TransactionRef>>,
    ) -> Arc<ResourceHandle> {
        handle.touch();
        if let Some(tx) = tx {
            handle.enlist(tx.clone());
        }
        self.counters.record_acquired();
        self.listener.resource_acquired(&self.identity, handle.id());
        tracing::debug!(pool = %self.identity, handle_id = %handle.id(), "resource acquired");
        handle
    }

    // Remove a handle from the pool and destroy its resource. The
    // capacity slot is released only when the handle was still a
    // member, so reporting the same handle twice cannot drive the
    // count below the truth.
    fn evict(&self, handle: &Arc<ResourceHandle>) {
        if self.set.remove(handle.id()).is_some() {
            self.destroy_resource(handle);
            self.capacity.decrement();
        }
    }

    fn destroy_resource(&self, handle: &Arc<ResourceHandle>) {
        let maintenance = self.maintenance.read();
        match maintenance.as_ref() {
            Some(m) => m.allocator.destroy(handle.resource()),
            None => handle.resource().close(),
        }
        self.counters.record_destroyed();
        self.listener
            .resource_destroyed(&self.identity, handle.id());
        tracing::debug!(pool = %self.identity, handle_id = %handle.id(), "resource destroyed");
    }

    fn wake_one(&self) {
        let _guard = self.wait_lock.lock();
        self.wait_cond.notify_one();
    }

    fn wake_all(&self) {
        let _guard = self.wait_lock.lock();
        self.wait_cond.notify_all();
    }
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("identity", &self.identity)
            .field("config", &self.config)
            .field("size", &self.set.len())
            .field("waiting", &self.waiting.load(Ordering::SeqCst))
            .finish()
    }
}
