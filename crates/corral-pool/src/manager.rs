//! Pool registry and dispatch

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use corral_core::{
    NoopListener, PoolIdentity, PoolListener, PoolingError, ResourceAllocator, ResourceSpec,
    Result, TransactionOutcome, TransactionRef,
};

use crate::handle::ResourceHandle;
use crate::pool::{ConnectionPool, PoolConfig, PoolStatus};


/// Registry of pools, keyed by identity.
///
/// Owns no global state; construct as many managers as needed. All
/// pool operations dispatch through here by identity. An acquire
/// against an unregistered identity is a configuration error and fails
/// loudly; status queries and release notifications for an unknown
/// pool are absorbed, since the pool may simply have been killed.
pub struct PoolManager {
    pools: RwLock<HashMap<PoolIdentity, Arc<ConnectionPool>>>,
    listener: Arc<dyn PoolListener>,
}

impl PoolManager {
    pub fn new() -> Self {
        Self::with_listener(Arc::new(NoopListener))
    }

    /// A manager whose pools all report to the given listener.
    pub fn with_listener(listener: Arc<dyn PoolListener>) -> Self {
        Self {
            pools: RwLock::new(HashMap::new()),
            listener,
        }
    }

    /// Register a pool with zero live resources.
    ///
    /// Idempotent: re-registering an identity keeps the existing pool
    /// and its resources.
    #[tracing::instrument(skip(self, config), fields(pool = %identity))]
    pub fn create_empty_pool(&self, identity: PoolIdentity, config: PoolConfig) {
        let mut pools = self.pools.write();
        if pools.contains_key(&identity) {
            tracing::debug!("pool already registered");
            return;
        }
        tracing::info!("registering pool");
        let pool = ConnectionPool::with_listener(
            identity.clone(),
            config,
            self.listener.clone(),
        );
        pools.insert(identity.clone(), Arc::new(pool));
        drop(pools);
        self.listener.pool_created(&identity);
    }

    /// Acquire a resource from the named pool.
    pub fn get_resource(
        &self,
        identity: &PoolIdentity,
        spec: &ResourceSpec,
        allocator: &Arc<dyn ResourceAllocator>,
        tx: Option<&Arc<dyn TransactionRef>>,
    ) -> Result<Arc<ResourceHandle>> {
        let pool = self.lookup(identity)?;
        pool.get_resource(spec, allocator, tx)
    }

    /// A caller released a handle back to its pool.
    pub fn resource_closed(&self, identity: &PoolIdentity, handle: &Arc<ResourceHandle>) {
        if let Some(pool) = self.get_pool(identity) {
            pool.resource_closed(handle);
        }
    }

    /// A caller saw a handle's resource fail.
    pub fn resource_error_occurred(&self, identity: &PoolIdentity, handle: &Arc<ResourceHandle>) {
        if let Some(pool) = self.get_pool(identity) {
            pool.resource_error_occurred(handle);
        }
    }

    /// A caller's unit of work aborted while holding a handle.
    pub fn resource_abort_occurred(&self, identity: &PoolIdentity, handle: &Arc<ResourceHandle>) {
        if let Some(pool) = self.get_pool(identity) {
            pool.resource_abort_occurred(handle);
        }
    }

    /// A unit of work completed; broadcast to every pool so all of its
    /// enlistments are cleared.
    pub fn transaction_completed(&self, tx_id: Uuid, outcome: TransactionOutcome) {
        for pool in self.all_pools() {
            pool.transaction_completed(tx_id, outcome);
        }
    }

    /// Status snapshot for a pool; `None` when the identity is not
    /// registered, which is a legal question to ask after a kill.
    pub fn pool_status(&self, identity: &PoolIdentity) -> Option<PoolStatus> {
        self.get_pool(identity).map(|pool| pool.status())
    }

    /// Empty and refill the named pool to its steady size.
    #[tracing::instrument(skip(self), fields(pool = %identity))]
    pub fn flush_pool(&self, identity: &PoolIdentity) -> Result<()> {
        self.lookup(identity)?.flush()
    }

    /// Replace the named pool with a fresh one under the new config.
    ///
    /// The old pool is shut down and emptied; waiters parked on it get
    /// a shutdown error. The replacement starts empty and fills lazily.
    #[tracing::instrument(skip(self, config), fields(pool = %identity))]
    pub fn reconfigure_pool(&self, identity: &PoolIdentity, config: PoolConfig) -> Result<()> {
        let mut pools = self.pools.write();
        let old = pools
            .get(identity)
            .cloned()
            .ok_or_else(|| PoolingError::UnknownPool(identity.clone()))?;
        tracing::info!("reconfiguring pool");
        old.shutdown();
        old.empty_pool();
        let pool = ConnectionPool::with_listener(
            identity.clone(),
            config,
            self.listener.clone(),
        );
        pools.insert(identity.clone(), Arc::new(pool));
        Ok(())
    }

    /// Destroy the named pool and unregister it.
    ///
    /// Unknown identities are ignored; the pool may already be gone.
    #[tracing::instrument(skip(self), fields(pool = %identity))]
    pub fn kill_pool(&self, identity: &PoolIdentity) {
        let pool = self.pools.write().remove(identity);
        if let Some(pool) = pool {
            tracing::info!("killing pool");
            pool.shutdown();
            pool.empty_pool();
            self.listener.pool_destroyed(identity);
        }
    }

    /// Evict every free resource in every pool.
    #[tracing::instrument(skip(self))]
    pub fn kill_free_resources(&self) {
        for pool in self.all_pools() {
            pool.kill_free_resources();
        }
    }

    /// Run the idle-eviction maintenance pass over every pool.
    #[tracing::instrument(skip(self))]
    pub fn resize_pools(&self, forced: bool) {
        for pool in self.all_pools() {
            pool.resize_pool(forced);
        }
    }

    /// Identities of every registered pool.
    pub fn pool_identities(&self) -> Vec<PoolIdentity> {
        self.pools.read().keys().cloned().collect()
    }

    /// Direct access to a registered pool.
    pub fn get_pool(&self, identity: &PoolIdentity) -> Option<Arc<ConnectionPool>> {
        self.pools.read().get(identity).cloned()
    }

    fn lookup(&self, identity: &PoolIdentity) -> Result<Arc<ConnectionPool>> {
        self.get_pool(identity)
            .ok_or_else(|| PoolingError::UnknownPool(identity.clone()))
    }

    fn all_pools(&self) -> Vec<Arc<ConnectionPool>> {
        self.pools.read().values().cloned().collect()
    }
}

impl Default for PoolManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PoolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolManager")
            .field("pools", &self.pool_identities())
            .finish()
    }
}
