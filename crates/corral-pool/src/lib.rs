//! Corral Pool - Pooling engine for expensive external resources
//!
//! This crate manages pools of externally backed resources whose
//! creation is expensive enough to amortize across many short uses. It
//! provides:
//!
//! - `ConnectionPool` - A single pool: sizing, matching, wait policy,
//!   idle eviction
//! - `PoolManager` - A registry dispatching operations to pools by
//!   identity
//! - `ResourceHandle` - The pooled wrapper callers hold while using a
//!   resource
//! - `PoolConfig` / `PoolStatus` - Configuration and snapshots
//!
//! The physical resource, its factory and the transaction coordinator
//! stay behind the `corral-core` traits; the pool never looks inside
//! them.

mod capacity;
mod handle;
mod manager;
pub mod pool;
mod set;

pub use capacity::PoolCapacity;
pub use handle::{ResourceHandle, ResourceState};
pub use manager::PoolManager;
pub use pool::{ConnectionPool, CounterSnapshot, PoolConfig, PoolStatus, WaitPolicy};
pub use set::ResourceSet;
