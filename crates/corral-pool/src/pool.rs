//! Resource pooling engine
//!
//! This module provides the pool itself with configurable sizing, wait
//! policy, idle eviction and status snapshots.
//!
//! # Example
//!
//! ```ignore
//! use corral_pool::{ConnectionPool, PoolConfig, WaitPolicy};
//!
//! let config = PoolConfig::new(2, 10)
//!     .with_wait_policy(WaitPolicy::WaitWithTimeout(5_000))
//!     .with_idle_timeout_ms(300_000);
//!
//! let pool = ConnectionPool::new("orders".into(), config);
//! let handle = pool.get_resource(&spec, &allocator, None)?;
//! // Use handle.resource()...
//! pool.resource_closed(&handle);
//! ```

mod config;
mod pool;
mod stats;


pub use config::{PoolConfig, WaitPolicy};
pub use pool::ConnectionPool;
pub use stats::{CounterSnapshot, PoolCounters, PoolStatus};
