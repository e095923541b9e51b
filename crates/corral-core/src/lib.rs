//! Corral Core - Core abstractions for the corral resource pool
//!
//! This crate provides the fundamental traits and types the pool engine
//! depends on. It defines:
//!
//! - `PooledResource` - Trait for the opaque physical resource being pooled
//! - `ResourceAllocator` - Factory/matcher for physical resources
//! - `TransactionRef` - Ambient unit-of-work a resource can be enlisted in
//! - `PoolListener` - Fire-and-forget telemetry hooks
//! - Common types like `PoolIdentity`, `ResourceSpec` and `PoolingError`

mod error;
mod identity;
mod resource;
mod spec;
mod telemetry;
mod transaction;

pub use error::{PoolingError, Result};
pub use identity::PoolIdentity;
pub use resource::{PooledResource, ResourceAllocator};
pub use spec::ResourceSpec;
pub use telemetry::{NoopListener, PoolListener};
pub use transaction::{TransactionOutcome, TransactionRef};
