//! Pool configuration types

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What an acquirer does when the pool is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", content = "timeout_ms", rename_all = "snake_case")]
pub enum WaitPolicy {
    /// Fail immediately with a capacity error.
    FailFast,
    /// Park until a resource frees up, for at most this many
    /// milliseconds, then fail with a timeout error.
    WaitWithTimeout(u64),
}

impl WaitPolicy {
    pub fn timeout(&self) -> Option<Duration> {
        match self {
            WaitPolicy::FailFast => None,
            WaitPolicy::WaitWithTimeout(ms) => Some(Duration::from_millis(*ms)),
        }
    }
}

/// Configuration for a resource pool
///
/// Controls sizing, the wait policy, idle eviction and matching.
/// Immutable once a pool is built; reconfiguring a registered pool
/// replaces the pool wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of resources the pool settles at when idle
    steady_size: usize,
    /// Hard upper bound on live resources
    max_size: usize,
    /// How many resources a scale-up or scale-down step moves
    resize_quantity: usize,
    /// Behaviour when the pool is full
    wait: WaitPolicy,
    /// Idle time in milliseconds before a free resource is eligible
    /// for eviction
    idle_timeout_ms: u64,
    /// Whether free resources are matched against the requested spec
    matching: bool,
}

impl PoolConfig {
    /// Create a configuration with the given steady and max sizes
    ///
    /// # Panics
    ///
    /// Panics if `max_size` is 0 or `steady_size > max_size`.
    pub fn new(steady_size: usize, max_size: usize) -> Self {
        assert!(
            max_size > 0,
            "max_size must be greater than 0, got {}",
            max_size
        );
        assert!(
            steady_size <= max_size,
            "steady_size ({}) cannot exceed max_size ({})",
            steady_size,
            max_size
        );

        Self {
            steady_size,
            max_size,
            resize_quantity: 2,
            wait: WaitPolicy::WaitWithTimeout(60_000),
            idle_timeout_ms: 300_000, // 5 minutes default
            matching: true,
        }
    }

    /// Set how many resources a resize step moves
    pub fn with_resize_quantity(mut self, quantity: usize) -> Self {
        self.resize_quantity = quantity.max(1);
        self
    }

    /// Set the behaviour when the pool is full
    pub fn with_wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    /// Set the idle timeout in milliseconds
    pub fn with_idle_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.idle_timeout_ms = timeout_ms;
        self
    }

    /// Enable or disable spec matching on acquire
    pub fn with_matching(mut self, matching: bool) -> Self {
        self.matching = matching;
        self
    }

    pub fn steady_size(&self) -> usize {
        self.steady_size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn resize_quantity(&self) -> usize {
        self.resize_quantity
    }

    pub fn wait_policy(&self) -> WaitPolicy {
        self.wait
    }

    /// Get the idle timeout as a Duration
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn matching(&self) -> bool {
        self.matching
    }
}

impl Default for PoolConfig {
    /// Defaults:
    /// - steady_size: 8
    /// - max_size: 32
    /// - resize_quantity: 2
    /// - wait: 60 second timeout
    /// - idle_timeout: 5 minutes
    /// - matching: enabled
    fn default() -> Self {
        Self::new(8, 32)
    }
}
