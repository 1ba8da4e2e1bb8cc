//! Configuration for stashmux
//!
//! Centralized configuration with sensible defaults.

use crate::error::{MuxError, Result};

/// Main configuration for a StoreMux instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Addressing Configuration
    // -------------------------------------------------------------------------
    /// How a global offset is mapped to its backing store
    pub resolve_strategy: ResolveStrategy,

    // -------------------------------------------------------------------------
    // Store Lifecycle Configuration
    // -------------------------------------------------------------------------
    /// Flush a dirty store when the mux is dropped without `close()`
    pub flush_on_drop: bool,

    /// Reject a store whose length at open differs from its indexed length
    pub verify_store_lengths: bool,

    // -------------------------------------------------------------------------
    // Worker Configuration
    // -------------------------------------------------------------------------
    /// Bounded capacity of the worker request queue
    pub worker_queue_size: usize,
}

/// Offset resolution strategy
///
/// Both strategies return the same store for every offset; the index is
/// sorted and immutable so a binary search is always valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStrategy {
    /// Scan from the last store toward the first
    Linear,

    /// Binary search over start offsets
    Binary,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resolve_strategy: ResolveStrategy::Binary,
            flush_on_drop: false,
            verify_store_lengths: true,
            worker_queue_size: 64,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.worker_queue_size == 0 {
            return Err(MuxError::Config("worker_queue_size must be > 0".into()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the offset resolution strategy
    pub fn resolve_strategy(mut self, strategy: ResolveStrategy) -> Self {
        self.config.resolve_strategy = strategy;
        self
    }

    /// Flush the open store on drop if it is dirty
    pub fn flush_on_drop(mut self, enabled: bool) -> Self {
        self.config.flush_on_drop = enabled;
        self
    }

    /// Check opened store lengths against the index
    pub fn verify_store_lengths(mut self, enabled: bool) -> Self {
        self.config.verify_store_lengths = enabled;
        self
    }

    /// Set the worker request queue capacity
    pub fn worker_queue_size(mut self, size: usize) -> Self {
        self.config.worker_queue_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
