//! Consensus and runtime configuration for **Obscura** core.
//!
//! The [`Config`] struct centralises tunable parameters such as the
//! proof-of-work difficulty and the block size target. It is constructed via
//! the [`ConfigBuilder`] using the fluent builder pattern, enabling callers to
//! customise only the fields they care about while keeping sensible defaults.
//!
//! All fields are `pub` so read-only access is ergonomic, however mutation
//! should occur through the builder to preserve validation invariants.
//!
//! ```
//! use obscura_core::config::Config;
//!
//! // default configuration
//! let cfg = Config::default();
//! assert_eq!(cfg.difficulty, 2);
//! assert_eq!(cfg.trans_per_block, 10);
//! ```

use serde::{Deserialize, Serialize};

/// Runtime configuration shared across the crate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Proof-of-work difficulty: number of leading hex `'0'` characters a
    /// block hash must have.
    pub difficulty: u32,

    /// Number of valid, contiguous transactions required (across users)
    /// before the engine mines a new block.
    pub trans_per_block: usize,

    /// Depth gap beyond which a trailing fork is pruned (Bitcoin-style
    /// confirmation depth).
    pub prune_threshold: u64,

    /// Human-readable name identifying the network (e.g. "main", "test").
    pub network: String,
}

impl Default for Config {
    fn default() -> Self {
        Self { difficulty: 2, trans_per_block: 10, prune_threshold: 6, network: "main".into() }
    }
}

/// Fluent builder for [`Config`].
pub struct ConfigBuilder {
    inner: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Starts a new builder pre-populated with [`Config::default`].
    pub fn new() -> Self {
        Self { inner: Config::default() }
    }

    pub fn difficulty(mut self, diff: u32) -> Self {
        self.inner.difficulty = diff;
        self
    }

    pub fn trans_per_block(mut self, n: usize) -> Self {
        self.inner.trans_per_block = n;
        self
    }

    pub fn prune_threshold(mut self, n: u64) -> Self {
        self.inner.prune_threshold = n;
        self
    }

    pub fn network<S: Into<String>>(mut self, name: S) -> Self {
        self.inner.network = name.into();
        self
    }

    /// Consumes the builder returning an immutable configuration value.
    pub fn finish(self) -> Config {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_fields() {
        let cfg = ConfigBuilder::new()
            .difficulty(4)
            .trans_per_block(3)
            .prune_threshold(2)
            .network("test")
            .finish();
        assert_eq!(cfg.difficulty, 4);
        assert_eq!(cfg.trans_per_block, 3);
        assert_eq!(cfg.prune_threshold, 2);
        assert_eq!(cfg.network, "test");
    }
}
