//! # Configuration
//!
//! Shard index bounds and per-queue construction settings.
//!
//! ## Shard Index Space
//!
//! ```text
//! id:     0          1          2               MAX_SHARD_ID
//!       ┌──────────┬──────────┬──────────┬ ─ ─ ┬──────────┐
//!       │ DEFAULT  │ worker 1 │ worker 2 │ ... │ worker N │
//!       └──────────┴──────────┴──────────┴ ─ ─ ┴──────────┘
//! ```
//!
//! Shard 0 is reserved for single-threaded callers. Worker slots handed out
//! by a scheduler use ids `1..=worker_count`. Readers walk shards in
//! ascending id order, so the default shard is always read first.

use std::path::Path;

use serde::Deserialize;

use crate::error::{ShardError, ShardResult};

/// Maximum number of concurrent worker slots supported by the host scheduler.
pub const MAX_WORKER_COUNT: usize = 128;

/// Shard reserved for callers that do not run on a worker slot.
pub const DEFAULT_SHARD_ID: usize = 0;

/// Smallest valid shard id.
pub const MIN_SHARD_ID: usize = DEFAULT_SHARD_ID;

/// Largest valid shard id under the default configuration.
pub const MAX_SHARD_ID: usize = MAX_WORKER_COUNT;

/// How long a queue's memory is expected to live.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifetime {
    /// Scoped to one cycle: the owner must clear or dispose it before it goes away.
    #[default]
    Cycle,
    /// Lives across cycles.
    Persistent,
}

/// Construction settings shared by every buffer of a queue.
///
/// # Example
///
/// ```toml
/// worker_count = 16
/// initial_shard_capacity = 4096
/// lifetime = "persistent"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueConfig {
    /// Number of worker slots. Buffers hold `worker_count + 1` shards.
    pub worker_count: usize,
    /// Bytes reserved in every shard at creation.
    pub initial_shard_capacity: usize,
    /// Expected lifetime of the queue memory.
    pub lifetime: Lifetime,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            worker_count: MAX_WORKER_COUNT,
            initial_shard_capacity: 0,
            lifetime: Lifetime::Cycle,
        }
    }
}

impl QueueConfig {
    /// Config for a queue kept alive across cycles.
    #[must_use]
    pub fn persistent() -> Self {
        Self {
            lifetime: Lifetime::Persistent,
            ..Self::default()
        }
    }

    /// Sets the number of worker slots.
    #[must_use]
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Sets the bytes reserved per shard at creation.
    #[must_use]
    pub fn with_initial_shard_capacity(mut self, bytes: usize) -> Self {
        self.initial_shard_capacity = bytes;
        self
    }

    /// Number of shards a buffer built from this config holds.
    #[inline]
    #[must_use]
    pub const fn shard_count(&self) -> usize {
        self.worker_count + 1
    }

    /// Largest shard id a buffer built from this config accepts.
    #[inline]
    #[must_use]
    pub const fn max_shard_id(&self) -> usize {
        self.worker_count
    }

    /// Checks the config against the host limits.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `worker_count` is zero or above [`MAX_WORKER_COUNT`].
    pub fn validate(&self) -> ShardResult<()> {
        if self.worker_count == 0 {
            return Err(ShardError::InvalidConfig(
                "worker_count must be at least 1".to_string(),
            ));
        }
        if self.worker_count > MAX_WORKER_COUNT {
            return Err(ShardError::InvalidConfig(format!(
                "worker_count {} exceeds maximum {MAX_WORKER_COUNT}",
                self.worker_count
            )));
        }
        Ok(())
    }

    /// Parses and validates a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` on malformed TOML or out-of-range values.
    pub fn from_toml_str(text: &str) -> ShardResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| ShardError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a config from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the file cannot be read or parsed.
    pub fn from_toml_file(path: impl AsRef<Path>) -> ShardResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ShardError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bounds() {
        let config = QueueConfig::default();
        assert_eq!(config.max_shard_id(), MAX_SHARD_ID);
        assert_eq!(config.shard_count(), MAX_WORKER_COUNT + 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let config = QueueConfig::from_toml_str(
            "worker_count = 8\ninitial_shard_capacity = 256\nlifetime = \"persistent\"\n",
        )
        .unwrap();
        assert_eq!(config.worker_count, 8);
        assert_eq!(config.initial_shard_capacity, 256);
        assert_eq!(config.lifetime, Lifetime::Persistent);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = QueueConfig::from_toml_str("worker_count = 4").unwrap();
        assert_eq!(config.initial_shard_capacity, 0);
        assert_eq!(config.lifetime, Lifetime::Cycle);
    }

    #[test]
    fn test_rejects_bad_worker_count() {
        assert!(matches!(
            QueueConfig::from_toml_str("worker_count = 0"),
            Err(ShardError::InvalidConfig(_))
        ));
        assert!(QueueConfig::default()
            .with_worker_count(MAX_WORKER_COUNT + 1)
            .validate()
            .is_err());
        assert!(QueueConfig::from_toml_str("workers = 3").is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = QueueConfig::from_toml_file("/nonexistent/shardbuf.toml");
        assert!(matches!(result, Err(ShardError::InvalidConfig(_))));
    }
}
