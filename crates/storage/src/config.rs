//! Tree shape configuration
//!
//! Controls how the bulk loader lays out document trees. Deserializable from
//! any serde format; missing fields take their defaults.
//!
//! ```toml
//! # Chunk size the JSON chunker aims for, in bytes
//! target_chunk_size = 4096
//! # Payload chunks per leaf node
//! entries_per_leaf = 1
//! # Children per internal node
//! fanout = 32
//! ```

use serde::{Deserialize, Serialize};
use tessera_core::{Error, Result};

/// Layout parameters for trees built by [`TreeBuilder`](crate::builder::TreeBuilder)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Chunk size the JSON chunker aims for, in bytes (default: 4096)
    #[serde(default = "default_target_chunk_size")]
    pub target_chunk_size: usize,
    /// Payload chunks per leaf node (default: 1)
    #[serde(default = "default_entries_per_leaf")]
    pub entries_per_leaf: usize,
    /// Children per internal node (default: 32)
    #[serde(default = "default_fanout")]
    pub fanout: usize,
}

fn default_target_chunk_size() -> usize {
    4096
}

fn default_entries_per_leaf() -> usize {
    1
}

fn default_fanout() -> usize {
    32
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            target_chunk_size: default_target_chunk_size(),
            entries_per_leaf: default_entries_per_leaf(),
            fanout: default_fanout(),
        }
    }
}

impl TreeConfig {
    /// Reject layouts the loader cannot build
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for a zero chunk size, zero entries per
    /// leaf, or a fanout below 2.
    pub fn validate(&self) -> Result<()> {
        if self.target_chunk_size == 0 {
            return Err(Error::InvalidConfig(
                "target_chunk_size must be at least 1".to_string(),
            ));
        }
        if self.entries_per_leaf == 0 {
            return Err(Error::InvalidConfig(
                "entries_per_leaf must be at least 1".to_string(),
            ));
        }
        if self.fanout < 2 {
            return Err(Error::InvalidConfig(format!(
                "fanout must be at least 2, got {}",
                self.fanout
            )));
        }
        Ok(())
    }
}
