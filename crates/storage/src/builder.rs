//! Bulk loader for read-side trees
//!
//! Packs an already sorted run of entries into a balanced tree, bottom up:
//! leaves of `entries_per_leaf`, then internal levels of `fanout` children
//! keyed by each child's last key, until one node remains. There is no
//! incremental insert and no rebalancing; a new run builds a new tree and
//! unchanged nodes are shared through content addressing.

use tracing::debug;

use tessera_core::{Error, KeyOrdering, Result};

use crate::config::TreeConfig;
use crate::node::{Node, NodeRef};
use crate::store::NodeStore;

/// Builds a tree from sorted entries into a [`NodeStore`]
pub struct TreeBuilder<'a> {
    store: &'a dyn NodeStore,
    ordering: &'a dyn KeyOrdering,
    entries_per_leaf: usize,
    fanout: usize,
}

impl<'a> TreeBuilder<'a> {
    /// Create a builder
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `config` does not validate.
    pub fn new(
        store: &'a dyn NodeStore,
        config: &TreeConfig,
        ordering: &'a dyn KeyOrdering,
    ) -> Result<Self> {
        config.validate()?;
        Ok(TreeBuilder {
            store,
            ordering,
            entries_per_leaf: config.entries_per_leaf,
            fanout: config.fanout,
        })
    }

    /// Build a tree from `(key, payload)` entries, returning the root reference
    ///
    /// An empty run yields an empty leaf as the root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] if keys are not strictly increasing
    /// under the builder's ordering, or any error from the store.
    pub fn build(&self, entries: Vec<(Vec<u8>, Vec<u8>)>) -> Result<NodeRef> {
        for (i, pair) in entries.windows(2).enumerate() {
            if self.ordering.compare(&pair[0].0, &pair[1].0) != std::cmp::Ordering::Less {
                return Err(Error::InvalidOperation(format!(
                    "entry {} is not ordered after entry {}",
                    i + 1,
                    i
                )));
            }
        }

        if entries.is_empty() {
            return self.store.write(Node::empty_leaf());
        }

        let mut level = Vec::new();
        let mut leaf_entries = Vec::with_capacity(self.entries_per_leaf);
        for entry in entries {
            leaf_entries.push(entry);
            if leaf_entries.len() == self.entries_per_leaf {
                level.push(self.write_leaf(std::mem::take(&mut leaf_entries))?);
            }
        }
        if !leaf_entries.is_empty() {
            level.push(self.write_leaf(leaf_entries)?);
        }
        let leaves = level.len();

        let mut height = 0;
        while level.len() > 1 {
            height += 1;
            let mut parents = Vec::with_capacity(level.len() / self.fanout + 1);
            for group in level.chunks(self.fanout) {
                let last_key = group[group.len() - 1].0.clone();
                let node = Node::internal(height, group.to_vec())?;
                parents.push((last_key, self.store.write(node)?));
            }
            level = parents;
        }

        let root = level[0].1;
        debug!(leaves, height, root = %root, "built tree");
        Ok(root)
    }

    fn write_leaf(&self, entries: Vec<(Vec<u8>, Vec<u8>)>) -> Result<(Vec<u8>, NodeRef)> {
        let last_key = entries[entries.len() - 1].0.clone();
        let node_ref = self.store.write(Node::leaf(entries))?;
        Ok((last_key, node_ref))
    }
}
