//! Immutable tree nodes
//!
//! A node is an ordered run of keyed entries. Leaf nodes (level 0) carry
//! opaque payload chunks; internal nodes carry references to child nodes,
//! keyed by the greatest key in each child's subtree.
//!
//! Nodes are created once and never mutated. Their identity is a hash of
//! their contents, so two nodes with the same entries are the same node.

use std::sync::Arc;

use tessera_core::{ChunkHash, ChunkHasher, Error, Result};

/// Reference to a stored node: its content hash
pub type NodeRef = ChunkHash;

/// Entry values of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeItems {
    /// Payload chunks of a leaf node
    Leaf(Vec<Arc<[u8]>>),
    /// Child references of an internal node
    Internal(Vec<NodeRef>),
}

/// An immutable, content-addressed tree node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    level: u32,
    keys: Vec<Vec<u8>>,
    items: NodeItems,
    hash: ChunkHash,
}

impl Node {
    /// Build a leaf node from `(key, payload)` entries
    pub fn leaf(entries: Vec<(Vec<u8>, Vec<u8>)>) -> Self {
        let (keys, values): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .map(|(key, value)| (key, Arc::<[u8]>::from(value)))
            .unzip();
        Self::with_items(0, keys, NodeItems::Leaf(values))
    }

    /// A leaf with no entries; the root of an empty tree
    pub fn empty_leaf() -> Self {
        Self::with_items(0, Vec::new(), NodeItems::Leaf(Vec::new()))
    }

    /// Build an internal node at `level` from `(key, child)` entries
    ///
    /// Each key must be the greatest key stored under its child.
    pub fn internal(level: u32, entries: Vec<(Vec<u8>, NodeRef)>) -> Result<Self> {
        if level == 0 {
            return Err(Error::InvalidOperation(
                "internal nodes must sit above level 0".to_string(),
            ));
        }
        if entries.is_empty() {
            return Err(Error::InvalidOperation(
                "internal nodes must have at least one child".to_string(),
            ));
        }
        let (keys, children): (Vec<_>, Vec<_>) = entries.into_iter().unzip();
        Ok(Self::with_items(level, keys, NodeItems::Internal(children)))
    }

    fn with_items(level: u32, keys: Vec<Vec<u8>>, items: NodeItems) -> Self {
        let hash = content_hash(level, &keys, &items);
        Node {
            level,
            keys,
            items,
            hash,
        }
    }

    /// Content hash identifying this node
    pub fn hash(&self) -> ChunkHash {
        self.hash
    }

    /// Height above the leaves (0 for leaves)
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Whether this node carries payloads
    pub fn is_leaf(&self) -> bool {
        matches!(self.items, NodeItems::Leaf(_))
    }

    /// Number of entries
    pub fn count(&self) -> usize {
        self.keys.len()
    }

    /// Whether the node has no entries
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// All keys, in order
    pub fn keys(&self) -> &[Vec<u8>] {
        &self.keys
    }

    /// Key of entry `idx`
    pub fn key(&self, idx: usize) -> Option<&[u8]> {
        self.keys.get(idx).map(Vec::as_slice)
    }

    /// First key, if any
    pub fn first_key(&self) -> Option<&[u8]> {
        self.keys.first().map(Vec::as_slice)
    }

    /// Last key, if any
    pub fn last_key(&self) -> Option<&[u8]> {
        self.keys.last().map(Vec::as_slice)
    }

    /// Entry values
    pub fn items(&self) -> &NodeItems {
        &self.items
    }

    /// Payload of leaf entry `idx`
    pub fn value(&self, idx: usize) -> Option<&Arc<[u8]>> {
        match &self.items {
            NodeItems::Leaf(values) => values.get(idx),
            NodeItems::Internal(_) => None,
        }
    }

    /// Child reference of internal entry `idx`
    pub fn child(&self, idx: usize) -> Option<NodeRef> {
        match &self.items {
            NodeItems::Internal(children) => children.get(idx).copied(),
            NodeItems::Leaf(_) => None,
        }
    }
}

fn content_hash(level: u32, keys: &[Vec<u8>], items: &NodeItems) -> ChunkHash {
    let mut hasher = ChunkHasher::new();
    hasher.write_u64(level as u64).write_u64(keys.len() as u64);
    for key in keys {
        hasher.write_field(key);
    }
    match items {
        NodeItems::Leaf(values) => {
            for value in values {
                hasher.write_field(value);
            }
        }
        NodeItems::Internal(children) => {
            for child in children {
                hasher.write_field(child.as_bytes());
            }
        }
    }
    hasher.finish()
}
