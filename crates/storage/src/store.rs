//! Node store capability
//!
//! The tree never holds node bytes itself; it resolves references through a
//! [`NodeStore`]. [`fetch_child`] is the single fetch boundary every cursor
//! goes through.
//!
//! `MemoryNodeStore` is the in-process implementation:
//! - `FxHashMap<ChunkHash, Arc<Node>>` behind a `parking_lot::RwLock`
//! - identical nodes are stored once
//! - read counter for observing fetch behaviour

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::trace;

use tessera_core::{ChunkHash, Error, Result};

use crate::context::ReadContext;
use crate::node::{Node, NodeRef};

/// Resolves node references to nodes
///
/// Thread safety: nodes are immutable, so implementations may hand the same
/// `Arc<Node>` to any number of readers on any thread.
pub trait NodeStore: Send + Sync {
    /// Resolve a reference
    ///
    /// # Errors
    ///
    /// Returns [`Error::NodeNotFound`] if the store has no such node, or a
    /// storage error if it cannot be read. Never returns an empty stand-in.
    fn read(&self, hash: &ChunkHash) -> Result<Arc<Node>>;

    /// Store a node, returning its reference
    fn write(&self, node: Node) -> Result<NodeRef>;

    /// Whether the node is present
    fn contains(&self, hash: &ChunkHash) -> bool;
}

/// Resolve `node_ref` through `store`, honouring cancellation
pub fn fetch_child(
    ctx: &ReadContext,
    store: &dyn NodeStore,
    node_ref: &NodeRef,
) -> Result<Arc<Node>> {
    ctx.check()?;
    trace!(node = %node_ref, "fetching node");
    store.read(node_ref)
}

/// In-memory node store
#[derive(Debug, Default)]
pub struct MemoryNodeStore {
    nodes: RwLock<FxHashMap<ChunkHash, Arc<Node>>>,
    reads: AtomicU64,
}

impl MemoryNodeStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct nodes stored
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    /// Number of successful and failed reads so far
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Drop a node, returning whether it was present
    ///
    /// Stands in for a chunk lost from the backing store.
    pub fn remove(&self, hash: &ChunkHash) -> bool {
        self.nodes.write().remove(hash).is_some()
    }
}

impl NodeStore for MemoryNodeStore {
    fn read(&self, hash: &ChunkHash) -> Result<Arc<Node>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.nodes
            .read()
            .get(hash)
            .cloned()
            .ok_or(Error::NodeNotFound(*hash))
    }

    fn write(&self, node: Node) -> Result<NodeRef> {
        let hash = node.hash();
        self.nodes
            .write()
            .entry(hash)
            .or_insert_with(|| Arc::new(node));
        Ok(hash)
    }

    fn contains(&self, hash: &ChunkHash) -> bool {
        self.nodes.read().contains_key(hash)
    }
}
