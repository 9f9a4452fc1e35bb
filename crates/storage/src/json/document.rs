//! JSON documents stored as trees of chunks

use std::sync::Arc;

use tracing::debug;

use tessera_core::{JsonLocation, JsonLocationOrdering, JsonPath, Result};

use super::chunker::{JsonChunk, JsonChunker};
use super::cursor::JsonCursor;
use crate::builder::TreeBuilder;
use crate::config::TreeConfig;
use crate::context::ReadContext;
use crate::cursor::TreeCursor;
use crate::node::{Node, NodeRef};
use crate::store::{fetch_child, NodeStore};

/// A serialized JSON document chunked into a tree keyed by [`JsonLocation`]
///
/// Reads of a single value only fetch the chunks that value spans, plus the
/// internal nodes on the way down to them.
#[derive(Clone)]
pub struct IndexedJsonDocument {
    store: Arc<dyn NodeStore>,
    root: Arc<Node>,
}

impl std::fmt::Debug for IndexedJsonDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexedJsonDocument")
            .field("root", &self.root.hash())
            .field("level", &self.root.level())
            .finish()
    }
}

impl IndexedJsonDocument {
    /// Chunk `bytes` by `config.target_chunk_size` and store the resulting tree
    ///
    /// Object keys must appear in ascending byte order; see
    /// [`normalize_json`](super::normalize_json).
    pub fn build(
        ctx: &ReadContext,
        store: Arc<dyn NodeStore>,
        bytes: &[u8],
        config: &TreeConfig,
    ) -> Result<Self> {
        config.validate()?;
        let chunks = JsonChunker::split_by_size(bytes, config.target_chunk_size)?;
        Self::from_chunks(ctx, store, chunks, config)
    }

    /// Store a tree over already split chunks
    pub fn from_chunks(
        ctx: &ReadContext,
        store: Arc<dyn NodeStore>,
        chunks: Vec<JsonChunk>,
        config: &TreeConfig,
    ) -> Result<Self> {
        let count = chunks.len();
        let entries = chunks
            .into_iter()
            .map(|chunk| (chunk.key(), chunk.bytes))
            .collect();
        let root = TreeBuilder::new(store.as_ref(), config, &JsonLocationOrdering)?.build(entries)?;
        debug!(chunks = count, root = %root, "stored document");
        Self::from_root(ctx, store, root)
    }

    /// Open a document already in `store`
    pub fn from_root(ctx: &ReadContext, store: Arc<dyn NodeStore>, root: NodeRef) -> Result<Self> {
        let root = fetch_child(ctx, store.as_ref(), &root)?;
        Ok(IndexedJsonDocument { store, root })
    }

    /// Reference to the root node
    pub fn root_ref(&self) -> NodeRef {
        self.root.hash()
    }

    /// Cursor at `location`, or the first location after it
    pub fn cursor_at(&self, ctx: &ReadContext, location: &JsonLocation) -> Result<JsonCursor> {
        JsonCursor::new(ctx, Arc::clone(&self.store), Arc::clone(&self.root), location)
    }

    /// Serialized value at `path`, or `None` if the document has no such value
    pub fn lookup(&self, ctx: &ReadContext, path: &JsonPath) -> Result<Option<Vec<u8>>> {
        let target = JsonLocation::start_of(path.clone());
        let mut cursor = self.cursor_at(ctx, &target)?;
        if *cursor.current_location() != target {
            return Ok(None);
        }
        cursor.next_value(ctx).map(Some)
    }

    /// The whole serialized document
    pub fn to_bytes(&self, ctx: &ReadContext) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.for_each_chunk(ctx, |chunk| bytes.extend_from_slice(chunk))?;
        Ok(bytes)
    }

    /// Number of stored chunks
    pub fn chunk_count(&self, ctx: &ReadContext) -> Result<usize> {
        let mut count = 0;
        self.for_each_chunk(ctx, |_| count += 1)?;
        Ok(count)
    }

    fn for_each_chunk(&self, ctx: &ReadContext, mut f: impl FnMut(&[u8])) -> Result<()> {
        let mut cursor =
            TreeCursor::at_start(ctx, Arc::clone(&self.store), Arc::clone(&self.root))?;
        while cursor.is_valid() {
            f(cursor.current_value()?);
            cursor.advance(ctx)?;
        }
        Ok(())
    }
}
