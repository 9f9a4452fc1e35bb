//! Tessera - read-side navigation for chunked, content-addressed trees
//!
//! Tessera stores large JSON documents as trees of immutable chunks keyed by
//! document location, and reads single values out of them without fetching
//! the rest of the document.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use tessera::{IndexedJsonDocument, JsonPath, MemoryNodeStore, ReadContext, TreeConfig};
//!
//! let ctx = ReadContext::new();
//! let store = Arc::new(MemoryNodeStore::new());
//! let doc = IndexedJsonDocument::build(
//!     &ctx,
//!     store,
//!     br#"{"a":1,"b":[2,3,4],"c":"x"}"#,
//!     &TreeConfig::default(),
//! )?;
//!
//! let value = doc.lookup(&ctx, &JsonPath::root().key("b").index(1))?;
//! assert_eq!(value.as_deref(), Some(&b"3"[..]));
//! # Ok::<(), tessera::Error>(())
//! ```
//!
//! # Architecture
//!
//! - `tessera-core`: errors, content hashes, paths, locations and key orderings
//! - `tessera-storage`: nodes, node stores, the tree cursor and the JSON layer
//!
//! Both are re-exported here.

pub use tessera_core::{
    compare_encoded_locations, compare_json_locations, ChunkHash, Error, JsonLocation,
    JsonLocationOrdering, JsonPath, KeyOrdering, LexicographicOrdering, LocationState,
    PathSegment, Result, MAX_NESTING_DEPTH, MAX_PATH_LENGTH,
};
pub use tessera_storage::{
    fetch_child, normalize_json, predecessor_key, IndexedJsonDocument, JsonChunk, JsonChunker,
    JsonCursor, JsonScanner, LocationStep, MemoryNodeStore, Node, NodeRef, NodeStore, Position,
    ReadContext, ScanStep, TreeBuilder, TreeConfig, TreeCursor,
};
