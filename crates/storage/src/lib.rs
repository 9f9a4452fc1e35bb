//! Read-side storage for tessera
//!
//! This crate implements navigation over immutable, content-addressed trees:
//! - Node: immutable block of ordered entries, identified by its hash
//! - NodeStore: resolves node references (MemoryNodeStore in process)
//! - TreeCursor: seek, advance and retreat with an owned parent chain
//! - TreeBuilder: bulk loads sorted entries into a balanced tree
//! - json: resumable scanner and cursor for documents split across chunks
//!
//! # Reading a document
//!
//! ```
//! use std::sync::Arc;
//! use tessera_storage::{IndexedJsonDocument, MemoryNodeStore, ReadContext, TreeConfig};
//!
//! let ctx = ReadContext::new();
//! let store = Arc::new(MemoryNodeStore::new());
//! let config = TreeConfig { target_chunk_size: 4, ..TreeConfig::default() };
//! let doc = IndexedJsonDocument::build(&ctx, store, br#"{"a":1,"b":[2,3,4]}"#, &config).unwrap();
//!
//! let b = doc.lookup(&ctx, &"b".parse().unwrap()).unwrap();
//! assert_eq!(b.as_deref(), Some(&b"[2,3,4]"[..]));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod config;
pub mod context;
pub mod cursor;
pub mod json;
pub mod node;
pub mod store;

pub use builder::TreeBuilder;
pub use config::TreeConfig;
pub use context::ReadContext;
pub use cursor::{Position, TreeCursor};
pub use json::{
    normalize_json, predecessor_key, IndexedJsonDocument, JsonChunk, JsonChunker, JsonCursor,
    JsonScanner, LocationStep, ScanStep,
};
pub use node::{Node, NodeItems, NodeRef};
pub use store::{fetch_child, MemoryNodeStore, NodeStore};
