//! Shared test utilities for the integration test suites.
//!
//! Import via `mod common;` from any test's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::{Map, Value};

pub use tessera::{
    Error, IndexedJsonDocument, JsonChunk, JsonChunker, JsonCursor, JsonLocation,
    JsonLocationOrdering, JsonPath, JsonScanner, LocationState, LocationStep, MemoryNodeStore,
    Node, NodeStore, ReadContext, ScanStep, TreeConfig, TreeCursor,
};

/// The document used by the chunk-boundary scenarios
pub const ABC_DOC: &str = r#"{"a":1,"b":[2,3,4],"c":"x"}"#;

// ============================================================================
// TestDoc - a stored document with direct access to its store
// ============================================================================

/// A document stored in its own in-memory store.
pub struct TestDoc {
    pub ctx: ReadContext,
    pub store: Arc<MemoryNodeStore>,
    pub doc: IndexedJsonDocument,
    pub chunks: Vec<JsonChunk>,
}

impl TestDoc {
    /// Store `bytes` split after the steps reaching `offsets`.
    pub fn split_at(bytes: &[u8], offsets: &[usize], config: TreeConfig) -> Self {
        let chunks = JsonChunker::split_at(bytes, offsets).expect("document should split");
        Self::from_chunks(chunks, config)
    }

    /// Store `bytes` split into chunks of at least `target` bytes.
    pub fn split_by_size(bytes: &[u8], target: usize, config: TreeConfig) -> Self {
        let chunks = JsonChunker::split_by_size(bytes, target).expect("document should split");
        Self::from_chunks(chunks, config)
    }

    /// Store already split chunks.
    pub fn from_chunks(chunks: Vec<JsonChunk>, config: TreeConfig) -> Self {
        let ctx = ReadContext::new();
        let store = Arc::new(MemoryNodeStore::new());
        let doc = IndexedJsonDocument::from_chunks(&ctx, store.clone(), chunks.clone(), &config)
            .expect("document should store");
        TestDoc {
            ctx,
            store,
            doc,
            chunks,
        }
    }

    /// Value at `path`, parsed from dotted notation (`""` is the root).
    pub fn lookup(&self, path: &str) -> Option<Vec<u8>> {
        self.doc
            .lookup(&self.ctx, &parse_path(path))
            .expect("lookup should succeed")
    }

    /// Cursor at `location`.
    pub fn cursor_at(&self, location: &JsonLocation) -> JsonCursor {
        self.doc
            .cursor_at(&self.ctx, location)
            .expect("cursor should open")
    }

    /// Root node of the stored tree.
    pub fn root(&self) -> Arc<Node> {
        self.store
            .read(&self.doc.root_ref())
            .expect("root should be stored")
    }
}

/// One chunk per leaf, narrow fanout: trees get tall quickly.
pub fn narrow_tree() -> TreeConfig {
    TreeConfig {
        entries_per_leaf: 1,
        fanout: 2,
        ..TreeConfig::default()
    }
}

/// Several chunks per leaf and a wider fanout.
pub fn packed_tree() -> TreeConfig {
    TreeConfig {
        entries_per_leaf: 3,
        fanout: 4,
        ..TreeConfig::default()
    }
}

pub fn parse_path(path: &str) -> JsonPath {
    path.parse().expect("test path should parse")
}

pub fn as_str(bytes: &[u8]) -> &str {
    std::str::from_utf8(bytes).expect("test bytes should be UTF-8")
}

// ============================================================================
// Walking documents
// ============================================================================

/// Every location a cursor passes through from its current position to the end.
pub fn remaining_locations(ctx: &ReadContext, cursor: &mut JsonCursor) -> Vec<JsonLocation> {
    let mut seen = Vec::new();
    loop {
        match cursor
            .advance_to_next_location(ctx)
            .expect("step should succeed")
        {
            LocationStep::EndOfDocument => return seen,
            LocationStep::Advanced | LocationStep::CrossedBoundary => {
                seen.push(cursor.current_location().clone())
            }
        }
    }
}

/// Every location a single scanner passes through over the whole document.
pub fn unsplit_locations(bytes: &[u8]) -> Vec<JsonLocation> {
    let mut scanner = JsonScanner::new(Arc::from(bytes));
    let mut seen = Vec::new();
    while scanner
        .advance_to_next_location()
        .expect("document should scan")
        == ScanStep::Advanced
    {
        seen.push(scanner.location().clone());
    }
    seen
}

/// Every value in `value` with its path, parents before children.
pub fn all_values(value: &Value) -> Vec<(JsonPath, Value)> {
    fn walk(value: &Value, path: JsonPath, out: &mut Vec<(JsonPath, Value)>) {
        out.push((path.clone(), value.clone()));
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    walk(child, path.clone().key(key.clone()), out);
                }
            }
            Value::Array(items) => {
                for (idx, child) in items.iter().enumerate() {
                    walk(child, path.clone().index(idx), out);
                }
            }
            _ => {}
        }
    }
    let mut out = Vec::new();
    walk(value, JsonPath::root(), &mut out);
    out
}

// ============================================================================
// Strategies
// ============================================================================

/// Arbitrary JSON values with plain object keys.
pub fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1000i64..1000).prop_map(Value::from),
        "[a-z \\\\\"]{0,6}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
            prop::collection::btree_map("[a-d]{1,3}", inner, 0..5)
                .prop_map(|members| Value::Object(members.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Up to eight requested cut offsets.
pub fn arb_offsets() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0usize..600, 0..8)
}
