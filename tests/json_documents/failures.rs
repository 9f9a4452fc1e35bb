//! Failure handling
//!
//! - A tree that ends inside a value is a hard error, never partial bytes
//! - Lost chunks surface as NodeNotFound
//! - Cancellation is honoured at every fetch
//! - A failed fetch can be retried without losing locations
//! - Misuse of the cursor is reported as an invariant violation

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tessera::ChunkHash;

use crate::common::*;

// ============================================================================
// Truncation
// ============================================================================

#[test]
fn value_cut_off_by_end_of_tree_is_an_error() {
    let mut chunks = JsonChunker::split_at(ABC_DOC.as_bytes(), &[6, 15]).unwrap();
    chunks.pop();
    let t = TestDoc::from_chunks(chunks, narrow_tree());

    let err = t.doc.lookup(&t.ctx, &parse_path("b")).unwrap_err();
    match err {
        Error::TruncatedDocument { path, bytes_read } => {
            assert_eq!(path, parse_path("b"));
            assert_eq!(bytes_read, 4);
        }
        other => panic!("expected TruncatedDocument, got {}", other),
    }
    assert!(matches!(
        t.doc.lookup(&t.ctx, &JsonPath::root()),
        Err(Error::TruncatedDocument { .. })
    ));

    // values that end before the cut are unaffected
    assert_eq!(t.lookup("a").as_deref(), Some(&b"1"[..]));
    assert_eq!(t.lookup("b[1]").as_deref(), Some(&b"3"[..]));
}

#[test]
fn locations_past_end_of_tree_are_corruption() {
    let mut chunks = JsonChunker::split_at(ABC_DOC.as_bytes(), &[6, 15]).unwrap();
    chunks.pop();
    let t = TestDoc::from_chunks(chunks, narrow_tree());
    let c_start = JsonLocation::start_of(parse_path("c"));

    let err = t.doc.cursor_at(&t.ctx, &c_start).unwrap_err();
    assert!(matches!(err, Error::Corruption(_)));

    // seeking there from an earlier location fails the same way
    let mut cursor = t.cursor_at(&JsonLocation::start_of(parse_path("a")));
    let err = cursor.seek_to_location(&t.ctx, &c_start).unwrap_err();
    assert!(matches!(err, Error::Corruption(_)));
    assert!(cursor.current_location() < &c_start);
}

// ============================================================================
// Missing nodes
// ============================================================================

#[test]
fn lost_chunk_is_node_not_found() {
    let t = TestDoc::split_at(ABC_DOC.as_bytes(), &[6, 15], narrow_tree());
    let last_leaf = TreeCursor::seek_to_key(
        &t.ctx,
        t.store.clone(),
        t.root(),
        &JsonLocation::end_of_document().encode(),
        &JsonLocationOrdering,
    )
    .unwrap()
    .node()
    .hash();
    assert!(t.store.remove(&last_leaf));

    assert_eq!(t.lookup("a").as_deref(), Some(&b"1"[..]));
    let err = t.doc.lookup(&t.ctx, &parse_path("c")).unwrap_err();
    assert!(matches!(err, Error::NodeNotFound(hash) if hash == last_leaf));
    assert!(err.is_storage_error());

    // reading b crosses into the lost chunk
    let err = t.doc.lookup(&t.ctx, &parse_path("b")).unwrap_err();
    assert!(matches!(err, Error::NodeNotFound(_)));
    assert!(t.doc.to_bytes(&t.ctx).is_err());
}

#[test]
fn opening_a_missing_root_fails() {
    let t = TestDoc::split_at(ABC_DOC.as_bytes(), &[6], narrow_tree());
    let empty: Arc<dyn NodeStore> = Arc::new(MemoryNodeStore::new());
    let err = IndexedJsonDocument::from_root(&t.ctx, empty, t.doc.root_ref()).unwrap_err();
    assert!(matches!(err, Error::NodeNotFound(_)));
}

// ============================================================================
// Transient store errors
// ============================================================================

struct FlakyStore {
    inner: Arc<MemoryNodeStore>,
    fail_next: AtomicBool,
}

impl NodeStore for FlakyStore {
    fn read(&self, hash: &ChunkHash) -> tessera::Result<Arc<Node>> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(Error::IoError(io::Error::new(
                io::ErrorKind::Other,
                "transient read failure",
            )));
        }
        self.inner.read(hash)
    }

    fn write(&self, node: Node) -> tessera::Result<ChunkHash> {
        self.inner.write(node)
    }

    fn contains(&self, hash: &ChunkHash) -> bool {
        self.inner.contains(hash)
    }
}

#[test]
fn step_after_failed_crossing_resumes_in_place() {
    let t = TestDoc::split_at(ABC_DOC.as_bytes(), &[6, 15], narrow_tree());
    let flaky = Arc::new(FlakyStore {
        inner: t.store.clone(),
        fail_next: AtomicBool::new(false),
    });
    let doc = IndexedJsonDocument::from_root(&t.ctx, flaky.clone(), t.doc.root_ref()).unwrap();
    let mut cursor = doc
        .cursor_at(&t.ctx, &JsonLocation::start_of_document())
        .unwrap();

    // the first crossing into the second chunk fails once
    flaky.fail_next.store(true, Ordering::SeqCst);
    let mut seen = Vec::new();
    let mut failures = 0;
    loop {
        match cursor.advance_to_next_location(&t.ctx) {
            Err(Error::IoError(_)) => failures += 1,
            Err(other) => panic!("unexpected error {}", other),
            Ok(LocationStep::EndOfDocument) => break,
            Ok(_) => seen.push(cursor.current_location().clone()),
        }
    }
    assert_eq!(failures, 1);
    assert_eq!(seen, unsplit_locations(ABC_DOC.as_bytes()));
}

// ============================================================================
// Cancellation
// ============================================================================

#[test]
fn cancelled_context_stops_reads() {
    let t = TestDoc::split_at(ABC_DOC.as_bytes(), &[6, 15], narrow_tree());
    let ctx = ReadContext::new();
    let mut cursor = t.doc.cursor_at(&ctx, &JsonLocation::start_of(parse_path("b"))).unwrap();

    let handle = ctx.clone();
    handle.cancel();
    assert!(ctx.is_cancelled());

    // the value continues in the next chunk, which can no longer be fetched
    assert!(matches!(cursor.next_value(&ctx), Err(Error::Cancelled)));
    assert!(matches!(
        t.doc.lookup(&ctx, &parse_path("a")),
        Err(Error::Cancelled)
    ));
    // other contexts are unaffected
    assert_eq!(t.lookup("a").as_deref(), Some(&b"1"[..]));
}

// ============================================================================
// Misuse
// ============================================================================

#[test]
fn next_value_away_from_value_start() {
    let t = TestDoc::split_at(ABC_DOC.as_bytes(), &[6, 15], narrow_tree());
    for location in [
        JsonLocation::end_of(parse_path("a")),
        JsonLocation::new(parse_path("b"), LocationState::ArrayStart),
        JsonLocation::end_of_document(),
    ] {
        let mut cursor = t.cursor_at(&location);
        let err = cursor.next_value(&t.ctx).unwrap_err();
        assert!(err.is_invariant_violation(), "{}", err);
        // the cursor is left where it was
        assert_eq!(cursor.current_location(), &location);
    }
}

#[test]
fn empty_tree_has_no_cursor() {
    let ctx = ReadContext::new();
    let store: Arc<dyn NodeStore> = Arc::new(MemoryNodeStore::new());
    let err = JsonCursor::new(
        &ctx,
        store,
        Arc::new(Node::empty_leaf()),
        &JsonLocation::start_of_document(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidOperation(_)));
}
