//! Reading values from documents split at known places
//!
//! - A value whose array body spans two chunks
//! - Seeking straight to an array element
//! - Scalars that never cross a boundary
//! - Every value of a larger document, under many chunkings

use serde_json::json;
use tessera::normalize_json;

use crate::common::*;

// ============================================================================
// {"a":1 | ,"b":[2,3 | ,4],"c":"x"}
// ============================================================================

fn abc() -> TestDoc {
    TestDoc::split_at(ABC_DOC.as_bytes(), &[6, 15], narrow_tree())
}

#[test]
fn chunks_split_where_requested() {
    let t = abc();
    let pieces: Vec<&str> = t.chunks.iter().map(|c| as_str(&c.bytes)).collect();
    assert_eq!(pieces, vec![r#"{"a":1"#, r#","b":[2,3"#, r#",4],"c":"x"}"#]);
    assert_eq!(t.doc.chunk_count(&t.ctx).unwrap(), 3);
}

#[test]
fn array_spanning_chunks_reads_whole() {
    let t = abc();
    assert_eq!(t.lookup("b").as_deref(), Some(&b"[2,3,4]"[..]));
}

#[test]
fn every_value_of_abc() {
    let t = abc();
    assert_eq!(t.lookup("a").as_deref(), Some(&b"1"[..]));
    assert_eq!(t.lookup("b[0]").as_deref(), Some(&b"2"[..]));
    assert_eq!(t.lookup("b[1]").as_deref(), Some(&b"3"[..]));
    assert_eq!(t.lookup("b[2]").as_deref(), Some(&b"4"[..]));
    assert_eq!(t.lookup("c").as_deref(), Some(&br#""x""#[..]));
    assert_eq!(t.lookup("").as_deref(), Some(ABC_DOC.as_bytes()));
    assert_eq!(t.lookup("d"), None);
}

#[test]
fn seek_to_array_element_fetches_one_path() {
    for config in [narrow_tree(), packed_tree()] {
        let t = TestDoc::split_at(ABC_DOC.as_bytes(), &[6, 15], config);
        let height = t.root().level() as u64;

        let before = t.store.read_count();
        let mut cursor = t.cursor_at(&JsonLocation::start_of(parse_path("b[1]")));
        assert_eq!(t.store.read_count() - before, height);

        assert_eq!(cursor.current_location(), &JsonLocation::start_of(parse_path("b[1]")));
        assert_eq!(cursor.next_byte(), Some(b'3'));
        assert_eq!(cursor.next_value(&t.ctx).unwrap(), b"3");
        assert_eq!(t.store.read_count() - before, height);
    }
}

#[test]
fn seek_lands_after_missing_location() {
    let t = abc();
    let cursor = t.cursor_at(&JsonLocation::start_of(parse_path("b[9]")));
    assert_eq!(cursor.current_location(), &JsonLocation::end_of(parse_path("b")));
    assert!(!cursor.at_start_of_value());
}

// ============================================================================
// Scalars
// ============================================================================

#[test]
fn scalar_document_matches_single_scan() {
    for bytes in [&b"\"hello\""[..], b"  -12.5e3 ", b"true", b"null"] {
        let t = TestDoc::split_by_size(bytes, 1, narrow_tree());
        let mut single = JsonScanner::new(std::sync::Arc::from(bytes));
        let start = single.offset();
        single.advance_to_next_location().unwrap();
        assert_eq!(t.lookup(""), Some(bytes[start..single.offset()].to_vec()));
    }
}

#[test]
fn scalar_inside_one_chunk() {
    let t = TestDoc::split_at(br#"{"k":[10,"twenty",30]}"#, &[3, 17], narrow_tree());
    assert_eq!(t.lookup("k[1]").as_deref(), Some(&br#""twenty""#[..]));
    assert_eq!(t.lookup("k[2]").as_deref(), Some(&b"30"[..]));
}

// ============================================================================
// Whole documents
// ============================================================================

#[test]
fn every_value_matches_serde_json() {
    let value = json!({
        "users": [
            {"id": 1, "name": "ada", "tags": ["x", "y"]},
            {"id": 2, "name": "grace", "tags": []},
        ],
        "meta": {"count": 2, "next": null, "nested": {"deep": [[1], [2, [3]]]}},
        "flag": false,
    });
    let bytes = normalize_json(&value);

    for target in [1, 3, 7, 16, 64, 4096] {
        for config in [narrow_tree(), packed_tree()] {
            let t = TestDoc::split_by_size(&bytes, target, config);
            assert_eq!(t.doc.to_bytes(&t.ctx).unwrap(), bytes);
            for (path, expected) in all_values(&value) {
                let found = t.doc.lookup(&t.ctx, &path).unwrap();
                assert_eq!(
                    found,
                    Some(normalize_json(&expected)),
                    "path {} with chunk target {}",
                    path,
                    target
                );
            }
        }
    }
}

#[test]
fn pretty_printed_values_parse_back() {
    let value = json!({
        "alpha": [1, 2, {"beta": "gamma"}],
        "delta": {"epsilon": [], "zeta": {}},
    });
    let bytes = serde_json::to_vec_pretty(&value).unwrap();

    for target in [1, 5, 20] {
        let t = TestDoc::split_by_size(&bytes, target, narrow_tree());
        for (path, expected) in all_values(&value) {
            let found = t.doc.lookup(&t.ctx, &path).unwrap().expect("value should exist");
            let parsed: serde_json::Value = serde_json::from_slice(&found).unwrap();
            assert_eq!(parsed, expected, "path {}", path);
            assert!(!found.starts_with(b" ") && !found.starts_with(b"\n"));
        }
    }
}
