//! Behaviour at chunk boundaries
//!
//! - Seeking to a chunk's end location matches walking there
//! - Locations strictly increase across boundaries
//! - Cloned cursors move independently

use crate::common::*;

fn walked_from_start(t: &TestDoc) -> Vec<JsonLocation> {
    let mut cursor = t.cursor_at(&JsonLocation::start_of_document());
    let mut seen = vec![cursor.current_location().clone()];
    seen.extend(remaining_locations(&t.ctx, &mut cursor));
    seen
}

#[test]
fn seek_to_boundary_matches_walk() {
    let t = TestDoc::split_by_size(ABC_DOC.as_bytes(), 2, narrow_tree());
    let walk = walked_from_start(&t);

    for chunk in &t.chunks {
        let mut cursor = t.cursor_at(&chunk.end);
        assert_eq!(cursor.current_location(), &chunk.end);
        // the cursor rests at the end of the chunk keyed by this location
        assert_eq!(cursor.next_byte(), None);

        let position = walk
            .iter()
            .position(|l| l == &chunk.end)
            .expect("chunk end should be a walked location");
        assert_eq!(remaining_locations(&t.ctx, &mut cursor), walk[position + 1..].to_vec());
    }
}

#[test]
fn value_read_from_boundary_matches_walk() {
    let bytes = br#"{"a":[[1,2],[3,4]],"b":{"c":{"d":"e"}}}"#;
    let t = TestDoc::split_by_size(bytes, 3, packed_tree());
    for chunk in t.chunks.iter().filter(|c| c.end.is_start_of_value()) {
        let mut at_boundary = t.cursor_at(&chunk.end);
        let mut walked = t.cursor_at(&JsonLocation::start_of_document());
        walked.seek_to_location(&t.ctx, &chunk.end).unwrap();
        assert_eq!(walked.current_location(), &chunk.end);
        assert_eq!(
            at_boundary.next_value(&t.ctx).unwrap(),
            walked.next_value(&t.ctx).unwrap()
        );
    }
}

#[test]
fn locations_strictly_increase_across_boundaries() {
    for target in [1, 2, 5, 11] {
        let t = TestDoc::split_by_size(ABC_DOC.as_bytes(), target, narrow_tree());
        let walk = walked_from_start(&t);
        for pair in walk.windows(2) {
            assert!(pair[0] < pair[1], "{} then {}", pair[0], pair[1]);
        }
        assert_eq!(walk.last(), Some(&JsonLocation::end_of_document()));
        assert_eq!(walk[1..].to_vec(), unsplit_locations(ABC_DOC.as_bytes()));
    }
}

#[test]
fn crossing_is_reported_once_per_chunk() {
    let t = TestDoc::split_at(ABC_DOC.as_bytes(), &[6, 15], narrow_tree());
    let mut cursor = t.cursor_at(&JsonLocation::start_of_document());
    let mut crossings = 0;
    loop {
        match cursor.advance_to_next_location(&t.ctx).unwrap() {
            LocationStep::Advanced => {}
            LocationStep::CrossedBoundary => crossings += 1,
            LocationStep::EndOfDocument => break,
        }
    }
    assert_eq!(crossings, 2);
    assert!(!cursor.is_valid());
    assert_eq!(cursor.current_location(), &JsonLocation::end_of_document());
}

#[test]
fn cloned_cursor_moves_independently() {
    let t = TestDoc::split_at(ABC_DOC.as_bytes(), &[6, 15], narrow_tree());
    let cursor = t.cursor_at(&JsonLocation::start_of(parse_path("b")));
    let root_before = t.root();

    let mut lookahead = cursor.clone();
    assert_eq!(lookahead.next_value(&t.ctx).unwrap(), b"[2,3,4]");
    lookahead
        .seek_to_location(&t.ctx, &JsonLocation::start_of(parse_path("c")))
        .unwrap();

    assert_eq!(cursor.current_location(), &JsonLocation::start_of(parse_path("b")));
    assert_eq!(cursor.next_byte(), Some(b'['));
    let mut original = cursor;
    assert_eq!(original.next_value(&t.ctx).unwrap(), b"[2,3,4]");
    assert_eq!(*t.root(), *root_before);
}
