//! Key orderings for tree navigation
//!
//! Tree nodes keep their keys sorted under some ordering, and cursors must
//! search them with the same one. Keys are opaque bytes to the tree; the
//! ordering gives them meaning.

use std::cmp::Ordering;
use std::fmt;

use tracing::warn;

use crate::location::compare_encoded_locations;

/// Total order over encoded tree keys
///
/// Must be the same ordering that placed the entries into the tree.
pub trait KeyOrdering: Send + Sync + fmt::Debug {
    /// Compare two encoded keys
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering;
}

/// Plain byte order, usable for arbitrary keys
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicographicOrdering;

impl KeyOrdering for LexicographicOrdering {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        a.cmp(b)
    }
}

/// Document order over encoded [`JsonLocation`](crate::JsonLocation) keys
///
/// A comparator cannot fail, so a key that does not decode falls back to
/// byte order. Cursors that later decode such a key report the corruption.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLocationOrdering;

impl KeyOrdering for JsonLocationOrdering {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        match compare_encoded_locations(a, b) {
            Ok(ordering) => ordering,
            Err(e) => {
                warn!(error = %e, "undecodable location key, comparing bytewise");
                a.cmp(b)
            }
        }
    }
}
