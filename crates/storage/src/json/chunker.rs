//! Splitting serialized documents into keyed chunks
//!
//! A document is scanned once from the top. Each chunk ends right after a
//! scanner step and is keyed by the location that step reached, so the key
//! of one chunk is exactly the location a scanner for the next chunk
//! resumes from. The last chunk always runs to the end of the input and is
//! keyed by the end of the document.
//!
//! The step that enters an array's first element is never a cut point: it
//! is decided by peeking at a byte it does not consume, and a scanner that
//! stops before that byte cannot repeat the decision.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use tessera_core::{Error, JsonLocation, LocationState, Result};

use super::scanner::{JsonScanner, ScanStep};

/// One keyed piece of a serialized document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonChunk {
    /// Location reached at the last byte of the chunk
    pub end: JsonLocation,
    /// Raw document bytes
    pub bytes: Vec<u8>,
}

impl JsonChunk {
    /// Encoded tree key of this chunk
    pub fn key(&self) -> Vec<u8> {
        self.end.encode()
    }
}

/// Splits serialized JSON into chunks at scanner step boundaries
pub struct JsonChunker;

impl JsonChunker {
    /// Cut after the first step reaching each of `offsets`
    ///
    /// Offsets that fall inside the final step, or past the end of the
    /// document, produce no cut. Offsets reached by the same step collapse
    /// into one cut.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedJson`] for input that is not one complete
    /// JSON value, or [`Error::UnorderedDocument`] if locations do not
    /// strictly increase (object keys out of byte order, or repeated).
    pub fn split_at(document: &[u8], offsets: &[usize]) -> Result<Vec<JsonChunk>> {
        let mut offsets = offsets.to_vec();
        offsets.sort_unstable();
        let mut next = 0;
        split(document, |_, offset| {
            if next < offsets.len() && offset >= offsets[next] {
                while next < offsets.len() && offsets[next] <= offset {
                    next += 1;
                }
                true
            } else {
                false
            }
        })
    }

    /// Cut as soon as a chunk holds at least `target` bytes
    ///
    /// # Errors
    ///
    /// As [`split_at`](Self::split_at), plus [`Error::InvalidConfig`] for a
    /// zero target.
    pub fn split_by_size(document: &[u8], target: usize) -> Result<Vec<JsonChunk>> {
        if target == 0 {
            return Err(Error::InvalidConfig(
                "chunk size target must be at least 1".to_string(),
            ));
        }
        split(document, |chunk_start, offset| offset - chunk_start >= target)
    }
}

fn split(
    document: &[u8],
    mut cut_here: impl FnMut(usize, usize) -> bool,
) -> Result<Vec<JsonChunk>> {
    let mut scanner = JsonScanner::new(Arc::from(document));
    let mut previous = scanner.location().clone();
    let mut chunks = Vec::new();
    let mut chunk_start = 0;

    while scanner.advance_to_next_location()? == ScanStep::Advanced {
        let location = scanner.location();
        if *location <= previous {
            return Err(Error::UnorderedDocument {
                previous: previous.to_string(),
                next: location.to_string(),
            });
        }

        let enters_first_element = previous.state() == LocationState::ArrayStart
            && location.state() == LocationState::StartOfValue;
        let offset = scanner.offset();
        if !enters_first_element
            && *location != JsonLocation::end_of_document()
            && offset > chunk_start
            && cut_here(chunk_start, offset)
        {
            chunks.push(JsonChunk {
                end: location.clone(),
                bytes: document[chunk_start..offset].to_vec(),
            });
            chunk_start = offset;
        }
        previous = location.clone();
    }

    if *scanner.location() != JsonLocation::end_of_document() {
        return Err(Error::malformed_json(
            scanner.offset(),
            format!("document ends at {}", scanner.location()),
        ));
    }
    chunks.push(JsonChunk {
        end: JsonLocation::end_of_document(),
        bytes: document[chunk_start..].to_vec(),
    });
    debug!(bytes = document.len(), chunks = chunks.len(), "split document");
    Ok(chunks)
}

/// Serialize `value` compactly, with object keys in ascending byte order
///
/// Keys are ordered by their escaped form, which is how stored locations
/// compare them.
pub fn normalize_json(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    write_normalized(value, &mut out);
    out
}

fn write_normalized(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Object(map) => {
            let mut members: Vec<(String, &Value)> = map
                .iter()
                .map(|(key, value)| (Value::String(key.clone()).to_string(), value))
                .collect();
            // quoted keys: compare the escaped text between the quotes
            members.sort_by(|a, b| a.0[1..a.0.len() - 1].cmp(&b.0[1..b.0.len() - 1]));

            out.push(b'{');
            for (i, (key, value)) in members.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                out.extend_from_slice(key.as_bytes());
                out.push(b':');
                write_normalized(value, out);
            }
            out.push(b'}');
        }
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_normalized(item, out);
            }
            out.push(b']');
        }
        scalar => out.extend_from_slice(scalar.to_string().as_bytes()),
    }
}
