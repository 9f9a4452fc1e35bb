//! Document locations
//!
//! A [`JsonLocation`] names a point in a serialized JSON document that a
//! scanner can stop at between tokens: a path plus where the scanner sits
//! relative to the value at that path. Locations serve double duty as tree
//! keys: every chunk of a stored document is keyed by the encoded location
//! at which the chunk ends.
//!
//! # Ordering
//!
//! Locations are ordered the way they occur in the document:
//!
//! 1. Path segments are compared pairwise (keys bytewise, indices numerically).
//! 2. When one path is a strict prefix of the other, the shorter location comes
//!    first, unless it is the *end* of its value, which follows everything
//!    nested inside it.
//! 3. Equal paths compare by state: start, just inside `{` or `[`, end.
//!
//! A scanner reaches locations in exactly this order as long as the
//! document's object keys appear in ascending byte order.
//!
//! # Key Encoding
//!
//! ```text
//! +-------+---------------------------------------------+
//! | state | segment*                                    |
//! | u8    | 0x01 len:u32be key-bytes | 0x02 index:u64be |
//! +-------+---------------------------------------------+
//! ```

use std::cmp::Ordering;
use std::fmt;

use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use smallvec::SmallVec;

use crate::error::{Error, Result};
use crate::json::{JsonPath, PathSegment, MAX_PATH_LENGTH};

const TAG_KEY: u8 = 0x01;
const TAG_INDEX: u8 = 0x02;

/// Where a scanner sits relative to the value at a location's path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum LocationState {
    /// At the first byte of the value
    StartOfValue = 0,
    /// Just past the `{` of an object, before its first member
    ObjectStart = 1,
    /// Just past the `[` of an array, before its first element
    ArrayStart = 2,
    /// Just past the last byte of the value
    EndOfValue = 3,
}

impl LocationState {
    /// Encoded tag byte
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Decode a tag byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(LocationState::StartOfValue),
            1 => Some(LocationState::ObjectStart),
            2 => Some(LocationState::ArrayStart),
            3 => Some(LocationState::EndOfValue),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            LocationState::StartOfValue => "start",
            LocationState::ObjectStart => "object",
            LocationState::ArrayStart => "array",
            LocationState::EndOfValue => "end",
        }
    }
}

/// A point in a serialized JSON document
///
/// # Examples
///
/// ```
/// use tessera_core::{JsonLocation, JsonPath};
///
/// let b = JsonLocation::start_of(JsonPath::root().key("b"));
/// let b1 = JsonLocation::start_of(JsonPath::root().key("b").index(1));
/// assert!(b < b1);
/// assert!(b1 < JsonLocation::end_of(JsonPath::root().key("b")));
///
/// let decoded = JsonLocation::decode(&b1.encode()).unwrap();
/// assert_eq!(decoded, b1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JsonLocation {
    path: JsonPath,
    state: LocationState,
}

impl JsonLocation {
    /// Create a location
    pub fn new(path: JsonPath, state: LocationState) -> Self {
        JsonLocation { path, state }
    }

    /// The first byte of the document
    pub fn start_of_document() -> Self {
        Self::start_of(JsonPath::root())
    }

    /// Past the last byte of the document; the greatest location
    pub fn end_of_document() -> Self {
        Self::end_of(JsonPath::root())
    }

    /// Start of the value at `path`
    pub fn start_of(path: JsonPath) -> Self {
        Self::new(path, LocationState::StartOfValue)
    }

    /// End of the value at `path`
    pub fn end_of(path: JsonPath) -> Self {
        Self::new(path, LocationState::EndOfValue)
    }

    /// Path of the value this location refers to
    pub fn path(&self) -> &JsonPath {
        &self.path
    }

    /// Mutable access to the path, for scanners stepping through a document
    pub fn path_mut(&mut self) -> &mut JsonPath {
        &mut self.path
    }

    /// Scanner state at this location
    pub fn state(&self) -> LocationState {
        self.state
    }

    /// Replace the scanner state
    pub fn set_state(&mut self, state: LocationState) {
        self.state = state;
    }

    /// Whether this location is the start of a value
    pub fn is_start_of_value(&self) -> bool {
        self.state == LocationState::StartOfValue
    }

    /// Encode as a tree key
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + self.path.len() * 9);
        buf.push(self.state.as_byte());
        for segment in self.path.segments() {
            match segment {
                PathSegment::Key(key) => {
                    let mut len = [0u8; 4];
                    BigEndian::write_u32(&mut len, key.len() as u32);
                    buf.push(TAG_KEY);
                    buf.extend_from_slice(&len);
                    buf.extend_from_slice(key.as_bytes());
                }
                PathSegment::Index(idx) => {
                    let mut index = [0u8; 8];
                    BigEndian::write_u64(&mut index, *idx as u64);
                    buf.push(TAG_INDEX);
                    buf.extend_from_slice(&index);
                }
            }
        }
        buf
    }

    /// Decode a tree key
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (state, raw) = decode_raw(bytes)?;
        let mut path = JsonPath::root();
        for segment in raw {
            match segment {
                RawSegment::Key(key) => {
                    let key = std::str::from_utf8(key)
                        .map_err(|_| Error::corruption("location key segment is not UTF-8"))?;
                    path.push_key(key);
                }
                RawSegment::Index(idx) => {
                    let idx = usize::try_from(idx).map_err(|_| {
                        Error::corruption(format!("location index {} overflows usize", idx))
                    })?;
                    path.push_index(idx);
                }
            }
        }
        Ok(JsonLocation { path, state })
    }
}

impl PartialOrd for JsonLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for JsonLocation {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_json_locations(self, other)
    }
}

impl fmt::Display for JsonLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            write!(f, "$@{}", self.state.label())
        } else {
            write!(f, "{}@{}", self.path, self.state.label())
        }
    }
}

/// Compare two locations in document order
pub fn compare_json_locations(a: &JsonLocation, b: &JsonLocation) -> Ordering {
    compare_parts(a.path.segments(), a.state, b.path.segments(), b.state)
}

/// Compare two encoded locations without materializing their paths
pub fn compare_encoded_locations(a: &[u8], b: &[u8]) -> Result<Ordering> {
    let (a_state, a_segments) = decode_raw(a)?;
    let (b_state, b_segments) = decode_raw(b)?;
    Ok(compare_parts(&a_segments, a_state, &b_segments, b_state))
}

fn compare_parts<T: Ord>(
    a: &[T],
    a_state: LocationState,
    b: &[T],
    b_state: LocationState,
) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.cmp(y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    match a.len().cmp(&b.len()) {
        // `a` encloses `b`: its start precedes, its end follows
        Ordering::Less if a_state == LocationState::EndOfValue => Ordering::Greater,
        Ordering::Less => Ordering::Less,
        Ordering::Greater if b_state == LocationState::EndOfValue => Ordering::Less,
        Ordering::Greater => Ordering::Greater,
        Ordering::Equal => a_state.cmp(&b_state),
    }
}

/// Borrowed path segment read straight out of an encoded key
///
/// Ordered exactly like [`PathSegment`]: keys before indices, keys bytewise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum RawSegment<'a> {
    Key(&'a [u8]),
    Index(u64),
}

fn decode_raw(bytes: &[u8]) -> Result<(LocationState, SmallVec<[RawSegment<'_>; 8]>)> {
    let truncated = |_| Error::corruption("truncated location key");
    let mut rdr = bytes;

    let state_byte = rdr.read_u8().map_err(truncated)?;
    let state = LocationState::from_byte(state_byte).ok_or_else(|| {
        Error::corruption(format!("unknown location state {:#04x}", state_byte))
    })?;

    let mut segments = SmallVec::new();
    while !rdr.is_empty() {
        if segments.len() == MAX_PATH_LENGTH {
            return Err(Error::corruption(format!(
                "location path exceeds {} segments",
                MAX_PATH_LENGTH
            )));
        }
        match rdr.read_u8().map_err(truncated)? {
            TAG_KEY => {
                let len = rdr.read_u32::<BigEndian>().map_err(truncated)? as usize;
                if rdr.len() < len {
                    return Err(Error::corruption("truncated location key segment"));
                }
                let (key, rest) = rdr.split_at(len);
                segments.push(RawSegment::Key(key));
                rdr = rest;
            }
            TAG_INDEX => {
                let idx = rdr.read_u64::<BigEndian>().map_err(truncated)?;
                segments.push(RawSegment::Index(idx));
            }
            tag => {
                return Err(Error::corruption(format!(
                    "unknown location segment tag {:#04x}",
                    tag
                )))
            }
        }
    }
    Ok((state, segments))
}
