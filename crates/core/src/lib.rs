//! Core types for tessera
//!
//! This crate defines the foundational types shared by the storage core:
//! - Error: Error type hierarchy
//! - ChunkHash: Content hash identifying a stored node
//! - JsonPath / PathSegment: Paths into a JSON document
//! - JsonLocation: Document position used as a tree key and scan position
//! - KeyOrdering: Comparators over encoded tree keys

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod hash;
pub mod json;
pub mod location;
pub mod ordering;

pub use error::{Error, Result};
pub use hash::{ChunkHash, ChunkHasher, CHUNK_HASH_LEN};
pub use json::{JsonPath, PathParseError, PathSegment, MAX_NESTING_DEPTH, MAX_PATH_LENGTH};
pub use location::{
    compare_encoded_locations, compare_json_locations, JsonLocation, LocationState,
};
pub use ordering::{JsonLocationOrdering, KeyOrdering, LexicographicOrdering};
