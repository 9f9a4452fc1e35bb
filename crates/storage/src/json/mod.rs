//! JSON documents over chunked trees
//!
//! - [`JsonScanner`]: resumable scanner over one chunk's bytes
//! - [`JsonChunker`]: splits a document into location-keyed chunks
//! - [`JsonCursor`]: seeks and reads values across chunk boundaries
//! - [`IndexedJsonDocument`]: a stored document and its read operations

pub mod chunker;
pub mod cursor;
pub mod document;
pub mod scanner;

pub use chunker::{normalize_json, JsonChunk, JsonChunker};
pub use cursor::{predecessor_key, JsonCursor, LocationStep};
pub use document::IndexedJsonDocument;
pub use scanner::{JsonScanner, ScanStep};
