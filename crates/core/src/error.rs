//! Error types for tessera
//!
//! This module defines all error types used by the storage core.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Boundary conditions (end of a chunk buffer, end of the tree, before the
//! first entry) are not errors. They are reported through step enums by the
//! scanner and cursors and consumed by the calling layer.

use crate::hash::ChunkHash;
use crate::json::JsonPath;
use std::io;
use thiserror::Error;

/// Result type alias for tessera operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the tessera storage core
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error surfaced by a node store
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// A node reference could not be resolved by the store
    #[error("Node not found: {0}")]
    NodeNotFound(ChunkHash),

    /// Stored bytes could not be decoded (malformed key, malformed node)
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// Chunk bytes are not a valid (partial) JSON document
    #[error("Malformed JSON at offset {offset}: {reason}")]
    MalformedJson {
        /// Byte offset within the chunk buffer
        offset: usize,
        /// What the scanner expected
        reason: String,
    },

    /// Document locations did not strictly increase while chunking
    #[error("Document locations out of order: {previous} then {next}")]
    UnorderedDocument {
        /// Location reached first
        previous: String,
        /// Location reached next, not greater than `previous`
        next: String,
    },

    /// The tree ended before the value being read was complete
    #[error("Document truncated while reading value at '{path}' ({bytes_read} bytes read)")]
    TruncatedDocument {
        /// Path of the value being read
        path: JsonPath,
        /// Bytes accumulated before the tree ran out
        bytes_read: usize,
    },

    /// Internal state that correct operation never produces
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Invalid operation or state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The read context was cancelled before a fetch
    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// Build a `MalformedJson` error
    pub fn malformed_json(offset: usize, reason: impl Into<String>) -> Self {
        Error::MalformedJson {
            offset,
            reason: reason.into(),
        }
    }

    /// Build a `Corruption` error
    pub fn corruption(msg: impl Into<String>) -> Self {
        Error::Corruption(msg.into())
    }

    /// Whether this error reports a state that should never happen in correct operation
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Error::InvariantViolation(_))
    }

    /// Whether this error came from resolving or decoding stored nodes
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            Error::IoError(_) | Error::NodeNotFound(_) | Error::Corruption(_)
        )
    }
}
