//! Content hashes identifying stored nodes
//!
//! A node's identity is a pure function of its contents. We use the 128-bit
//! xxh3 digest: nodes only need collision resistance against accidental
//! duplicates inside one store, not against adversarial input.

use std::fmt;
use xxhash_rust::xxh3::{xxh3_128, Xxh3};

/// Size of a chunk hash in bytes
pub const CHUNK_HASH_LEN: usize = 16;

/// Content hash of a node (128-bit xxh3, big-endian bytes)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ChunkHash([u8; CHUNK_HASH_LEN]);

impl ChunkHash {
    /// Hash a single byte slice
    pub fn of(bytes: &[u8]) -> Self {
        ChunkHash(xxh3_128(bytes).to_be_bytes())
    }

    /// Wrap raw hash bytes
    pub fn from_bytes(bytes: [u8; CHUNK_HASH_LEN]) -> Self {
        ChunkHash(bytes)
    }

    /// Raw hash bytes
    pub fn as_bytes(&self) -> &[u8; CHUNK_HASH_LEN] {
        &self.0
    }

    /// Lowercase hex rendering
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for ChunkHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ChunkHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkHash({})", &self.to_hex()[..8])
    }
}

/// Streaming hasher for building a [`ChunkHash`] from several fields
///
/// Every variable-length field is length-prefixed so that field boundaries
/// are part of the digest.
pub struct ChunkHasher {
    inner: Xxh3,
}

impl ChunkHasher {
    /// Create an empty hasher
    pub fn new() -> Self {
        ChunkHasher { inner: Xxh3::new() }
    }

    /// Feed a fixed-width integer
    pub fn write_u64(&mut self, value: u64) -> &mut Self {
        self.inner.update(&value.to_be_bytes());
        self
    }

    /// Feed a length-prefixed byte field
    pub fn write_field(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_u64(bytes.len() as u64);
        self.inner.update(bytes);
        self
    }

    /// Finish and produce the hash
    pub fn finish(&self) -> ChunkHash {
        ChunkHash(self.inner.digest128().to_be_bytes())
    }
}

impl Default for ChunkHasher {
    fn default() -> Self {
        Self::new()
    }
}
