//! JSON path types
//!
//! This module defines how positions inside a stored JSON document are named:
//! - PathSegment: Individual path component (Key or Index)
//! - JsonPath: Path into a JSON document (e.g., `user.name` or `items[0]`)
//!
//! # Document Limits
//!
//! | Limit | Value | Constant |
//! |-------|-------|----------|
//! | Max nesting depth | 100 levels | [`MAX_NESTING_DEPTH`] |
//! | Max path length | 256 segments | [`MAX_PATH_LENGTH`] |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// Document Limits
// =============================================================================

/// Maximum nesting depth in a JSON document (100 levels)
///
/// The scanner rejects documents that open more containers than this.
pub const MAX_NESTING_DEPTH: usize = 100;

/// Maximum path length in segments (256 segments)
///
/// Encoded location keys with longer paths are treated as corrupt.
pub const MAX_PATH_LENGTH: usize = 256;

// =============================================================================
// JsonPath and PathSegment
// =============================================================================

/// Error type for JSON path parsing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathParseError {
    /// Empty key in path
    #[error("empty key in path at position {0}")]
    EmptyKey(usize),
    /// Unclosed bracket
    #[error("unclosed bracket starting at position {0}")]
    UnclosedBracket(usize),
    /// Invalid array index
    #[error("invalid array index at position {0}: {1}")]
    InvalidIndex(usize, String),
    /// Unexpected character
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),
}

/// A segment in a JSON path
///
/// Paths are composed of key segments (object property access)
/// and index segments (array element access).
///
/// Key segments hold the key text exactly as it appears between the quotes
/// in the serialized document, escapes included. Segments order keys
/// bytewise and indices numerically; a key sorts before an index.
///
/// # Examples
///
/// ```
/// use tessera_core::json::PathSegment;
///
/// let key = PathSegment::Key("name".to_string());
/// let idx = PathSegment::Index(0);
/// assert!(key < idx);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PathSegment {
    /// Object key: `.foo`
    Key(String),
    /// Array index: `[0]`
    Index(usize),
}

/// A path into a JSON document
///
/// JsonPath represents a location within a JSON document using a sequence
/// of key and index segments.
///
/// | Syntax | Meaning | Example |
/// |--------|---------|---------|
/// | `.key` | Object property | `.user` |
/// | `[n]` | Array index | `[0]` |
/// | `.key[n]` | Property then index | `.items[0]` |
/// | (empty) | Root | `` |
///
/// # Examples
///
/// ```
/// use tessera_core::json::JsonPath;
///
/// let first_item = JsonPath::root().key("items").index(0);
/// let path: JsonPath = "items[0]".parse().unwrap();
/// assert_eq!(path, first_item);
/// assert_eq!(path.to_string(), "items[0]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct JsonPath {
    segments: Vec<PathSegment>,
}

impl JsonPath {
    /// Create the root path (empty path)
    pub fn root() -> Self {
        JsonPath {
            segments: Vec::new(),
        }
    }

    /// Get the path segments
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Get the number of segments in the path
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if this is the root path (empty)
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Check if this is the root path
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a key segment (builder pattern)
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Key(key.into()));
        self
    }

    /// Append an index segment (builder pattern)
    pub fn index(mut self, idx: usize) -> Self {
        self.segments.push(PathSegment::Index(idx));
        self
    }

    /// Push a key segment (mutating)
    pub fn push_key(&mut self, key: impl Into<String>) {
        self.segments.push(PathSegment::Key(key.into()));
    }

    /// Push an index segment (mutating)
    pub fn push_index(&mut self, idx: usize) {
        self.segments.push(PathSegment::Index(idx));
    }

    /// Remove and return the last segment
    pub fn pop(&mut self) -> Option<PathSegment> {
        self.segments.pop()
    }

    /// Get the last segment (None if root)
    pub fn last_segment(&self) -> Option<&PathSegment> {
        self.segments.last()
    }
}

impl FromStr for JsonPath {
    type Err = PathParseError;

    /// Parse a path from a string
    ///
    /// Supported syntax:
    /// - `foo` or `.foo` - object key
    /// - `[0]` - array index
    /// - `foo.bar` - nested keys
    /// - `foo[0].bar` - mixed
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut segments = Vec::new();
        let mut chars = s.char_indices().peekable();
        chars.next_if(|&(_, c)| c == '.');

        while let Some((pos, c)) = chars.next() {
            match c {
                '.' => match chars.peek() {
                    None => return Err(PathParseError::EmptyKey(s.len())),
                    Some(&(next, '.')) => return Err(PathParseError::EmptyKey(next)),
                    Some(_) => {}
                },
                '[' => {
                    let mut digits = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == ']' {
                            closed = true;
                            break;
                        }
                        digits.push(c);
                    }
                    if !closed {
                        return Err(PathParseError::UnclosedBracket(pos));
                    }
                    let idx = digits
                        .parse::<usize>()
                        .map_err(|_| PathParseError::InvalidIndex(pos + 1, digits))?;
                    segments.push(PathSegment::Index(idx));
                }
                c if is_key_char(c) => {
                    let mut key = String::from(c);
                    while let Some((_, c)) = chars.next_if(|&(_, c)| is_key_char(c)) {
                        key.push(c);
                    }
                    segments.push(PathSegment::Key(key));
                }
                other => return Err(PathParseError::UnexpectedChar(other, pos)),
            }
        }

        Ok(JsonPath { segments })
    }
}

fn is_key_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(k) if i == 0 => f.write_str(k)?,
                PathSegment::Key(k) => write!(f, ".{}", k)?,
                PathSegment::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}
