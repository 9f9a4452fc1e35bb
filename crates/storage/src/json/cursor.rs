//! Reading documents stored across chunks
//!
//! A [`JsonCursor`] pairs a [`TreeCursor`] over a document tree with a
//! [`JsonScanner`] over the payload of the leaf entry it sits on. The
//! scanner reports the end of its buffer; the cursor answers by moving the
//! tree cursor and handing the scanner the next payload, resuming from the
//! location the previous payload ended at.
//!
//! Every payload must end exactly where its key says. The cursor checks
//! this each time it leaves a payload, so a tree whose keys disagree with
//! its bytes fails with [`Error::Corruption`] instead of being rescanned
//! forever.

use std::sync::Arc;

use tracing::{debug, warn};

use tessera_core::{Error, JsonLocation, JsonLocationOrdering, Result};

use super::scanner::{JsonScanner, ScanStep};
use crate::context::ReadContext;
use crate::cursor::{Position, TreeCursor};
use crate::node::Node;
use crate::store::NodeStore;

/// Outcome of [`JsonCursor::advance_to_next_location`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationStep {
    /// Moved to a new location within the same payload
    Advanced,
    /// Moved to a new location after switching to a later payload
    CrossedBoundary,
    /// The tree has no more payloads; the location is unchanged
    EndOfDocument,
}

/// Key of the entry before the one `cursor` is on, or `None` at the first entry
///
/// That key is the location at which the current payload begins. At the
/// first entry of a leaf the key is taken from the parent level, so the
/// previous leaf is never fetched.
///
/// # Errors
///
/// Returns [`Error::InvalidOperation`] if `cursor` is not at an entry, or
/// any error from fetching ancestor siblings.
pub fn predecessor_key(ctx: &ReadContext, cursor: &TreeCursor) -> Result<Option<Vec<u8>>> {
    if !cursor.is_valid() {
        return Err(Error::InvalidOperation(format!(
            "no predecessor for a cursor at {:?}",
            cursor.position()
        )));
    }
    match cursor.position() {
        Position::Entry(idx) if idx > 0 => Ok(cursor.node().key(idx - 1).map(<[u8]>::to_vec)),
        _ => {
            let Some(parent) = cursor.parent() else {
                return Ok(None);
            };
            let mut parent = parent.clone();
            parent.retreat(ctx)?;
            if parent.is_valid() {
                Ok(Some(parent.current_key()?.to_vec()))
            } else {
                Ok(None)
            }
        }
    }
}

/// Cursor over a JSON document stored in a tree keyed by [`JsonLocation`]
#[derive(Debug, Clone)]
pub struct JsonCursor {
    cursor: TreeCursor,
    scanner: JsonScanner,
}

impl JsonCursor {
    /// Open a cursor at `start`
    ///
    /// If `start` is not a location the document passes through, the
    /// cursor stops at the first location after it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] for an empty tree,
    /// [`Error::Corruption`] if the tree's keys end before `start`, and any
    /// fetch, decode or scan error met on the way.
    pub fn new(
        ctx: &ReadContext,
        store: Arc<dyn NodeStore>,
        root: Arc<Node>,
        start: &JsonLocation,
    ) -> Result<Self> {
        if root.is_empty() {
            return Err(Error::InvalidOperation(
                "cannot open a cursor over an empty document tree".to_string(),
            ));
        }
        let cursor =
            TreeCursor::seek_to_key(ctx, store, root, &start.encode(), &JsonLocationOrdering)?;
        if !cursor.is_valid() {
            return Err(tree_ends_before(start));
        }
        let previous = predecessor_key(ctx, &cursor)?;
        let scanner = JsonScanner::from_middle_with_key(
            Arc::clone(cursor.current_value()?),
            previous.as_deref(),
        )?;

        let mut json = JsonCursor { cursor, scanner };
        json.seek_to_location(ctx, start)?;
        Ok(json)
    }

    /// Move forward to `location`, or the first location after it
    ///
    /// Payloads between the current one and the target are skipped through
    /// the tree rather than scanned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Corruption`] if the tree's keys end before
    /// `location`. The cursor then stays at the end of the last payload it
    /// scanned.
    pub fn seek_to_location(&mut self, ctx: &ReadContext, location: &JsonLocation) -> Result<()> {
        let key = location.encode();
        while self.scanner.location() < location {
            match self.scanner.advance_to_next_location()? {
                ScanStep::Advanced => {}
                ScanStep::EndOfBuffer => {
                    self.verify_chunk_end()?;
                    let mut moved = self.cursor.clone();
                    moved.seek(ctx, &key, &JsonLocationOrdering)?;
                    if !moved.is_valid() {
                        return Err(tree_ends_before(location));
                    }
                    self.cursor = moved;
                    debug!(
                        seek_to = %location,
                        from = %self.scanner.location(),
                        "re-seeking document cursor"
                    );
                    let previous = predecessor_key(ctx, &self.cursor)?;
                    self.scanner = JsonScanner::from_middle_with_key(
                        Arc::clone(self.cursor.current_value()?),
                        previous.as_deref(),
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Take one step through the document, crossing into later payloads as needed
    pub fn advance_to_next_location(&mut self, ctx: &ReadContext) -> Result<LocationStep> {
        let mut crossed = false;
        loop {
            if !self.cursor.is_valid() {
                return Ok(LocationStep::EndOfDocument);
            }
            match self.scanner.advance_to_next_location()? {
                ScanStep::Advanced if crossed => return Ok(LocationStep::CrossedBoundary),
                ScanStep::Advanced => return Ok(LocationStep::Advanced),
                ScanStep::EndOfBuffer => {
                    self.verify_chunk_end()?;
                    self.cursor.advance(ctx)?;
                    if !self.cursor.is_valid() {
                        return Ok(LocationStep::EndOfDocument);
                    }
                    debug!(location = %self.scanner.location(), "crossed chunk boundary");
                    let location = self.scanner.location().clone();
                    self.scanner = JsonScanner::from_middle(
                        Arc::clone(self.cursor.current_value()?),
                        location,
                    );
                    crossed = true;
                }
            }
        }
    }

    /// Read the whole value starting at the current location
    ///
    /// Returns the value's serialized bytes exactly as stored, however many
    /// payloads they span, and leaves the cursor at the end of the value.
    ///
    /// # Errors
    ///
    /// - [`Error::InvariantViolation`] if the cursor is not at the start of a value
    /// - [`Error::TruncatedDocument`] if the tree ends before the value does
    pub fn next_value(&mut self, ctx: &ReadContext) -> Result<Vec<u8>> {
        if !self.scanner.at_start_of_value() {
            return Err(Error::InvariantViolation(format!(
                "next_value called at {}, which is not the start of a value",
                self.scanner.location()
            )));
        }
        let path = self.scanner.location().path().clone();
        let end = JsonLocation::end_of(path.clone());

        let mut value = Vec::new();
        let mut buffer = Arc::clone(self.scanner.buffer());
        let mut start = self.scanner.offset();
        while *self.scanner.location() < end {
            match self.advance_to_next_location(ctx)? {
                LocationStep::Advanced => {}
                LocationStep::CrossedBoundary => {
                    value.extend_from_slice(&buffer[start..]);
                    buffer = Arc::clone(self.scanner.buffer());
                    start = if value.is_empty() {
                        self.scanner.start_offset()
                    } else {
                        0
                    };
                }
                LocationStep::EndOfDocument => {
                    let bytes_read = value.len() + buffer.len().saturating_sub(start);
                    warn!(path = %path, bytes_read, "document tree ended inside a value");
                    return Err(Error::TruncatedDocument { path, bytes_read });
                }
            }
        }
        value.extend_from_slice(&buffer[start..self.scanner.offset()]);
        Ok(value)
    }

    fn verify_chunk_end(&self) -> Result<()> {
        let key = self.cursor.current_key()?;
        if self.scanner.location().encode() != key {
            let keyed = match JsonLocation::decode(key) {
                Ok(location) => location.to_string(),
                Err(_) => format!("{} undecodable bytes", key.len()),
            };
            return Err(Error::corruption(format!(
                "chunk ends at {} but is keyed {}",
                self.scanner.location(),
                keyed
            )));
        }
        Ok(())
    }

    /// Current location in the document
    pub fn current_location(&self) -> &JsonLocation {
        self.scanner.location()
    }

    /// Whether the cursor still has a payload under it
    pub fn is_valid(&self) -> bool {
        self.cursor.is_valid()
    }

    /// Whether the cursor sits at the first byte of a value
    pub fn at_start_of_value(&self) -> bool {
        self.scanner.at_start_of_value()
    }

    /// Next unscanned byte of the current payload
    pub fn next_byte(&self) -> Option<u8> {
        self.scanner.peek()
    }

}

/// A well-formed document tree ends with the key of the document's end,
/// which no location follows
fn tree_ends_before(location: &JsonLocation) -> Error {
    Error::corruption(format!("document tree ends before {}", location))
}
