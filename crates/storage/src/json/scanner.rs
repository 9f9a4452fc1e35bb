//! Resumable JSON scanner
//!
//! Walks one buffer of serialized JSON a token-level step at a time, keeping
//! the [`JsonLocation`] of every stop. A scanner can start at the top of a
//! document or in the middle of one, given the location at which its buffer
//! begins. Everything it needs to resume lives in the location, so a scanner
//! for the next chunk is built from the previous chunk's key alone.
//!
//! Steps are atomic: a scalar, an object key with its `:`, or a `,` with the
//! key that follows it is consumed whole or reported as malformed. Chunks are
//! only ever cut between steps.

use std::fmt;
use std::sync::Arc;

use tessera_core::{Error, JsonLocation, LocationState, PathSegment, Result, MAX_NESTING_DEPTH};

/// Outcome of a scanner step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStep {
    /// Moved to a new location
    Advanced,
    /// Nothing left in this buffer; the location is unchanged
    EndOfBuffer,
}

/// Kind of container enclosing the current value
enum Enclosing {
    Document,
    Object,
    Array(usize),
}

/// Scanner over one buffer of a JSON document
#[derive(Clone)]
pub struct JsonScanner {
    buffer: Arc<[u8]>,
    offset: usize,
    start_offset: usize,
    location: JsonLocation,
}

impl fmt::Debug for JsonScanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonScanner")
            .field("len", &self.buffer.len())
            .field("offset", &self.offset)
            .field("location", &self.location)
            .finish()
    }
}

impl JsonScanner {
    /// Scanner at the start of a document
    pub fn new(buffer: Arc<[u8]>) -> Self {
        Self::from_middle(buffer, JsonLocation::start_of_document())
    }

    /// Scanner whose buffer begins at `location`
    pub fn from_middle(buffer: Arc<[u8]>, location: JsonLocation) -> Self {
        let mut scanner = JsonScanner {
            buffer,
            offset: 0,
            start_offset: 0,
            location,
        };
        if scanner.at_start_of_value() {
            scanner.skip_whitespace();
            scanner.start_offset = scanner.offset;
        }
        scanner
    }

    /// Scanner whose buffer follows the chunk keyed `previous_key`
    ///
    /// `None` means the buffer is the first chunk of the document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Corruption`] if the key is not an encoded location.
    pub fn from_middle_with_key(buffer: Arc<[u8]>, previous_key: Option<&[u8]>) -> Result<Self> {
        match previous_key {
            None => Ok(Self::new(buffer)),
            Some(key) => Ok(Self::from_middle(buffer, JsonLocation::decode(key)?)),
        }
    }

    /// Current location
    pub fn location(&self) -> &JsonLocation {
        &self.location
    }

    /// Byte offset of the scan position within the buffer
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Offset at which this buffer's content starts, past any whitespace
    /// that precedes a value the buffer opens on
    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    /// The buffer being scanned
    pub fn buffer(&self) -> &Arc<[u8]> {
        &self.buffer
    }

    /// Byte at the scan position
    pub fn peek(&self) -> Option<u8> {
        self.buffer.get(self.offset).copied()
    }

    /// Whether the scan position is the first byte of a value
    pub fn at_start_of_value(&self) -> bool {
        self.location.is_start_of_value()
    }

    /// Take one step
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedJson`] if the bytes at the scan position do
    /// not continue the document from the current location.
    pub fn advance_to_next_location(&mut self) -> Result<ScanStep> {
        self.skip_whitespace();
        let Some(byte) = self.peek() else {
            return Ok(ScanStep::EndOfBuffer);
        };

        match self.location.state() {
            LocationState::StartOfValue => self.scan_value(byte)?,
            LocationState::ObjectStart => {
                if byte == b'}' {
                    self.offset += 1;
                    self.location.set_state(LocationState::EndOfValue);
                } else {
                    let key = self.scan_member_key()?;
                    self.location.path_mut().push_key(key);
                    self.begin_value();
                }
            }
            LocationState::ArrayStart => {
                if byte == b']' {
                    self.offset += 1;
                    self.location.set_state(LocationState::EndOfValue);
                } else {
                    self.location.path_mut().push_index(0);
                    self.begin_value();
                }
            }
            LocationState::EndOfValue => match self.enclosing() {
                Enclosing::Document => {
                    return Err(Error::malformed_json(
                        self.offset,
                        "unexpected data after the document",
                    ))
                }
                Enclosing::Object => match byte {
                    b',' => {
                        self.offset += 1;
                        self.skip_whitespace();
                        let key = self.scan_member_key()?;
                        self.location.path_mut().pop();
                        self.location.path_mut().push_key(key);
                        self.begin_value();
                    }
                    b'}' => self.close_container(),
                    _ => return Err(Error::malformed_json(self.offset, "expected ',' or '}'")),
                },
                Enclosing::Array(idx) => match byte {
                    b',' => {
                        self.offset += 1;
                        self.location.path_mut().pop();
                        self.location.path_mut().push_index(idx + 1);
                        self.begin_value();
                    }
                    b']' => self.close_container(),
                    _ => return Err(Error::malformed_json(self.offset, "expected ',' or ']'")),
                },
            },
        }
        Ok(ScanStep::Advanced)
    }

    fn enclosing(&self) -> Enclosing {
        match self.location.path().last_segment() {
            None => Enclosing::Document,
            Some(PathSegment::Key(_)) => Enclosing::Object,
            Some(PathSegment::Index(idx)) => Enclosing::Array(*idx),
        }
    }

    fn begin_value(&mut self) {
        self.location.set_state(LocationState::StartOfValue);
        self.skip_whitespace();
    }

    fn close_container(&mut self) {
        self.offset += 1;
        self.location.path_mut().pop();
        self.location.set_state(LocationState::EndOfValue);
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.offset += 1;
        }
    }

    fn scan_value(&mut self, byte: u8) -> Result<()> {
        match byte {
            b'{' | b'[' => {
                if self.location.path().len() >= MAX_NESTING_DEPTH {
                    return Err(Error::malformed_json(
                        self.offset,
                        format!("nesting deeper than {}", MAX_NESTING_DEPTH),
                    ));
                }
                self.offset += 1;
                self.location.set_state(if byte == b'{' {
                    LocationState::ObjectStart
                } else {
                    LocationState::ArrayStart
                });
                return Ok(());
            }
            b'"' => self.offset = self.scan_string(self.offset)?,
            b'-' | b'0'..=b'9' => self.scan_number()?,
            b't' => self.scan_literal(b"true")?,
            b'f' => self.scan_literal(b"false")?,
            b'n' => self.scan_literal(b"null")?,
            _ => return Err(Error::malformed_json(self.offset, "expected a value")),
        }
        self.location.set_state(LocationState::EndOfValue);
        Ok(())
    }

    /// Scan the string opening at `start`, returning the offset past its closing quote
    fn scan_string(&self, start: usize) -> Result<usize> {
        let mut pos = start + 1;
        loop {
            match self.buffer.get(pos) {
                None => return Err(Error::malformed_json(start, "unterminated string")),
                Some(b'"') => return Ok(pos + 1),
                Some(b'\\') => pos += 2,
                Some(&b) if b < 0x20 => {
                    return Err(Error::malformed_json(pos, "control character in string"))
                }
                Some(_) => pos += 1,
            }
        }
    }

    /// Scan `"key"` and the `:` after it, leaving the offset past the `:`
    fn scan_member_key(&mut self) -> Result<String> {
        if self.peek() != Some(b'"') {
            return Err(Error::malformed_json(self.offset, "expected object key"));
        }
        let start = self.offset;
        let end = self.scan_string(start)?;
        let key = std::str::from_utf8(&self.buffer[start + 1..end - 1])
            .map_err(|_| Error::malformed_json(start, "object key is not UTF-8"))?
            .to_owned();

        self.offset = end;
        self.skip_whitespace();
        if self.peek() != Some(b':') {
            return Err(Error::malformed_json(self.offset, "expected ':'"));
        }
        self.offset += 1;
        Ok(key)
    }

    fn scan_number(&mut self) -> Result<()> {
        let buf = &self.buffer;
        let digits_from = |mut pos: usize| {
            while matches!(buf.get(pos), Some(b'0'..=b'9')) {
                pos += 1;
            }
            pos
        };

        let mut pos = self.offset;
        if buf.get(pos) == Some(&b'-') {
            pos += 1;
        }
        match buf.get(pos) {
            Some(b'0') => pos += 1,
            Some(b'1'..=b'9') => pos = digits_from(pos + 1),
            _ => return Err(Error::malformed_json(pos, "expected digit")),
        }
        if buf.get(pos) == Some(&b'.') {
            let end = digits_from(pos + 1);
            if end == pos + 1 {
                return Err(Error::malformed_json(end, "expected digit after '.'"));
            }
            pos = end;
        }
        if matches!(buf.get(pos), Some(b'e' | b'E')) {
            pos += 1;
            if matches!(buf.get(pos), Some(b'+' | b'-')) {
                pos += 1;
            }
            let end = digits_from(pos);
            if end == pos {
                return Err(Error::malformed_json(end, "expected exponent digits"));
            }
            pos = end;
        }
        self.offset = pos;
        Ok(())
    }

    fn scan_literal(&mut self, literal: &'static [u8]) -> Result<()> {
        if !self.buffer[self.offset..].starts_with(literal) {
            return Err(Error::malformed_json(self.offset, "invalid literal"));
        }
        self.offset += literal.len();
        Ok(())
    }
}
