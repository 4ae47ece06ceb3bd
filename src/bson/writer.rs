//! Document writer
//!
//! Appends tagged, named values to a growable buffer. Composite values are
//! written as length-prefixed blocks whose length is patched in once the
//! children have been written.

use byteorder::{ByteOrder, LittleEndian};

use crate::bson::Tag;

/// Binary subtype for generic byte strings
const BINARY_SUBTYPE_GENERIC: u8 = 0x00;

/// Handle to a reserved block length, returned by [`BsonWriter::begin_block`]
#[derive(Debug)]
#[must_use = "a block must be closed with BsonWriter::end_block"]
pub struct LenWriter {
    offset: usize,
}

/// Append-only writer for tagged documents
#[derive(Debug, Default, Clone)]
pub struct BsonWriter {
    buf: Vec<u8>,
}

impl BsonWriter {
    /// Create a new empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with room for `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if nothing has been written
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Get the bytes written so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the writer and return its buffer
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Write a tag followed by the field name
    pub fn write_prefix(&mut self, tag: Tag, name: &str) {
        self.buf.push(tag as u8);
        self.write_cstring(name);
    }

    /// Write a prefix unless the name is empty.
    ///
    /// The top-level document carries neither tag nor name.
    pub fn write_optional_prefix(&mut self, tag: Tag, name: &str) {
        if !name.is_empty() {
            self.write_prefix(tag, name);
        }
    }

    /// Reserve the 4-byte length of a block
    pub fn begin_block(&mut self) -> LenWriter {
        let offset = self.buf.len();
        self.buf.extend_from_slice(&[0u8; 4]);
        LenWriter { offset }
    }

    /// Terminate a block and patch its length.
    ///
    /// The length counts the length field itself through the terminator.
    pub fn end_block(&mut self, block: LenWriter) {
        self.buf.push(Tag::EndOfObject as u8);
        let len = (self.buf.len() - block.offset) as i32;
        LittleEndian::write_i32(&mut self.buf[block.offset..block.offset + 4], len);
    }

    /// Write a named Null
    pub fn write_null(&mut self, name: &str) {
        self.write_prefix(Tag::Null, name);
    }

    /// Write a named string.
    ///
    /// Strings go out as generic Binary, which readers accept wherever a
    /// string is expected.
    pub fn write_string(&mut self, name: &str, value: &str) {
        self.write_binary(name, value.as_bytes());
    }

    /// Write a named byte string
    pub fn write_binary(&mut self, name: &str, value: &[u8]) {
        self.write_prefix(Tag::Binary, name);
        self.write_i32_raw(value.len() as i32);
        self.buf.push(BINARY_SUBTYPE_GENERIC);
        self.buf.extend_from_slice(value);
    }

    /// Write a named UTF-8 string with the String tag
    pub fn write_utf8(&mut self, name: &str, value: &str) {
        self.write_prefix(Tag::String, name);
        self.write_i32_raw(value.len() as i32 + 1);
        self.buf.extend_from_slice(value.as_bytes());
        self.buf.push(0);
    }

    /// Write a named boolean
    pub fn write_bool(&mut self, name: &str, value: bool) {
        self.write_prefix(Tag::Boolean, name);
        self.buf.push(value as u8);
    }

    /// Write a named 32-bit integer
    pub fn write_i32(&mut self, name: &str, value: i32) {
        self.write_prefix(Tag::Int, name);
        self.write_i32_raw(value);
    }

    /// Write a named 64-bit integer
    pub fn write_i64(&mut self, name: &str, value: i64) {
        self.write_prefix(Tag::Long, name);
        let mut raw = [0u8; 8];
        LittleEndian::write_i64(&mut raw, value);
        self.buf.extend_from_slice(&raw);
    }

    /// Write a named 64-bit unsigned integer
    pub fn write_u64(&mut self, name: &str, value: u64) {
        self.write_prefix(Tag::Ulong, name);
        let mut raw = [0u8; 8];
        LittleEndian::write_u64(&mut raw, value);
        self.buf.extend_from_slice(&raw);
    }

    /// Write a named float
    pub fn write_f64(&mut self, name: &str, value: f64) {
        self.write_prefix(Tag::Number, name);
        let mut raw = [0u8; 8];
        LittleEndian::write_f64(&mut raw, value);
        self.buf.extend_from_slice(&raw);
    }

    fn write_cstring(&mut self, value: &str) {
        self.buf.extend_from_slice(value.as_bytes());
        self.buf.push(0);
    }

    fn write_i32_raw(&mut self, value: i32) {
        let mut raw = [0u8; 4];
        LittleEndian::write_i32(&mut raw, value);
        self.buf.extend_from_slice(&raw);
    }
}

/// Decimal field name for an array index
pub fn index_name(index: usize) -> String {
    index.to_string()
}
