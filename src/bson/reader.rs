//! Document reader
//!
//! Cursor over an immutable byte slice. Every read is bounds-checked and
//! reports [`Error::Truncated`] instead of panicking.

use byteorder::{ByteOrder, LittleEndian};
use tracing::trace;

use crate::bson::Tag;
use crate::error::{Error, Result};

/// Default limit on nested blocks
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Smallest valid block: 4 length bytes plus the terminator
const MIN_BLOCK_LEN: usize = 5;

/// An open length-prefixed block
#[derive(Debug, Clone, Copy)]
pub struct Block {
    start: usize,
    end: usize,
}

impl Block {
    /// Declared length of the block in bytes
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Always false; a valid block holds at least its length and terminator
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Bounds-checked cursor over an encoded document
#[derive(Debug)]
pub struct BsonReader<'a> {
    buf: &'a [u8],
    pos: usize,
    depth: usize,
    max_depth: usize,
    skipped_fields: usize,
}

impl<'a> BsonReader<'a> {
    /// Create a reader positioned at the start of `buf`
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            skipped_fields: 0,
        }
    }

    /// Set the nesting limit
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Current read offset
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left after the current offset
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Number of unknown fields skipped so far
    pub fn skipped_fields(&self) -> usize {
        self.skipped_fields
    }

    fn take(&mut self, n: usize, context: &str) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(Error::truncated(context, n, self.remaining()));
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn read_u8(&mut self, context: &str) -> Result<u8> {
        Ok(self.take(1, context)?[0])
    }

    fn read_i32(&mut self, context: &str) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.take(4, context)?))
    }

    fn read_len(&mut self, context: &str) -> Result<usize> {
        let len = self.read_i32(context)?;
        usize::try_from(len).map_err(|_| Error::invalid_value(context, format!("length {}", len)))
    }

    /// Read the next tag byte
    pub fn next_tag(&mut self, context: &str) -> Result<Tag> {
        let byte = self.read_u8(context)?;
        Tag::from_byte(byte).ok_or_else(|| Error::unexpected_tag(byte, context))
    }

    /// Read a NUL-terminated field name
    pub fn read_cstring(&mut self, context: &str) -> Result<&'a str> {
        let rest = &self.buf[self.pos..];
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| Error::truncated(context, rest.len() + 1, rest.len()))?;
        let name = std::str::from_utf8(&rest[..nul]).map_err(|_| Error::invalid_utf8(context))?;
        self.pos += nul + 1;
        Ok(name)
    }

    /// Read the next field header of an open block.
    ///
    /// Returns `None` once the block terminator is reached.
    pub fn next_field(&mut self, context: &str) -> Result<Option<(Tag, &'a str)>> {
        match self.next_tag(context)? {
            Tag::EndOfObject => Ok(None),
            tag => {
                let name = self.read_cstring(context)?;
                Ok(Some((tag, name)))
            }
        }
    }

    /// Open a length-prefixed block at the current offset
    pub fn begin_block(&mut self, context: &str) -> Result<Block> {
        let start = self.pos;
        let len = self.read_len(context)?;
        if len < MIN_BLOCK_LEN {
            return Err(Error::invalid_value(context, format!("block length {}", len)));
        }
        let available = self.buf.len() - start;
        if len > available {
            return Err(Error::truncated(context, len, available));
        }
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(Error::NestingTooDeep {
                depth: self.depth,
                limit: self.max_depth,
            });
        }
        Ok(Block {
            start,
            end: start + len,
        })
    }

    /// Close a block after its terminator has been read
    pub fn end_block(&mut self, block: Block, context: &str) -> Result<()> {
        self.depth = self.depth.saturating_sub(1);
        if self.pos != block.end {
            return Err(Error::length_mismatch(
                context,
                block.len(),
                self.pos - block.start,
            ));
        }
        Ok(())
    }

    /// Read a string slot; Binary and String bodies are both accepted and
    /// Null reads as the empty string
    pub fn read_string(&mut self, tag: Tag, context: &str) -> Result<String> {
        let bytes = self.read_bytes(tag, context)?;
        String::from_utf8(bytes).map_err(|_| Error::invalid_utf8(context))
    }

    /// Read a byte-string slot with the same tag rules as [`read_string`](Self::read_string)
    pub fn read_bytes(&mut self, tag: Tag, context: &str) -> Result<Vec<u8>> {
        match tag {
            Tag::Binary => {
                let len = self.read_len(context)?;
                self.read_u8(context)?;
                Ok(self.take(len, context)?.to_vec())
            }
            Tag::String => {
                let len = self.read_len(context)?;
                if len == 0 {
                    return Err(Error::invalid_value(context, "string length 0"));
                }
                let body = self.take(len, context)?;
                let (text, nul) = body.split_at(len - 1);
                if nul[0] != 0 {
                    return Err(Error::invalid_value(context, "unterminated string"));
                }
                Ok(text.to_vec())
            }
            Tag::Null => Ok(Vec::new()),
            other => Err(Error::unexpected_tag(other as u8, context)),
        }
    }

    /// Consume and discard a value of kind `tag`
    pub fn skip(&mut self, tag: Tag, context: &str) -> Result<()> {
        match tag {
            Tag::Null => {}
            Tag::Boolean => {
                self.take(1, context)?;
            }
            Tag::Int => {
                self.take(4, context)?;
            }
            Tag::Number | Tag::Datetime | Tag::Ulong | Tag::Long => {
                self.take(8, context)?;
            }
            Tag::String => {
                let len = self.read_len(context)?;
                self.take(len, context)?;
            }
            Tag::Binary => {
                let len = self.read_len(context)?;
                self.take(len + 1, context)?;
            }
            Tag::Object | Tag::Array => {
                let len = self.read_len(context)?;
                if len < MIN_BLOCK_LEN {
                    return Err(Error::invalid_value(context, format!("block length {}", len)));
                }
                self.take(len - 4, context)?;
            }
            Tag::EndOfObject => return Err(Error::unexpected_tag(tag as u8, context)),
        }
        Ok(())
    }

    /// Skip a field that has no decoding target
    pub fn skip_unknown(&mut self, tag: Tag, name: &str, context: &str) -> Result<()> {
        trace!(field = name, tag = %tag, context, "skipping unknown field");
        self.skip(tag, context)?;
        self.skipped_fields += 1;
        Ok(())
    }
}

/// Check that a composite slot holds an object
pub fn verify_object(tag: Tag, context: &str) -> Result<()> {
    match tag {
        Tag::Object => Ok(()),
        other => Err(Error::unexpected_tag(other as u8, context)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bson::BsonWriter;

    #[test]
    fn test_read_fields() -> Result<()> {
        let mut w = BsonWriter::new();
        let block = w.begin_block();
        w.write_string("a", "alpha");
        w.write_utf8("b", "beta");
        w.write_null("c");
        w.end_block(block);
        let bytes = w.into_bytes();

        let mut r = BsonReader::new(&bytes);
        let block = r.begin_block("doc")?;
        let (tag, name) = r.next_field("doc")?.unwrap();
        assert_eq!((tag, name), (Tag::Binary, "a"));
        assert_eq!(r.read_string(tag, "a")?, "alpha");
        let (tag, name) = r.next_field("doc")?.unwrap();
        assert_eq!((tag, name), (Tag::String, "b"));
        assert_eq!(r.read_string(tag, "b")?, "beta");
        let (tag, _) = r.next_field("doc")?.unwrap();
        assert_eq!(r.read_string(tag, "c")?, "");
        assert!(r.next_field("doc")?.is_none());
        r.end_block(block, "doc")?;
        assert_eq!(r.remaining(), 0);
        Ok(())
    }

    #[test]
    fn test_string_slot_rejects_other_tags() {
        let bytes = [0u8; 8];
        let mut r = BsonReader::new(&bytes);
        let err = r.read_string(Tag::Long, "ShardingColumnName").unwrap_err();
        assert!(err.is_unexpected_tag());
        assert_eq!(r.position(), 0);
    }

    #[test]
    fn test_skip_every_kind() -> Result<()> {
        let mut w = BsonWriter::new();
        let block = w.begin_block();
        w.write_f64("f", 1.5);
        w.write_bool("b", true);
        w.write_i32("i", -7);
        w.write_i64("l", 42);
        w.write_u64("u", 9);
        w.write_utf8("s", "text");
        w.write_binary("x", &[1, 2, 3]);
        w.write_null("n");
        w.write_prefix(Tag::Object, "o");
        let inner = w.begin_block();
        w.write_string("k", "v");
        w.end_block(inner);
        w.end_block(block);
        let bytes = w.into_bytes();

        let mut r = BsonReader::new(&bytes);
        let block = r.begin_block("doc")?;
        let mut count = 0;
        while let Some((tag, name)) = r.next_field("doc")? {
            r.skip_unknown(tag, name, "doc")?;
            count += 1;
        }
        r.end_block(block, "doc")?;
        assert_eq!(count, 9);
        assert_eq!(r.skipped_fields(), 9);
        assert_eq!(r.remaining(), 0);
        Ok(())
    }

    #[test]
    fn test_truncated_reads() {
        let mut r = BsonReader::new(&[0x10, 0x00, 0x00]);
        assert!(r.begin_block("doc").unwrap_err().is_truncated());

        let mut r = BsonReader::new(b"abc");
        assert!(r.read_cstring("name").unwrap_err().is_truncated());

        // declared length larger than the buffer
        let mut r = BsonReader::new(&[0x40, 0x00, 0x00, 0x00, 0x00]);
        assert!(r.begin_block("doc").unwrap_err().is_truncated());
    }

    #[test]
    fn test_unknown_tag_byte() {
        let mut r = BsonReader::new(&[0x7f]);
        let err = r.next_tag("doc").unwrap_err();
        assert!(matches!(err, Error::UnexpectedTag { tag: 0x7f, .. }));
    }

    #[test]
    fn test_length_mismatch() -> Result<()> {
        // declares 6 bytes but terminates after 5
        let bytes = [0x06, 0x00, 0x00, 0x00, 0x00, 0x00];
        let mut r = BsonReader::new(&bytes);
        let block = r.begin_block("doc")?;
        assert!(r.next_field("doc")?.is_none());
        let err = r.end_block(block, "doc").unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { declared: 6, consumed: 5, .. }));
        Ok(())
    }

    #[test]
    fn test_nesting_limit() {
        let mut w = BsonWriter::new();
        let outer = w.begin_block();
        w.write_prefix(Tag::Object, "o");
        let inner = w.begin_block();
        w.end_block(inner);
        w.end_block(outer);
        let bytes = w.into_bytes();

        let mut r = BsonReader::new(&bytes).with_max_depth(1);
        r.begin_block("doc").unwrap();
        r.next_field("doc").unwrap();
        let err = r.begin_block("o").unwrap_err();
        assert!(matches!(err, Error::NestingTooDeep { depth: 2, limit: 1 }));
    }

    #[test]
    fn test_verify_object() {
        assert!(verify_object(Tag::Object, "SrvShard").is_ok());
        assert!(verify_object(Tag::Array, "SrvShard").unwrap_err().is_unexpected_tag());
    }
}
