//! Keyspace-id primitives
//!
//! A [`KeyRange`] is a half-open interval `[start, end)` over keyspace ids,
//! which compare as unsigned byte strings. An empty boundary is unbounded:
//! an empty `start` is the beginning of the domain and an empty `end` the
//! end of it.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bson::{verify_object, BsonCodec, BsonReader, BsonWriter, Tag};
use crate::error::{Error, Result};

/// Sharding key value used to place a row in a shard
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KeyspaceId(Vec<u8>);

impl KeyspaceId {
    /// Create a keyspace id from raw bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Create a keyspace id from the big-endian form of a number
    pub fn from_u64(value: u64) -> Self {
        Self(value.to_be_bytes().to_vec())
    }

    /// Parse a hex-encoded keyspace id
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        hex::decode(hex_str)
            .map(Self)
            .map_err(|e| Error::invalid_value("hex keyspace id", format!("{:?}: {}", hex_str, e)))
    }

    /// Lowercase hex form
    pub fn hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Check if this is the unbounded (empty) id
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for KeyspaceId {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for KeyspaceId {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Display for KeyspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex())
    }
}

/// Half-open interval of keyspace ids owned by one shard
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyRange {
    /// Inclusive lower bound; empty means the start of the domain
    pub start: KeyspaceId,
    /// Exclusive upper bound; empty means the end of the domain
    pub end: KeyspaceId,
}

impl KeyRange {
    /// Create a key range
    pub fn new(start: impl Into<KeyspaceId>, end: impl Into<KeyspaceId>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// The range covering the whole domain
    pub fn full() -> Self {
        Self::default()
    }

    /// False only when the range spans the entire domain
    pub fn is_partial(&self) -> bool {
        !(self.start.is_empty() && self.end.is_empty())
    }

    /// Check if `id` falls in `[start, end)`
    pub fn contains(&self, id: &KeyspaceId) -> bool {
        self.start <= *id && (self.end.is_empty() || *id < self.end)
    }

    /// Check if two ranges share at least one keyspace id
    pub fn intersects(&self, other: &KeyRange) -> bool {
        (self.end.is_empty() || other.start < self.end)
            && (other.end.is_empty() || self.start < other.end)
    }

    /// Order two ranges by their start boundary
    pub fn cmp_start(&self, other: &KeyRange) -> Ordering {
        self.start.cmp(&other.start)
    }

    /// Parse a shard name such as `80-c0`, `-80` or `0`.
    ///
    /// `0` and `-` name the full range.
    pub fn parse_shard_name(name: &str) -> Result<Self> {
        if name == crate::topo::SHARD_ZERO {
            return Ok(Self::full());
        }
        let (start, end) = name
            .split_once('-')
            .ok_or_else(|| Error::invalid_value("shard name", name))?;
        if end.contains('-') {
            return Err(Error::invalid_value("shard name", name));
        }
        Ok(Self {
            start: KeyspaceId::from_hex(start)?,
            end: KeyspaceId::from_hex(end)?,
        })
    }
}

impl fmt::Display for KeyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl BsonCodec for KeyRange {
    fn marshal_bson(&self, w: &mut BsonWriter, key: &str) {
        w.write_optional_prefix(Tag::Object, key);
        let block = w.begin_block();
        w.write_binary("Start", self.start.as_bytes());
        w.write_binary("End", self.end.as_bytes());
        w.end_block(block);
    }

    fn unmarshal_bson(&mut self, r: &mut BsonReader<'_>, tag: Tag) -> Result<()> {
        verify_object(tag, "KeyRange")?;
        let block = r.begin_block("KeyRange")?;
        while let Some((tag, name)) = r.next_field("KeyRange")? {
            match name {
                "Start" => self.start = KeyspaceId(r.read_bytes(tag, "KeyRange.Start")?),
                "End" => self.end = KeyspaceId(r.read_bytes(tag, "KeyRange.End")?),
                _ => r.skip_unknown(tag, name, "KeyRange")?,
            }
        }
        r.end_block(block, "KeyRange")
    }
}

/// Value domain of the sharding column.
///
/// The set is open: a type this crate does not know is kept verbatim so a
/// record from a newer writer still decodes and re-encodes unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyspaceIdType {
    /// Not set
    #[default]
    Unset,
    /// Unsigned 64-bit integer column
    Uint64,
    /// Opaque byte string column
    Bytes,
    /// Any other wire form
    Other(String),
}

impl fmt::Display for KeyspaceIdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl KeyspaceIdType {
    /// Map a wire form to a keyspace id type
    pub fn from_name(name: impl Into<String>) -> Self {
        let name = name.into();
        match name.as_str() {
            "" => Self::Unset,
            "uint64" => Self::Uint64,
            "bytes" => Self::Bytes,
            _ => Self::Other(name),
        }
    }

    /// Get the wire form of the keyspace id type
    pub fn name(&self) -> &str {
        match self {
            Self::Unset => "",
            Self::Uint64 => "uint64",
            Self::Bytes => "bytes",
            Self::Other(name) => name,
        }
    }

    /// Check if this is one of the types this crate knows
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}
