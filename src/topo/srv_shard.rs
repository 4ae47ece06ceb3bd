//! Serving view of a single shard
//!
//! A [`SrvShard`] is the local-cell roll-up of one shard: the key range it
//! owns, the roles it is authoritative for, and the roles that actually
//! have serving tablets in this cell.

use serde::{Deserialize, Serialize};

use crate::bson::{
    decode_string_array, encode_string_array, verify_object, BsonCodec, BsonReader, BsonWriter,
    Tag,
};
use crate::error::Result;
use crate::key::KeyRange;
use crate::topo::{TabletType, SHARD_ZERO};

/// Local-cell serving record of a shard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SrvShard {
    /// Key range owned by the shard
    pub key_range: KeyRange,
    /// Roles the shard is authoritative for
    pub served_types: Vec<TabletType>,
    /// Roles with serving tablets in this cell
    pub tablet_types: Vec<TabletType>,
    /// Store version this record was read at
    #[serde(skip)]
    version: i64,
}

impl SrvShard {
    /// Create an empty record tagged with the store version it belongs to
    pub fn new(version: i64) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    /// Create a record for a key range
    pub fn with_key_range(key_range: KeyRange) -> Self {
        Self {
            key_range,
            ..Self::default()
        }
    }

    /// Store version this record was read at
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Stable, human-readable shard identity.
    ///
    /// `0` for a shard spanning the whole domain, otherwise the hex
    /// boundaries joined by a hyphen, e.g. `80-c0`.
    pub fn shard_name(&self) -> String {
        if !self.key_range.is_partial() {
            return SHARD_ZERO.to_string();
        }
        format!("{}-{}", self.key_range.start.hex(), self.key_range.end.hex())
    }

    /// Check if the shard is authoritative for `tablet_type`
    pub fn serves(&self, tablet_type: &TabletType) -> bool {
        self.served_types.contains(tablet_type)
    }
}

impl PartialEq for SrvShard {
    fn eq(&self, other: &Self) -> bool {
        self.key_range == other.key_range
            && self.served_types == other.served_types
            && self.tablet_types == other.tablet_types
    }
}

impl Eq for SrvShard {}

impl BsonCodec for SrvShard {
    fn marshal_bson(&self, w: &mut BsonWriter, key: &str) {
        w.write_optional_prefix(Tag::Object, key);
        let block = w.begin_block();

        self.key_range.marshal_bson(w, "KeyRange");
        encode_string_array(w, "ServedTypes", &self.served_types);
        encode_string_array(w, "TabletTypes", &self.tablet_types);

        w.end_block(block);
    }

    fn unmarshal_bson(&mut self, r: &mut BsonReader<'_>, tag: Tag) -> Result<()> {
        verify_object(tag, "SrvShard")?;
        let block = r.begin_block("SrvShard")?;
        while let Some((tag, name)) = r.next_field("SrvShard")? {
            match name {
                "KeyRange" => self.key_range.unmarshal_bson(r, tag)?,
                "ServedTypes" => {
                    self.served_types = decode_string_array(r, tag, "ServedTypes")?
                }
                "TabletTypes" => {
                    self.tablet_types = decode_string_array(r, tag, "TabletTypes")?
                }
                _ => r.skip_unknown(tag, name, "SrvShard")?,
            }
        }
        r.end_block(block, "SrvShard")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, encode};
    use crate::error::Error;
    use crate::key::KeyspaceId;

    fn shard(start: &[u8], end: &[u8], served: &[TabletType]) -> SrvShard {
        SrvShard {
            key_range: KeyRange::new(start, end),
            served_types: served.to_vec(),
            ..SrvShard::default()
        }
    }

    #[test]
    fn test_full_range_shard() -> Result<()> {
        let original = shard(&[], &[], &[TabletType::master(), TabletType::replica()]);
        let decoded: SrvShard = decode(&encode(&original))?;
        assert_eq!(
            decoded.served_types,
            vec![TabletType::master(), TabletType::replica()]
        );
        assert!(decoded.tablet_types.is_empty());
        assert_eq!(decoded.shard_name(), "0");
        assert_eq!(decoded, original);
        Ok(())
    }

    #[test]
    fn test_shard_name() {
        let s = shard(&[0x80], &[0xc0], &[]);
        assert_eq!(s.shard_name(), "80-c0");
        assert_eq!(shard(&[], &[0x80], &[]).shard_name(), "-80");
        assert_eq!(shard(&[0xc0], &[], &[]).shard_name(), "c0-");
        assert_eq!(shard(&[0x0a, 0xbc], &[0xff], &[]).shard_name(), "0abc-ff");
    }

    #[test]
    fn test_shard_name_round_trips() -> Result<()> {
        for s in [
            shard(&[], &[], &[]),
            shard(&[0x80], &[0xc0], &[]),
            shard(&[], &[0x40], &[]),
            shard(&[0x40, 0x01], &[], &[]),
        ] {
            let parsed = KeyRange::parse_shard_name(&s.shard_name())?;
            assert_eq!(parsed, s.key_range);
        }
        Ok(())
    }

    #[test]
    fn test_version_not_serialized() -> Result<()> {
        let mut original = SrvShard::new(42);
        original.key_range = KeyRange::new(vec![0x10u8], vec![0x20u8]);
        original.tablet_types = vec![TabletType::rdonly()];
        assert_eq!(original.version(), 42);

        let bytes = encode(&original);
        let decoded: SrvShard = decode(&bytes)?;
        assert_eq!(decoded.version(), 0);
        assert_eq!(decoded, original);
        assert_eq!(encode(&SrvShard::new(7)), encode(&SrvShard::new(8)));

        let json = serde_json::to_string(&original)?;
        assert!(!json.contains("version"));
        Ok(())
    }

    #[test]
    fn test_field_order_independent() -> Result<()> {
        let mut w = BsonWriter::new();
        let block = w.begin_block();
        encode_string_array(&mut w, "TabletTypes", &[TabletType::replica()]);
        encode_string_array(&mut w, "ServedTypes", &[TabletType::master()]);
        KeyRange::new(vec![0x80u8], Vec::<u8>::new()).marshal_bson(&mut w, "KeyRange");
        w.end_block(block);

        let decoded: SrvShard = decode(&w.into_bytes())?;
        assert_eq!(decoded.served_types, vec![TabletType::master()]);
        assert_eq!(decoded.tablet_types, vec![TabletType::replica()]);
        assert_eq!(decoded.key_range.start, KeyspaceId::new(vec![0x80u8]));
        Ok(())
    }

    #[test]
    fn test_repeated_field_last_wins() -> Result<()> {
        let mut w = BsonWriter::new();
        let block = w.begin_block();
        encode_string_array(&mut w, "ServedTypes", &[TabletType::master()]);
        encode_string_array(&mut w, "ServedTypes", &[TabletType::rdonly()]);
        w.end_block(block);

        let decoded: SrvShard = decode(&w.into_bytes())?;
        assert_eq!(decoded.served_types, vec![TabletType::rdonly()]);
        Ok(())
    }

    #[test]
    fn test_unknown_fields_skipped() -> Result<()> {
        let original = shard(&[0x40], &[0x80], &[TabletType::replica()]);

        for position in 0..=3 {
            let mut w = BsonWriter::new();
            let block = w.begin_block();
            let inject = |w: &mut BsonWriter| {
                w.write_i64("Generation", 12);
                w.write_prefix(Tag::Object, "Future");
                let inner = w.begin_block();
                w.write_string("Note", "added later");
                w.end_block(inner);
            };
            if position == 0 {
                inject(&mut w);
            }
            original.key_range.marshal_bson(&mut w, "KeyRange");
            if position == 1 {
                inject(&mut w);
            }
            encode_string_array(&mut w, "ServedTypes", &original.served_types);
            if position == 2 {
                inject(&mut w);
            }
            encode_string_array(&mut w, "TabletTypes", &original.tablet_types);
            if position == 3 {
                inject(&mut w);
            }
            w.end_block(block);

            let decoded: SrvShard = decode(&w.into_bytes())?;
            assert_eq!(decoded, original, "injected at {}", position);
        }
        Ok(())
    }

    #[test]
    fn test_served_types_wrong_tag() {
        let mut w = BsonWriter::new();
        let block = w.begin_block();
        w.write_string("ServedTypes", "master");
        w.end_block(block);

        let err = decode::<SrvShard>(&w.into_bytes()).unwrap_err();
        match err {
            Error::UnexpectedTag { tag, context } => {
                assert_eq!(tag, Tag::Binary as u8);
                assert_eq!(context, "ServedTypes");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
