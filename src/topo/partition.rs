//! Keyspace partitions
//!
//! A partition is the set of shards that together serve a keyspace for one
//! tablet type. Shards must be sorted by key range before the partition is
//! used for lookups; non-overlap and completeness are established by the
//! caller and can be checked with [`KeyspacePartition::validate`].

use serde::{Deserialize, Serialize};

use crate::bson::{
    decode_object_array, encode_object_array, verify_object, BsonCodec, BsonReader, BsonWriter,
    Tag,
};
use crate::error::{Error, Result};
use crate::key::KeyspaceId;
use crate::topo::SrvShard;

/// Sort shards ascending by the start of their key range.
///
/// The sort is stable, so shards with equal starts keep their relative order.
pub fn sort_shards(shards: &mut [SrvShard]) {
    shards.sort_by(|a, b| a.key_range.cmp_start(&b.key_range));
}

/// Continuous set of shards serving an entire keyspace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyspacePartition {
    /// Non-overlapping shards, sorted by key range once `sort` has run
    pub shards: Vec<SrvShard>,
}

impl KeyspacePartition {
    /// Create a partition from shards in any order; they are sorted
    pub fn new(mut shards: Vec<SrvShard>) -> Self {
        sort_shards(&mut shards);
        Self { shards }
    }

    /// Sort the shards by key range start
    pub fn sort(&mut self) {
        sort_shards(&mut self.shards);
    }

    /// Check if the shard starts are strictly ascending
    pub fn is_sorted(&self) -> bool {
        self.shards
            .windows(2)
            .all(|pair| pair[0].key_range.start < pair[1].key_range.start)
    }

    /// Find the shard owning `id`.
    ///
    /// Assumes the partition is sorted and non-overlapping.
    pub fn find_shard(&self, id: &KeyspaceId) -> Option<&SrvShard> {
        let idx = self
            .shards
            .partition_point(|shard| shard.key_range.start <= *id);
        if idx == 0 {
            return None;
        }
        let shard = &self.shards[idx - 1];
        shard.key_range.contains(id).then_some(shard)
    }

    /// Check that the shards are sorted, disjoint and tile the whole domain
    pub fn validate(&self) -> Result<()> {
        let (first, last) = match (self.shards.first(), self.shards.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(Error::topology("partition has no shards")),
        };
        if !first.key_range.start.is_empty() {
            return Err(Error::topology(format!(
                "partition starts at {} instead of the beginning of the keyspace",
                first.shard_name()
            )));
        }
        for pair in self.shards.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if prev.key_range.end.is_empty() || prev.key_range.end > next.key_range.start {
                return Err(Error::topology(format!(
                    "shards {} and {} overlap or are out of order",
                    prev.shard_name(),
                    next.shard_name()
                )));
            }
            if prev.key_range.end < next.key_range.start {
                return Err(Error::topology(format!(
                    "gap between shards {} and {}",
                    prev.shard_name(),
                    next.shard_name()
                )));
            }
        }
        if !last.key_range.end.is_empty() {
            return Err(Error::topology(format!(
                "partition ends at {} before the end of the keyspace",
                last.shard_name()
            )));
        }
        Ok(())
    }

    /// Shard names in partition order
    pub fn shard_names(&self) -> Vec<String> {
        self.shards.iter().map(SrvShard::shard_name).collect()
    }
}

impl BsonCodec for KeyspacePartition {
    fn marshal_bson(&self, w: &mut BsonWriter, key: &str) {
        w.write_optional_prefix(Tag::Object, key);
        let block = w.begin_block();

        encode_object_array(w, "Shards", &self.shards);

        w.end_block(block);
    }

    fn unmarshal_bson(&mut self, r: &mut BsonReader<'_>, tag: Tag) -> Result<()> {
        verify_object(tag, "KeyspacePartition")?;
        let block = r.begin_block("KeyspacePartition")?;
        while let Some((tag, name)) = r.next_field("KeyspacePartition")? {
            match name {
                "Shards" => self.shards = decode_object_array(r, tag, "Shards")?,
                _ => r.skip_unknown(tag, name, "KeyspacePartition")?,
            }
        }
        r.end_block(block, "KeyspacePartition")
    }
}
