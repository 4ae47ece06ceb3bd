//! Serving view of a keyspace
//!
//! A [`SrvKeyspace`] is the distilled copy of keyspace detail kept in each
//! cell for fast access: the partitions per tablet type, the legacy flat
//! shard list, sharding column metadata and the roles served from another
//! keyspace.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::bson::{
    decode_object_array, decode_object_map, decode_string_array, decode_string_map,
    encode_object_array, encode_object_map, encode_string_array, encode_string_map,
    verify_object, BsonCodec, BsonReader, BsonWriter, Tag,
};
use crate::error::{Error, Result};
use crate::key::KeyspaceIdType;
use crate::topo::{sort_shards, KeyspacePartition, SrvShard, TabletType};

/// Local-cell serving record of a keyspace
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SrvKeyspace {
    /// Shards to use per tablet type; only complete partitions
    pub partitions: HashMap<TabletType, KeyspacePartition>,
    /// Legacy flat shard list, superseded by `partitions`
    pub shards: Vec<SrvShard>,
    /// Tablet types with at least one serving tablet in this cell
    pub tablet_types: Vec<TabletType>,
    /// Name of the column rows are sharded by
    pub sharding_column_name: String,
    /// Value domain of the sharding column
    pub sharding_column_type: KeyspaceIdType,
    /// Tablet types served by another keyspace, mapped to that keyspace
    pub served_from: HashMap<TabletType, String>,
    /// Store version this record was read at
    #[serde(skip)]
    version: i64,
}

impl SrvKeyspace {
    /// Create an empty record tagged with the store version it belongs to
    pub fn new(version: i64) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    /// Store version this record was read at
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Partition serving `tablet_type`, if any
    pub fn partition(&self, tablet_type: &TabletType) -> Option<&KeyspacePartition> {
        self.partitions.get(tablet_type)
    }

    /// Keyspace that serves `tablet_type` instead of this one, if redirected
    pub fn served_from(&self, tablet_type: &TabletType) -> Option<&str> {
        self.served_from
            .get(tablet_type)
            .map(String::as_str)
            .filter(|keyspace| !keyspace.is_empty())
    }

    /// Sort the legacy shard list and every partition by key range
    pub fn sort_shards(&mut self) {
        sort_shards(&mut self.shards);
        for partition in self.partitions.values_mut() {
            partition.sort();
        }
    }

    /// Reject redirections that point a role back at this keyspace.
    ///
    /// The codec never calls this; it is for the layer that builds records.
    pub fn check_served_from(&self, own_keyspace: &str) -> Result<()> {
        let mut self_redirects: Vec<&str> = self
            .served_from
            .iter()
            .filter(|(_, keyspace)| keyspace.as_str() == own_keyspace)
            .map(|(tablet_type, _)| tablet_type.as_str())
            .collect();
        if self_redirects.is_empty() {
            return Ok(());
        }
        self_redirects.sort_unstable();
        Err(Error::topology(format!(
            "keyspace {} redirects {} to itself",
            own_keyspace,
            self_redirects.join(", ")
        )))
    }
}

impl PartialEq for SrvKeyspace {
    fn eq(&self, other: &Self) -> bool {
        self.partitions == other.partitions
            && self.shards == other.shards
            && self.tablet_types == other.tablet_types
            && self.sharding_column_name == other.sharding_column_name
            && self.sharding_column_type == other.sharding_column_type
            && self.served_from == other.served_from
    }
}

impl Eq for SrvKeyspace {}

impl BsonCodec for SrvKeyspace {
    fn marshal_bson(&self, w: &mut BsonWriter, key: &str) {
        w.write_optional_prefix(Tag::Object, key);
        let block = w.begin_block();

        encode_object_map(w, "Partitions", &self.partitions);
        encode_object_array(w, "Shards", &self.shards);
        encode_string_array(w, "TabletTypes", &self.tablet_types);
        w.write_string("ShardingColumnName", &self.sharding_column_name);
        w.write_string("ShardingColumnType", self.sharding_column_type.name());
        encode_string_map(w, "ServedFrom", &self.served_from);

        w.end_block(block);
    }

    fn unmarshal_bson(&mut self, r: &mut BsonReader<'_>, tag: Tag) -> Result<()> {
        verify_object(tag, "SrvKeyspace")?;
        let block = r.begin_block("SrvKeyspace")?;
        while let Some((tag, name)) = r.next_field("SrvKeyspace")? {
            match name {
                "Partitions" => self.partitions = decode_object_map(r, tag, "Partitions")?,
                "Shards" => self.shards = decode_object_array(r, tag, "Shards")?,
                "TabletTypes" => {
                    self.tablet_types = decode_string_array(r, tag, "TabletTypes")?
                }
                "ShardingColumnName" => {
                    self.sharding_column_name = r.read_string(tag, "ShardingColumnName")?
                }
                "ShardingColumnType" => {
                    let raw = r.read_string(tag, "ShardingColumnType")?;
                    self.sharding_column_type = KeyspaceIdType::from_name(raw);
                }
                "ServedFrom" => self.served_from = decode_string_map(r, tag, "ServedFrom")?,
                _ => r.skip_unknown(tag, name, "SrvKeyspace")?,
            }
        }
        r.end_block(block, "SrvKeyspace")
    }
}
