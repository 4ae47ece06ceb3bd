//! Serving topology records
//!
//! These records describe how a keyspace is split into shards and which
//! shards serve each tablet type in the local cell. They are written to
//! and read from the topology store with the codec in [`crate::bson`].

mod tablet_type;
mod srv_shard;
mod partition;
mod srv_keyspace;

pub use tablet_type::TabletType;
pub use srv_shard::SrvShard;
pub use partition::{sort_shards, KeyspacePartition};
pub use srv_keyspace::SrvKeyspace;

/// Name of the single shard of an unsharded keyspace
pub const SHARD_ZERO: &str = "0";
