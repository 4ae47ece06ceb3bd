//! # srvtopo
//!
//! Serving-topology records and the self-describing binary codec used to
//! store them. A [`SrvShard`] describes one shard's key range and the tablet
//! types it serves; a [`SrvKeyspace`] aggregates a keyspace's partitions per
//! tablet type together with its sharding column and redirections.
//!
//! ```no_run
//! use srvtopo::{decode, encode, KeyRange, SrvShard, TabletType};
//!
//! let mut shard = SrvShard::with_key_range(KeyRange::new(vec![0x80u8], vec![0xc0u8]));
//! shard.served_types.push(TabletType::master());
//!
//! let bytes = encode(&shard);
//! let copy: SrvShard = decode(&bytes).unwrap();
//! assert_eq!(copy.shard_name(), "80-c0");
//! ```

pub mod bson;
pub mod codec;
pub mod config;
pub mod error;
pub mod key;
pub mod metrics;
pub mod topo;

pub use bson::BsonCodec;
pub use codec::{decode, encode, TopoCodec};
pub use config::CodecConfig;
pub use error::{Error, Result};
pub use key::{KeyRange, KeyspaceId, KeyspaceIdType};
pub use metrics::CodecMetrics;
pub use topo::{KeyspacePartition, SrvKeyspace, SrvShard, TabletType, SHARD_ZERO};
