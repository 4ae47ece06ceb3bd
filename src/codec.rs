//! Top-level encode and decode
//!
//! [`TopoCodec`] turns records into standalone documents and back, applying
//! the limits from [`CodecConfig`] and feeding [`CodecMetrics`]. Decoding is
//! all-or-nothing: on any fault the caller gets an error and no value.

use std::any::type_name;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::bson::{BsonCodec, BsonReader, BsonWriter, Tag};
use crate::config::CodecConfig;
use crate::error::{Error, Result};
use crate::metrics::CodecMetrics;

/// Encoder/decoder for topology records
#[derive(Debug, Clone)]
pub struct TopoCodec {
    config: CodecConfig,
    metrics: Option<Arc<CodecMetrics>>,
}

impl Default for TopoCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl TopoCodec {
    /// Create a codec with the default configuration
    pub fn new() -> Self {
        Self::from_valid_config(CodecConfig::default())
    }

    /// Create a codec with a custom configuration
    pub fn with_config(config: CodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: CodecConfig) -> Self {
        let metrics = config
            .collect_metrics
            .then(|| Arc::new(CodecMetrics::new()));
        Self { config, metrics }
    }

    /// Report into a shared metrics collector
    pub fn with_metrics(mut self, metrics: Arc<CodecMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Get the configuration
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Get the metrics collector, if metrics are collected
    pub fn metrics(&self) -> Option<&Arc<CodecMetrics>> {
        self.metrics.as_ref()
    }

    /// Encode a record as a standalone document
    pub fn encode<T: BsonCodec>(&self, value: &T) -> Vec<u8> {
        let start = Instant::now();
        let mut w = BsonWriter::new();
        value.marshal_bson(&mut w, "");
        let bytes = w.into_bytes();

        debug!(record = type_name::<T>(), bytes = bytes.len(), "encoded record");
        if let Some(metrics) = &self.metrics {
            metrics.record_encode(bytes.len(), start.elapsed());
        }
        bytes
    }

    /// Decode a standalone document into a new record
    pub fn decode<T: BsonCodec + Default>(&self, bytes: &[u8]) -> Result<T> {
        let mut value = T::default();
        self.decode_in_place(bytes, &mut value)?;
        Ok(value)
    }

    /// Decode a standalone document into an existing record.
    ///
    /// Fields present in the document replace those of `target`; fields it
    /// lacks and the record's version token are kept. On error `target` is
    /// left unchanged.
    pub fn decode_into<T: BsonCodec + Clone>(&self, bytes: &[u8], target: &mut T) -> Result<()> {
        let mut staged = target.clone();
        self.decode_in_place(bytes, &mut staged)?;
        *target = staged;
        Ok(())
    }

    fn decode_in_place<T: BsonCodec>(&self, bytes: &[u8], value: &mut T) -> Result<()> {
        let start = Instant::now();
        let mut r = BsonReader::new(bytes).with_max_depth(self.config.max_nesting_depth);

        let result = self.check_size(bytes).and_then(|()| {
            value.unmarshal_bson(&mut r, Tag::Object)?;
            if r.remaining() != 0 {
                return Err(Error::length_mismatch(
                    "document",
                    r.position(),
                    bytes.len(),
                ));
            }
            Ok(())
        });

        match result {
            Ok(()) => {
                debug!(
                    record = type_name::<T>(),
                    bytes = bytes.len(),
                    skipped_fields = r.skipped_fields(),
                    "decoded record"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_decode(bytes.len(), r.skipped_fields(), start.elapsed());
                }
                Ok(())
            }
            Err(err) => {
                warn!(record = type_name::<T>(), error = %err, "failed to decode record");
                if let Some(metrics) = &self.metrics {
                    metrics.record_fault(&err);
                }
                Err(err)
            }
        }
    }

    fn check_size(&self, bytes: &[u8]) -> Result<()> {
        if bytes.len() > self.config.max_document_size {
            return Err(Error::DocumentTooLarge {
                size: bytes.len(),
                limit: self.config.max_document_size,
            });
        }
        Ok(())
    }

    /// Encode independent records in parallel
    pub fn encode_batch<T: BsonCodec + Sync>(&self, values: &[T]) -> Vec<Vec<u8>> {
        values.par_iter().map(|value| self.encode(value)).collect()
    }

    /// Decode independent documents in parallel, one result per document
    pub fn decode_batch<T, B>(&self, buffers: &[B]) -> Vec<Result<T>>
    where
        T: BsonCodec + Default + Send,
        B: AsRef<[u8]> + Sync,
    {
        buffers
            .par_iter()
            .map(|bytes| self.decode(bytes.as_ref()))
            .collect()
    }
}

/// Encode a record with the default configuration and no metrics
pub fn encode<T: BsonCodec>(value: &T) -> Vec<u8> {
    plain_codec().encode(value)
}

/// Decode a record with the default configuration and no metrics
pub fn decode<T: BsonCodec + Default>(bytes: &[u8]) -> Result<T> {
    plain_codec().decode(bytes)
}

fn plain_codec() -> TopoCodec {
    TopoCodec::from_valid_config(CodecConfig::default().with_collect_metrics(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{KeyRange, KeyspaceIdType};
    use crate::topo::{KeyspacePartition, SrvKeyspace, SrvShard, TabletType};

    fn shard(start: &[u8], end: &[u8]) -> SrvShard {
        let mut s = SrvShard::with_key_range(KeyRange::new(start, end));
        s.served_types = vec![TabletType::master(), TabletType::replica(), TabletType::rdonly()];
        s.tablet_types = vec![TabletType::master(), TabletType::replica()];
        s
    }

    fn keyspace() -> SrvKeyspace {
        let partition = KeyspacePartition::new(vec![
            shard(&[], &[0x40]),
            shard(&[0x40], &[0x80]),
            shard(&[0x80], &[0xc0]),
            shard(&[0xc0], &[]),
        ]);
        let mut ks = SrvKeyspace::new(1);
        for tablet_type in [TabletType::master(), TabletType::replica(), TabletType::rdonly()] {
            ks.partitions.insert(tablet_type, partition.clone());
        }
        ks.shards = partition.shards;
        ks.tablet_types = vec![TabletType::master(), TabletType::replica()];
        ks.sharding_column_name = "keyspace_id".to_string();
        ks.sharding_column_type = KeyspaceIdType::Bytes;
        ks.served_from.insert(TabletType::batch(), "legacy_ks".to_string());
        ks
    }

    #[test]
    fn test_top_level_layout() {
        let bytes = encode(&SrvShard::default());
        let declared = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        assert_eq!(declared as usize, bytes.len());
        assert_eq!(*bytes.last().unwrap(), 0);
        // KeyRange is the first field and carries a name
        assert_eq!(bytes[4], Tag::Object as u8);
        assert_eq!(&bytes[5..14], b"KeyRange\0");
    }

    #[test]
    fn test_every_truncation_is_a_fault() {
        let bytes = encode(&keyspace());
        for cut in 0..bytes.len() {
            let err = decode::<SrvKeyspace>(&bytes[..cut]).unwrap_err();
            assert!(err.is_decode_fault(), "cut at {}: {}", cut, err);
        }
    }

    #[test]
    fn test_corrupted_bytes_never_panic() {
        let bytes = encode(&keyspace());
        for i in 0..bytes.len() {
            for flip in [0x01u8, 0x80, 0xff] {
                let mut corrupt = bytes.clone();
                corrupt[i] ^= flip;
                // Any outcome is acceptable as long as it is a value or an error.
                let _ = decode::<SrvKeyspace>(&corrupt);
            }
        }
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = encode(&SrvShard::default());
        bytes.push(0);
        let err = decode::<SrvShard>(&bytes).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { .. }));
    }

    #[test]
    fn test_document_size_limit() {
        let codec =
            TopoCodec::with_config(CodecConfig::new().with_max_document_size(64)).unwrap();
        let bytes = codec.encode(&keyspace());
        assert!(bytes.len() > 64);
        let err = codec.decode::<SrvKeyspace>(&bytes).unwrap_err();
        assert!(matches!(err, Error::DocumentTooLarge { limit: 64, .. }));
    }

    #[test]
    fn test_nesting_limit() {
        let codec = TopoCodec::with_config(CodecConfig::new().with_max_nesting_depth(6)).unwrap();
        assert!(codec.decode::<SrvKeyspace>(&codec.encode(&keyspace())).is_ok());

        // Unknown fields are skipped by length, so their nesting does not count.
        let mut w = BsonWriter::new();
        let top = w.begin_block();
        let mut open = Vec::new();
        for _ in 0..10 {
            w.write_prefix(Tag::Object, "Nested");
            open.push(w.begin_block());
        }
        while let Some(block) = open.pop() {
            w.end_block(block);
        }
        w.end_block(top);
        assert!(codec.decode::<SrvShard>(&w.into_bytes()).is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = TopoCodec::with_config(CodecConfig::new().with_max_nesting_depth(1)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_decode_into_leaves_target_on_error() {
        let codec = TopoCodec::new();
        let mut target = keyspace();
        let before = target.clone();

        let mut bytes = codec.encode(&SrvKeyspace::default());
        let last = bytes.len() - 1;
        bytes[last] = 0x7f;
        assert!(codec.decode_into(&bytes, &mut target).is_err());
        assert_eq!(target, before);
        assert_eq!(target.version(), 1);
    }

    #[test]
    fn test_metrics_collected() -> Result<()> {
        let codec = TopoCodec::new();
        let bytes = codec.encode(&keyspace());
        let _: SrvKeyspace = codec.decode(&bytes)?;
        assert!(codec.decode::<SrvKeyspace>(&bytes[..10]).is_err());

        let metrics = codec.metrics().unwrap();
        assert_eq!(metrics.documents_encoded(), 1);
        assert_eq!(metrics.documents_decoded(), 1);
        assert_eq!(metrics.decode_faults(), 1);
        assert_eq!(metrics.bytes_encoded(), bytes.len());
        assert_eq!(metrics.unknown_fields_skipped(), 0);
        assert!(metrics.last_fault().is_some());

        let quiet = TopoCodec::with_config(CodecConfig::new().with_collect_metrics(false))?;
        assert!(quiet.metrics().is_none());
        Ok(())
    }

    #[test]
    fn test_batch_matches_sequential() {
        let shared = Arc::new(CodecMetrics::new());
        let codec = TopoCodec::new().with_metrics(shared.clone());

        let records: Vec<SrvKeyspace> = (0..32)
            .map(|i| {
                let mut ks = keyspace();
                ks.sharding_column_name = format!("col_{}", i);
                ks
            })
            .collect();

        let encoded = codec.encode_batch(&records);
        for (record, bytes) in records.iter().zip(&encoded) {
            assert_eq!(*bytes, codec.encode(record));
        }

        let decoded: Vec<Result<SrvKeyspace>> = codec.decode_batch(&encoded);
        for (record, result) in records.iter().zip(decoded) {
            assert_eq!(&result.unwrap(), record);
        }
        assert_eq!(shared.documents_decoded(), 32);
        assert_eq!(shared.documents_encoded(), 64);
    }
}
