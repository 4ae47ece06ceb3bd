//! Configuration for srvtopo
//!
//! Limits applied while decoding untrusted bytes, and whether the codec
//! collects metrics.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bson::DEFAULT_MAX_DEPTH;
use crate::error::{Error, Result};

/// Largest document accepted by default (16 MiB)
pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 16 * 1024 * 1024;

/// Deepest nesting a keyspace record needs: document, partition map,
/// partition, shard array, shard, key range
pub const MIN_NESTING_DEPTH: usize = 6;

/// Configuration options for a [`TopoCodec`](crate::codec::TopoCodec)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct CodecConfig {
    /// Largest document accepted by decode, in bytes
    pub max_document_size: usize,
    /// Deepest block nesting accepted by decode
    pub max_nesting_depth: usize,
    /// Enable metrics collection
    pub collect_metrics: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
            max_nesting_depth: DEFAULT_MAX_DEPTH,
            collect_metrics: true,
        }
    }
}

impl CodecConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the largest accepted document size
    pub fn with_max_document_size(mut self, size: usize) -> Self {
        self.max_document_size = size;
        self
    }

    /// Set the deepest accepted nesting
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Set whether to collect metrics
    pub fn with_collect_metrics(mut self, collect: bool) -> Self {
        self.collect_metrics = collect;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_document_size < 5 {
            return Err(Error::config(
                "Maximum document size must be at least 5 bytes"
            ));
        }

        if self.max_document_size > i32::MAX as usize {
            return Err(Error::config(
                "Maximum document size must fit a 32-bit block length"
            ));
        }

        if self.max_nesting_depth < MIN_NESTING_DEPTH {
            return Err(Error::config(format!(
                "Maximum nesting depth must be at least {}",
                MIN_NESTING_DEPTH
            )));
        }

        Ok(())
    }

    /// Create a human-readable string representation of the configuration
    pub fn to_string_pretty(&self) -> String {
        let mut result = String::new();

        result.push_str("=== Codec Configuration ===\n\n");
        result.push_str(&format!("  Max Document Size: {} bytes\n", self.max_document_size));
        result.push_str(&format!("  Max Nesting Depth: {}\n", self.max_nesting_depth));
        result.push_str(&format!("  Collect Metrics: {}\n", self.collect_metrics));

        result
    }

    /// Parse configuration from JSON; missing keys take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save configuration to a JSON file
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CodecConfig::default();

        assert_eq!(config.max_document_size, 16 * 1024 * 1024);
        assert_eq!(config.max_nesting_depth, 32);
        assert!(config.collect_metrics);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = CodecConfig::new()
            .with_max_document_size(4096)
            .with_max_nesting_depth(8)
            .with_collect_metrics(false);

        assert_eq!(config.max_document_size, 4096);
        assert_eq!(config.max_nesting_depth, 8);
        assert!(!config.collect_metrics);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let invalid_configs = vec![
            CodecConfig::new().with_max_document_size(4), // Too small
            CodecConfig::new().with_max_document_size(i32::MAX as usize + 1), // Too large
            CodecConfig::new().with_max_nesting_depth(5), // Too shallow
        ];

        for config in invalid_configs {
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn test_config_json() -> Result<()> {
        let config = CodecConfig::from_json(r#"{"max_nesting_depth": 12}"#)?;
        assert_eq!(config.max_nesting_depth, 12);
        assert_eq!(config.max_document_size, DEFAULT_MAX_DOCUMENT_SIZE);

        assert!(CodecConfig::from_json(r#"{"max_nesting_depth": 2}"#).is_err());
        assert!(CodecConfig::from_json("not json").is_err());
        Ok(())
    }

    #[test]
    fn test_config_file_round_trip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("codec.json");

        let config = CodecConfig::new().with_max_document_size(1 << 20);
        config.to_json_file(&path)?;
        assert_eq!(CodecConfig::from_json_file(&path)?, config);
        Ok(())
    }

    #[test]
    fn test_config_pretty_string() {
        let pretty = CodecConfig::new().to_string_pretty();
        assert!(pretty.contains("Codec Configuration"));
        assert!(pretty.contains("Max Nesting Depth: 32"));
    }
}
