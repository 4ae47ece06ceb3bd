//! Error handling for srvtopo
//!
//! This module provides the error type and result alias shared by the wire
//! codec, the topology records and the codec configuration.

use std::io;
use thiserror::Error;

use crate::bson::Tag;

/// Errors that can occur in srvtopo operations
#[derive(Error, Debug)]
pub enum Error {
    /// A slot's wire tag is not one of the kinds allowed for it
    #[error("Unexpected data type {} for {context}", tag_name(.tag))]
    UnexpectedTag {
        tag: u8,
        context: String,
    },

    /// A read would run past the end of the supplied buffer
    #[error("Truncated input reading {context}: needed {needed} bytes, {available} available")]
    Truncated {
        context: String,
        needed: usize,
        available: usize,
    },

    /// A string or field name is not valid UTF-8
    #[error("Invalid UTF-8 in {context}")]
    InvalidUtf8 {
        context: String,
    },

    /// A decoded value lies outside the domain of its slot
    #[error("Invalid value for {context}: {value}")]
    InvalidValue {
        context: String,
        value: String,
    },

    /// A block's declared length disagrees with the bytes its contents used
    #[error("Length mismatch in {context}: declared {declared} bytes, consumed {consumed}")]
    LengthMismatch {
        context: String,
        declared: usize,
        consumed: usize,
    },

    /// The document exceeds the configured size limit
    #[error("Document of {size} bytes exceeds the limit of {limit} bytes")]
    DocumentTooLarge {
        size: usize,
        limit: usize,
    },

    /// The document nests deeper than the configured limit
    #[error("Nesting depth {depth} exceeds the limit of {limit}")]
    NestingTooDeep {
        depth: usize,
        limit: usize,
    },

    /// Errors raised by topology validation helpers
    #[error("Topology error: {0}")]
    Topology(String),

    /// Errors related to configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to I/O operations
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to JSON (de)serialization of configuration
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn tag_name(tag: &u8) -> String {
    Tag::describe(*tag)
}

/// Result type for srvtopo operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new unexpected tag error
    pub fn unexpected_tag(tag: u8, context: impl Into<String>) -> Self {
        Self::UnexpectedTag {
            tag,
            context: context.into(),
        }
    }

    /// Create a new truncation error
    pub fn truncated(context: impl Into<String>, needed: usize, available: usize) -> Self {
        Self::Truncated {
            context: context.into(),
            needed,
            available,
        }
    }

    /// Create a new invalid UTF-8 error
    pub fn invalid_utf8(context: impl Into<String>) -> Self {
        Self::InvalidUtf8 {
            context: context.into(),
        }
    }

    /// Create a new invalid value error
    pub fn invalid_value(context: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            context: context.into(),
            value: value.into(),
        }
    }

    /// Create a new length mismatch error
    pub fn length_mismatch(context: impl Into<String>, declared: usize, consumed: usize) -> Self {
        Self::LengthMismatch {
            context: context.into(),
            declared,
            consumed,
        }
    }

    /// Create a new topology error
    pub fn topology(message: impl Into<String>) -> Self {
        Self::Topology(message.into())
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this is an unexpected tag error
    pub fn is_unexpected_tag(&self) -> bool {
        matches!(self, Self::UnexpectedTag { .. })
    }

    /// Check if this is a truncation error
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }

    /// Check if this error means the bytes could not be decoded.
    ///
    /// Callers should treat such a record as corrupt or written by an
    /// incompatible schema, and must discard any partially decoded value.
    pub fn is_decode_fault(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedTag { .. }
                | Self::Truncated { .. }
                | Self::InvalidUtf8 { .. }
                | Self::InvalidValue { .. }
                | Self::LengthMismatch { .. }
                | Self::DocumentTooLarge { .. }
                | Self::NestingTooDeep { .. }
        )
    }

    /// Get a user-friendly suggestion for resolving the error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::UnexpectedTag { .. } | Self::InvalidValue { .. } => {
                Some("The record was written by an incompatible schema version".to_string())
            }
            Self::Truncated { .. } | Self::LengthMismatch { .. } | Self::InvalidUtf8 { .. } => {
                Some("The record is corrupt. Re-read it from the topology store".to_string())
            }
            Self::DocumentTooLarge { .. } | Self::NestingTooDeep { .. } => {
                Some("Raise the codec limits if the record is legitimate".to_string())
            }
            Self::Io(err) if err.kind() == io::ErrorKind::NotFound => {
                Some("The specified file does not exist".to_string())
            }
            _ => None,
        }
    }
}
