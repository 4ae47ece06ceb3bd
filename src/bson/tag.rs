//! Wire type tags
//!
//! Every value on the wire is preceded by a one-byte tag naming its kind.

use std::fmt;

/// Wire type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    /// Terminates an object or array
    EndOfObject = 0x00,
    /// 64-bit IEEE 754 float
    Number = 0x01,
    /// UTF-8 string with a trailing NUL
    String = 0x02,
    /// Embedded object
    Object = 0x03,
    /// Embedded array with decimal index field names
    Array = 0x04,
    /// Length-prefixed byte string with a subtype byte
    Binary = 0x05,
    /// Single byte boolean
    Boolean = 0x08,
    /// Milliseconds since the epoch as i64
    Datetime = 0x09,
    /// No body
    Null = 0x0A,
    /// 32-bit signed integer
    Int = 0x10,
    /// 64-bit unsigned integer
    Ulong = 0x11,
    /// 64-bit signed integer
    Long = 0x12,
}

impl Tag {
    /// Map a raw tag byte to a known tag
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::EndOfObject),
            0x01 => Some(Self::Number),
            0x02 => Some(Self::String),
            0x03 => Some(Self::Object),
            0x04 => Some(Self::Array),
            0x05 => Some(Self::Binary),
            0x08 => Some(Self::Boolean),
            0x09 => Some(Self::Datetime),
            0x0A => Some(Self::Null),
            0x10 => Some(Self::Int),
            0x11 => Some(Self::Ulong),
            0x12 => Some(Self::Long),
            _ => None,
        }
    }

    /// Get the name of the tag
    pub fn name(&self) -> &'static str {
        match self {
            Self::EndOfObject => "EndOfObject",
            Self::Number => "Number",
            Self::String => "String",
            Self::Object => "Object",
            Self::Array => "Array",
            Self::Binary => "Binary",
            Self::Boolean => "Boolean",
            Self::Datetime => "Datetime",
            Self::Null => "Null",
            Self::Int => "Int",
            Self::Ulong => "Ulong",
            Self::Long => "Long",
        }
    }

    /// Check if this tag introduces a length-prefixed block
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Object | Self::Array)
    }

    /// Describe a raw tag byte for diagnostics, e.g. `Array (0x04)`
    pub fn describe(byte: u8) -> String {
        match Self::from_byte(byte) {
            Some(tag) => format!("{} (0x{:02x})", tag.name(), byte),
            None => format!("unknown (0x{:02x})", byte),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
