//! Tablet roles
//!
//! A tablet type names the traffic class a database replica serves. The set
//! of roles is open; well-known ones have constructors, and every role is
//! compared and stored by its string form.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Role of a database replica
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabletType(String);

impl TabletType {
    /// Create a tablet type from its string form
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Primary, accepting writes
    pub fn master() -> Self {
        Self::new("master")
    }

    /// Replica serving read traffic
    pub fn replica() -> Self {
        Self::new("replica")
    }

    /// Read-only replica for batch and analytics traffic
    pub fn rdonly() -> Self {
        Self::new("rdonly")
    }

    /// Replica reserved for batch jobs
    pub fn batch() -> Self {
        Self::new("batch")
    }

    /// Get the string form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabletType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TabletType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TabletType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for TabletType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl From<&str> for TabletType {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}
