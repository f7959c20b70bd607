//! Stream identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque name of one independent, ordered event log.
///
/// Streams are conventionally named `{aggregate-kind}-{aggregate-id}` so
/// that every aggregate instance owns exactly one stream. The name is
/// immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamId(String);

impl StreamId {
    /// Creates a stream id from a raw name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates the canonical stream id for an aggregate instance.
    #[must_use]
    pub fn for_aggregate(kind: &str, id: Uuid) -> Self {
        Self(format!("{kind}-{id}"))
    }

    /// Returns the stream name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StreamId {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}
