//! Object metadata.

use serde::{Deserialize, Serialize};

/// Cached facts about a remote object.
///
/// Objects are immutable, so metadata is set once per object and never refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    /// Object size in bytes
    pub size: u64,

    /// Entity tag reported by the store, if any
    pub etag: Option<String>,
}

impl ObjectMetadata {
    /// Metadata with a known size and no etag.
    pub fn new(size: u64) -> Self {
        Self { size, etag: None }
    }

    /// Set the entity tag.
    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }
}
