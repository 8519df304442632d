//! Configuration for the physical I/O layer.

use ra_error::{RaError, Result};
use ra_types::ONE_MB;
use serde::{Deserialize, Serialize};

/// Default maximum size of a single upstream GET (8MB).
pub const DEFAULT_MAX_RANGE_SIZE: u64 = 8 * ONE_MB;

/// Default number of objects whose blocks are kept.
pub const DEFAULT_BLOB_STORE_CAPACITY: usize = 256;

/// Default number of objects whose metadata is kept.
pub const DEFAULT_METADATA_STORE_CAPACITY: usize = 1024;

/// Configuration for physical I/O.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalIoConfig {
    /// Maximum length of one upstream range request.
    ///
    /// Larger ranges are split so that per-request memory and latency stay
    /// bounded and big reads are fetched in parallel.
    pub max_range_size: u64,

    /// Maximum number of objects with cached blocks. The least recently
    /// used object without in-flight fetches is evicted first.
    pub blob_store_capacity: usize,

    /// Maximum number of objects with cached metadata.
    pub metadata_store_capacity: usize,
}

impl Default for PhysicalIoConfig {
    fn default() -> Self {
        Self {
            max_range_size: DEFAULT_MAX_RANGE_SIZE,
            blob_store_capacity: DEFAULT_BLOB_STORE_CAPACITY,
            metadata_store_capacity: DEFAULT_METADATA_STORE_CAPACITY,
        }
    }
}

impl PhysicalIoConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum range size.
    pub fn with_max_range_size(mut self, size: u64) -> Self {
        self.max_range_size = size;
        self
    }

    /// Set how many objects the blob store keeps.
    pub fn with_blob_store_capacity(mut self, capacity: usize) -> Self {
        self.blob_store_capacity = capacity;
        self
    }

    /// Set how many objects the metadata store keeps.
    pub fn with_metadata_store_capacity(mut self, capacity: usize) -> Self {
        self.metadata_store_capacity = capacity;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_range_size == 0 {
            return Err(RaError::Config(
                "max_range_size must be at least 1".to_string(),
            ));
        }
        if self.blob_store_capacity == 0 {
            return Err(RaError::Config(
                "blob_store_capacity must be at least 1".to_string(),
            ));
        }
        if self.metadata_store_capacity == 0 {
            return Err(RaError::Config(
                "metadata_store_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
