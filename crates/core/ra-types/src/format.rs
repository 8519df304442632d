//! Object classification and stream open options.

use crate::ObjectMetadata;
use serde::{Deserialize, Serialize};

/// Read strategy selected for an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectFormat {
    /// Plain pass-through reads
    Default,

    /// Whole-object sequential consumption with read-ahead
    Sequential,

    /// Apache Parquet, footer-first and column-selective
    ColumnarParquet,
}

impl std::fmt::Display for ObjectFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Sequential => write!(f, "sequential"),
            Self::ColumnarParquet => write!(f, "columnar_parquet"),
        }
    }
}

/// Access policy hint supplied by the caller when opening a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadPolicy {
    /// No particular access pattern
    Default,

    /// The whole object will be read front to back
    Sequential,
}

/// Information known about an object at open time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenOptions {
    /// Caller access policy hint
    pub policy: Option<ReadPolicy>,

    /// Metadata already known to the caller; skips the HEAD request
    pub metadata: Option<ObjectMetadata>,
}

impl OpenOptions {
    /// Options with nothing known up front.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the access policy hint.
    pub fn with_policy(mut self, policy: ReadPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Provide the object metadata.
    pub fn with_metadata(mut self, metadata: ObjectMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
