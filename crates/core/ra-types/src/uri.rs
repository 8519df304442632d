//! Object identity.

use ra_error::{RaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique remote object, named by bucket and key.
///
/// Equality and hashing are by value, so two independently parsed URIs for
/// the same object share cache entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectUri {
    /// Bucket (container) name
    pub bucket: String,

    /// Object key within the bucket
    pub key: String,
}

impl ObjectUri {
    /// Create an object URI from a bucket and key.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parse an `s3://bucket/key` URI.
    pub fn parse(uri: &str) -> Result<Self> {
        let url = url::Url::parse(uri)
            .map_err(|e| RaError::InvalidArgument(format!("Invalid S3 URI '{}': {}", uri, e)))?;

        if url.scheme() != "s3" {
            return Err(RaError::InvalidArgument(format!(
                "Expected s3:// URI, got: {}",
                uri
            )));
        }

        let bucket = url
            .host_str()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| RaError::InvalidArgument(format!("Missing bucket in S3 URI: {}", uri)))?;

        let key = url.path().trim_start_matches('/');
        if key.is_empty() {
            return Err(RaError::InvalidArgument(format!(
                "Missing key in S3 URI: {}",
                uri
            )));
        }

        Ok(Self::new(bucket, key))
    }

    /// The last path component of the key.
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }
}

impl fmt::Display for ObjectUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}
