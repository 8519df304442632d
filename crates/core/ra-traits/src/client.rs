//! Transport client trait.

use async_trait::async_trait;
use bytes::Bytes;
use ra_error::Result;
use ra_types::{ObjectMetadata, ObjectUri, Range};

/// Trait for the raw object-storage transport.
///
/// Both operations are idempotent and safe to retry. Retry policy, timeouts
/// and connection management belong to the implementation.
///
/// # Implementations
///
/// - `ObjectStoreClient`: backed by the `object_store` crate (S3 or in-memory)
/// - `S3Client`: backed by the AWS SDK
#[async_trait]
pub trait ObjectClient: Send + Sync {
    /// Fetches object metadata (size, etag) without reading the body.
    ///
    /// Fails with `NotFound` when the object does not exist.
    async fn head_object(&self, uri: &ObjectUri) -> Result<ObjectMetadata>;

    /// Fetches the bytes of `range` (inclusive on both ends).
    ///
    /// Fails with `NotFound` when the object does not exist.
    async fn get_object_range(&self, uri: &ObjectUri, range: Range) -> Result<Bytes>;
}

#[async_trait]
impl<T: ObjectClient + ?Sized> ObjectClient for std::sync::Arc<T> {
    async fn head_object(&self, uri: &ObjectUri) -> Result<ObjectMetadata> {
        (**self).head_object(uri).await
    }

    async fn get_object_range(&self, uri: &ObjectUri, range: Range) -> Result<Bytes> {
        (**self).get_object_range(uri, range).await
    }
}
