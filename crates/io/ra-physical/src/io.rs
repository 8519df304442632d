//! Per-stream physical I/O.

use crate::{BlobStore, IoPlanExecution, MetadataStore};
use async_trait::async_trait;
use ra_error::{RaError, Result};
use ra_types::{IoPlan, ObjectMetadata, ObjectUri};
use std::sync::Arc;
use tracing::debug;

/// Byte-level access to one object through the shared caches.
#[async_trait]
pub trait PhysicalIo: Send + Sync {
    /// The object this handle reads.
    fn uri(&self) -> &ObjectUri;

    /// Object metadata, resolved through the metadata cache.
    async fn metadata(&self) -> Result<ObjectMetadata>;

    /// Read the byte at `pos`.
    async fn read_byte(&self, pos: u64) -> Result<u8>;

    /// Read into `buf` starting at `pos`, returning the number of bytes read.
    async fn read(&self, buf: &mut [u8], pos: u64) -> Result<usize>;

    /// Read the last `buf.len()` bytes of the object.
    async fn read_tail(&self, buf: &mut [u8]) -> Result<usize>;

    /// Start populating the cache with `plan`. Used by prefetch tasks only.
    async fn execute(&self, plan: IoPlan) -> Result<IoPlanExecution>;

    /// Release this handle. Shared caches stay open.
    fn close(&self);
}

/// [`PhysicalIo`] over the factory's [`MetadataStore`] and [`BlobStore`].
pub struct PhysicalIoImpl {
    uri: ObjectUri,
    metadata_store: Arc<MetadataStore>,
    blob_store: Arc<BlobStore>,
}

impl PhysicalIoImpl {
    pub fn new(
        uri: ObjectUri,
        metadata_store: Arc<MetadataStore>,
        blob_store: Arc<BlobStore>,
    ) -> Self {
        Self {
            uri,
            metadata_store,
            blob_store,
        }
    }

    async fn size(&self) -> Result<u64> {
        Ok(self.metadata_store.get(&self.uri).await?.size)
    }

    async fn check_position(&self, pos: u64) -> Result<()> {
        let size = self.size().await?;
        if pos >= size {
            return Err(RaError::InvalidArgument(format!(
                "position {} is beyond the end of {} ({} bytes)",
                pos, self.uri, size
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl PhysicalIo for PhysicalIoImpl {
    fn uri(&self) -> &ObjectUri {
        &self.uri
    }

    async fn metadata(&self) -> Result<ObjectMetadata> {
        self.metadata_store.get(&self.uri).await
    }

    async fn read_byte(&self, pos: u64) -> Result<u8> {
        self.check_position(pos).await?;
        let mut byte = [0u8; 1];
        self.blob_store.read(&self.uri, &mut byte, pos).await?;
        Ok(byte[0])
    }

    async fn read(&self, buf: &mut [u8], pos: u64) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.check_position(pos).await?;
        self.blob_store.read(&self.uri, buf, pos).await
    }

    async fn read_tail(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let size = self.size().await?;
        let len = buf.len() as u64;
        if len > size {
            return Err(RaError::InvalidArgument(format!(
                "tail of {} bytes exceeds size of {} ({} bytes)",
                len, self.uri, size
            )));
        }
        self.blob_store.read(&self.uri, buf, size - len).await
    }

    async fn execute(&self, plan: IoPlan) -> Result<IoPlanExecution> {
        self.blob_store.execute(&self.uri, &plan).await
    }

    fn close(&self) {
        debug!(uri = %self.uri, "Physical I/O closed");
    }
}
