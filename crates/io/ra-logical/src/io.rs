//! Logical I/O strategies.

use async_trait::async_trait;
use ra_error::Result;
use ra_types::{ObjectFormat, ObjectMetadata};

/// Per-stream read strategy over physical I/O.
///
/// Every read maps to physical reads of the same bytes; strategies differ
/// only in the prefetching they do around them.
#[async_trait]
pub trait LogicalIo: Send + Sync {
    /// The format this strategy was chosen for.
    fn format(&self) -> ObjectFormat;

    /// Object metadata.
    async fn metadata(&self) -> Result<ObjectMetadata>;

    /// Read the byte at `pos`.
    async fn read_byte(&self, pos: u64) -> Result<u8>;

    /// Read into `buf` starting at `pos`, returning the number of bytes read.
    async fn read(&self, buf: &mut [u8], pos: u64) -> Result<usize>;

    /// Read the last `buf.len()` bytes of the object.
    async fn read_tail(&self, buf: &mut [u8]) -> Result<usize>;

    /// Wait for prefetch tasks spawned by this stream so far.
    ///
    /// Reads never need this; it exists so callers can observe prefetching.
    async fn wait_for_prefetches(&self) {}

    /// Release the stream's physical I/O.
    fn close(&self);
}
