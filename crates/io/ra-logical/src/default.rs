//! Pass-through strategy.

use crate::LogicalIo;
use async_trait::async_trait;
use ra_error::Result;
use ra_physical::PhysicalIo;
use ra_types::{ObjectFormat, ObjectMetadata};
use std::sync::Arc;

/// Forwards every call to physical I/O unchanged. No prefetching.
pub struct DefaultLogicalIo {
    physical: Arc<dyn PhysicalIo>,
}

impl DefaultLogicalIo {
    pub fn new(physical: Arc<dyn PhysicalIo>) -> Self {
        Self { physical }
    }
}

#[async_trait]
impl LogicalIo for DefaultLogicalIo {
    fn format(&self) -> ObjectFormat {
        ObjectFormat::Default
    }

    async fn metadata(&self) -> Result<ObjectMetadata> {
        self.physical.metadata().await
    }

    async fn read_byte(&self, pos: u64) -> Result<u8> {
        self.physical.read_byte(pos).await
    }

    async fn read(&self, buf: &mut [u8], pos: u64) -> Result<usize> {
        self.physical.read(buf, pos).await
    }

    async fn read_tail(&self, buf: &mut [u8]) -> Result<usize> {
        self.physical.read_tail(buf).await
    }

    fn close(&self) {
        self.physical.close();
    }
}
