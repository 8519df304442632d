//! Read-ahead strategy for objects consumed front to back.

use crate::detached::DetachedTasks;
use crate::{LogicalIo, LogicalIoConfig};
use async_trait::async_trait;
use parking_lot::Mutex;
use ra_error::Result;
use ra_physical::PhysicalIo;
use ra_telemetry::{Operation, Telemetry, names};
use ra_types::{IoPlan, ObjectFormat, ObjectMetadata, Range};
use std::sync::Arc;
use tracing::trace;

#[derive(Debug)]
struct ReadAhead {
    /// Where the next read lands if the caller keeps reading sequentially.
    next_pos: u64,
    /// Read-ahead window for the next read.
    window: u64,
    /// End (exclusive) of what has been requested ahead of the cursor.
    requested_to: u64,
}

/// Pass-through reads plus geometric read-ahead.
///
/// Each read that continues where the previous one stopped doubles the
/// window, up to the configured maximum. Any other read resets it.
pub struct SequentialLogicalIo {
    physical: Arc<dyn PhysicalIo>,
    telemetry: Telemetry,
    base: u64,
    max: u64,
    state: Mutex<ReadAhead>,
    tasks: DetachedTasks,
}

impl SequentialLogicalIo {
    pub fn new(physical: Arc<dyn PhysicalIo>, telemetry: Telemetry, config: &LogicalIoConfig) -> Self {
        let base = config.sequential_prefetch_base.max(1);
        Self {
            physical,
            telemetry,
            base,
            max: config.sequential_prefetch_max.max(base),
            state: Mutex::new(ReadAhead {
                next_pos: 0,
                window: base,
                requested_to: 0,
            }),
            tasks: DetachedTasks::default(),
        }
    }

    /// Record a read of `len` bytes at `pos` and return the read-ahead range.
    fn advance(&self, pos: u64, len: u64, size: u64) -> Option<Range> {
        let mut state = self.state.lock();
        if pos != state.next_pos {
            trace!(uri = %self.physical.uri(), pos, expected = state.next_pos, "Seek detected, resetting read-ahead");
            state.window = self.base;
            state.requested_to = 0;
        }
        state.next_pos = pos + len;

        let start = state.next_pos.max(state.requested_to);
        let end = state.next_pos.saturating_add(state.window).min(size);
        state.window = state.window.saturating_mul(2).min(self.max);
        if start >= end {
            return None;
        }
        state.requested_to = end;
        Range::new(start, end - 1).ok()
    }

    fn read_ahead(&self, range: Range) {
        let physical = Arc::clone(&self.physical);
        let telemetry = self.telemetry.clone();
        let operation = Operation::new(names::SEQUENTIAL_PREFETCH)
            .with_attribute("uri", self.physical.uri())
            .with_attribute("range", range);

        self.tasks.spawn(names::SEQUENTIAL_PREFETCH, self.physical.uri(), async move {
            let execution = telemetry
                .measure(operation, physical.execute(IoPlan::single(range)))
                .await?;
            execution.wait().await
        });
    }

    async fn after_read(&self, pos: u64, len: usize) -> Result<()> {
        if len == 0 {
            return Ok(());
        }
        let size = self.physical.metadata().await?.size;
        if let Some(range) = self.advance(pos, len as u64, size) {
            self.read_ahead(range);
        }
        Ok(())
    }
}

#[async_trait]
impl LogicalIo for SequentialLogicalIo {
    fn format(&self) -> ObjectFormat {
        ObjectFormat::Sequential
    }

    async fn metadata(&self) -> Result<ObjectMetadata> {
        self.physical.metadata().await
    }

    async fn read_byte(&self, pos: u64) -> Result<u8> {
        let byte = self.physical.read_byte(pos).await?;
        self.after_read(pos, 1).await?;
        Ok(byte)
    }

    async fn read(&self, buf: &mut [u8], pos: u64) -> Result<usize> {
        let read = self.physical.read(buf, pos).await?;
        self.after_read(pos, read).await?;
        Ok(read)
    }

    async fn read_tail(&self, buf: &mut [u8]) -> Result<usize> {
        self.physical.read_tail(buf).await
    }

    async fn wait_for_prefetches(&self) {
        self.tasks.wait().await;
    }

    fn close(&self) {
        self.physical.close();
    }
}
