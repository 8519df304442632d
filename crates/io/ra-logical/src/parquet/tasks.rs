//! Parquet prefetch tasks.
//!
//! Each task is cheap to build and runs detached from the stream that
//! triggered it. Failures are returned so the spawner can log them; they
//! never reach a foreground read.

use crate::LogicalIoConfig;
use crate::parquet::{ColumnMappers, ColumnPrefetchStore, footer_length, parse_footer};
use ra_error::{RaError, Result};
use ra_physical::{IoPlanExecution, PhysicalIo};
use ra_telemetry::{Operation, Telemetry, names};
use ra_types::{IoPlan, Range};
use std::sync::Arc;
use tracing::{debug, warn};

/// Prefetches the tail of a parquet object, or all of it when small.
pub struct TailPrefetchTask {
    physical: Arc<dyn PhysicalIo>,
    telemetry: Telemetry,
    footer_caching_enabled: bool,
    footer_caching_size: u64,
    small_object_prefetching_enabled: bool,
    small_object_size_threshold: u64,
}

impl TailPrefetchTask {
    pub fn new(physical: Arc<dyn PhysicalIo>, telemetry: Telemetry, config: &LogicalIoConfig) -> Self {
        Self {
            physical,
            telemetry,
            footer_caching_enabled: config.footer_caching_enabled,
            footer_caching_size: config.footer_caching_size,
            small_object_prefetching_enabled: config.small_object_prefetching_enabled,
            small_object_size_threshold: config.small_object_size_threshold,
        }
    }

    /// Submit the prefetch. `None` when nothing is to be prefetched.
    pub async fn prefetch(&self) -> Result<Option<IoPlanExecution>> {
        let operation =
            Operation::new(names::PARQUET_TAIL_PREFETCH).with_attribute("uri", self.physical.uri());

        self.telemetry
            .measure(operation, async {
                let size = self.physical.metadata().await?.size;
                let Some(range) = self.range(size)? else {
                    return Ok(None);
                };
                debug!(uri = %self.physical.uri(), range = %range, "Prefetching parquet tail");
                self.physical.execute(IoPlan::single(range)).await.map(Some)
            })
            .await
            .map_err(RaError::into_prefetch)
    }

    fn range(&self, size: u64) -> Result<Option<Range>> {
        if size == 0 {
            return Ok(None);
        }
        if self.small_object_prefetching_enabled && size <= self.small_object_size_threshold {
            return Range::new(0, size - 1).map(Some);
        }
        if self.footer_caching_enabled {
            let len = self.footer_caching_size.min(size);
            return Range::new(size - len, size - 1).map(Some);
        }
        Ok(None)
    }
}

/// Parses the footer of a claimed object into the column prefetch store.
pub struct FooterParseTask {
    physical: Arc<dyn PhysicalIo>,
    store: Arc<ColumnPrefetchStore>,
    telemetry: Telemetry,
    footer_caching_size: u64,
}

impl FooterParseTask {
    pub fn new(
        physical: Arc<dyn PhysicalIo>,
        store: Arc<ColumnPrefetchStore>,
        telemetry: Telemetry,
        config: &LogicalIoConfig,
    ) -> Self {
        Self {
            physical,
            store,
            telemetry,
            footer_caching_size: config.footer_caching_size,
        }
    }

    /// Parse the footer and store the result.
    ///
    /// The caller must hold the store claim for the object. On failure the
    /// claim is abandoned; parse failures surface as [`RaError::Parse`] and
    /// I/O failures as [`RaError::Prefetch`].
    pub async fn parse(&self) -> Result<Arc<ColumnMappers>> {
        let uri = self.physical.uri().clone();
        let operation = Operation::new(names::PARQUET_FOOTER_PARSE).with_attribute("uri", &uri);

        match self.telemetry.measure(operation, self.read_and_parse()).await {
            Ok(mappers) => Ok(self.store.complete(&uri, mappers)),
            Err(e) => {
                warn!(uri = %uri, error = %e, "Failed to parse parquet footer");
                self.store.abandon(&uri);
                match e {
                    RaError::Parse(_) => Err(e),
                    other => Err(other.into_prefetch()),
                }
            }
        }
    }

    async fn read_and_parse(&self) -> Result<ColumnMappers> {
        let size = self.physical.metadata().await?.size;
        let mut tail = vec![0u8; self.footer_caching_size.min(size) as usize];
        self.physical.read_tail(&mut tail).await?;

        let footer = footer_length(&tail)?;
        if footer as u64 > size {
            return Err(RaError::Parse(format!(
                "parquet footer of {} bytes exceeds object size {}",
                footer, size
            )));
        }
        if footer > tail.len() {
            debug!(
                uri = %self.physical.uri(),
                footer,
                read = tail.len(),
                "Footer larger than cached tail, reading again"
            );
            tail = vec![0u8; footer];
            self.physical.read_tail(&mut tail).await?;
        }

        parse_footer(&tail)
    }
}

/// Prefetches the rest of a column chunk after a partial read into it.
pub struct RemainingColumnTask {
    physical: Arc<dyn PhysicalIo>,
    store: Arc<ColumnPrefetchStore>,
    telemetry: Telemetry,
}

impl RemainingColumnTask {
    pub fn new(
        physical: Arc<dyn PhysicalIo>,
        store: Arc<ColumnPrefetchStore>,
        telemetry: Telemetry,
    ) -> Self {
        Self {
            physical,
            store,
            telemetry,
        }
    }

    /// The plan covering the rest of the chunk holding `pos`, after a read
    /// of `len` bytes from `pos`.
    ///
    /// `None` without parsed metadata, outside any chunk, or when the read
    /// already reached the end of the chunk.
    pub fn plan(&self, pos: u64, len: u64) -> Option<IoPlan> {
        let mappers = self.store.column_mappers(self.physical.uri())?;
        let column = mappers.column_at(pos)?;
        let read_end = pos.checked_add(len)?;
        if len == 0 || read_end >= column.end_offset() {
            return None;
        }
        let range = Range::new(read_end, column.end_offset() - 1).ok()?;
        Some(IoPlan::single(range))
    }

    /// Submit the remaining column prefetch for a read of `len` bytes at `pos`.
    ///
    /// Errors from plan submission are wrapped in [`RaError::Prefetch`].
    pub async fn prefetch_remaining_column_chunk(
        &self,
        pos: u64,
        len: u64,
    ) -> Result<Option<IoPlanExecution>> {
        let Some(plan) = self.plan(pos, len) else {
            return Ok(None);
        };
        self.execute(plan).await.map(Some)
    }

    pub(crate) async fn execute(&self, plan: IoPlan) -> Result<IoPlanExecution> {
        let mut operation = Operation::new(names::PARQUET_COLUMN_PREFETCH)
            .with_attribute("uri", self.physical.uri());
        if let Some(range) = plan.ranges().first() {
            operation = operation.with_attribute("range", range);
        }

        self.telemetry
            .measure(operation, async {
                self.physical
                    .execute(plan)
                    .await
                    .map_err(RaError::into_prefetch)
            })
            .await
    }
}
