//! Parquet-aware strategy.

use crate::detached::DetachedTasks;
use crate::parquet::{ColumnPrefetchStore, FooterParseTask, RemainingColumnTask, TailPrefetchTask};
use crate::{LogicalIo, LogicalIoConfig};
use async_trait::async_trait;
use parking_lot::Mutex;
use ra_error::{RaError, Result};
use ra_physical::PhysicalIo;
use ra_telemetry::{Telemetry, names};
use ra_types::{ObjectFormat, ObjectMetadata};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Footer state of one parquet stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParquetState {
    /// No footer read yet.
    Unparsed,
    /// The footer was read; its parse is in flight here or on another stream.
    FooterRequested,
    /// Column mappers are available.
    MetadataReady,
    Closed,
}

/// Reads parquet objects and prefetches around the footer and column chunks.
///
/// Opening spawns a tail prefetch. The first tail read spawns a footer parse
/// unless the object is already parsed or being parsed by another stream.
/// Once column mappers exist, every read that stops inside a column chunk
/// prefetches the rest of that chunk. If this stream's footer parse fails it
/// stops prefetching for the rest of its life.
pub struct ParquetLogicalIo {
    physical: Arc<dyn PhysicalIo>,
    store: Arc<ColumnPrefetchStore>,
    telemetry: Telemetry,
    config: LogicalIoConfig,
    state: Mutex<ParquetState>,
    degraded: Arc<AtomicBool>,
    remaining_column: Arc<RemainingColumnTask>,
    tasks: DetachedTasks,
}

impl ParquetLogicalIo {
    /// Create the strategy and spawn the tail prefetch.
    pub fn new(
        physical: Arc<dyn PhysicalIo>,
        store: Arc<ColumnPrefetchStore>,
        telemetry: Telemetry,
        config: &LogicalIoConfig,
    ) -> Self {
        let remaining_column = Arc::new(RemainingColumnTask::new(
            Arc::clone(&physical),
            Arc::clone(&store),
            telemetry.clone(),
        ));
        let io = Self {
            physical,
            store,
            telemetry,
            config: config.clone(),
            state: Mutex::new(ParquetState::Unparsed),
            degraded: Arc::new(AtomicBool::new(false)),
            remaining_column,
            tasks: DetachedTasks::default(),
        };
        io.prefetch_tail();
        io
    }

    /// Current footer state.
    pub fn state(&self) -> ParquetState {
        *self.state.lock()
    }

    /// Whether a footer parse started by this stream failed.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    fn prefetch_tail(&self) {
        if !self.config.footer_caching_enabled && !self.config.small_object_prefetching_enabled {
            return;
        }
        let task = TailPrefetchTask::new(
            Arc::clone(&self.physical),
            self.telemetry.clone(),
            &self.config,
        );
        self.tasks.spawn(names::PARQUET_TAIL_PREFETCH, self.physical.uri(), async move {
            match task.prefetch().await? {
                Some(execution) => execution.wait().await.map(|_| ()),
                None => Ok(()),
            }
        });
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state() == ParquetState::Closed {
            return Err(RaError::Closed(self.physical.uri().to_string()));
        }
        Ok(())
    }

    fn request_footer(&self) {
        let mut state = self.state.lock();
        if *state != ParquetState::Unparsed {
            return;
        }
        *state = ParquetState::FooterRequested;

        let uri = self.physical.uri();
        if !self.store.try_claim(uri) {
            debug!(uri = %uri, "Footer parsed or claimed by another stream");
            return;
        }

        let task = FooterParseTask::new(
            Arc::clone(&self.physical),
            Arc::clone(&self.store),
            self.telemetry.clone(),
            &self.config,
        );
        let degraded = Arc::clone(&self.degraded);
        let spawned = self.tasks.spawn(names::PARQUET_FOOTER_PARSE, uri, async move {
            let result = task.parse().await;
            if result.is_err() {
                degraded.store(true, Ordering::SeqCst);
            }
            result
        });

        // Nothing will parse the footer; release the claim and retry later.
        if !spawned {
            self.store.abandon(uri);
            *state = ParquetState::Unparsed;
        }
    }

    fn prefetch_remaining_column(&self, pos: u64, len: usize) {
        if !self.config.remaining_column_prefetch_enabled || len == 0 || self.is_degraded() {
            return;
        }
        let Some(plan) = self.remaining_column.plan(pos, len as u64) else {
            return;
        };
        {
            let mut state = self.state.lock();
            if *state == ParquetState::Closed {
                return;
            }
            *state = ParquetState::MetadataReady;
        }

        let task = Arc::clone(&self.remaining_column);
        self.tasks.spawn(names::PARQUET_COLUMN_PREFETCH, self.physical.uri(), async move {
            task.execute(plan).await?.wait().await
        });
    }
}

#[async_trait]
impl LogicalIo for ParquetLogicalIo {
    fn format(&self) -> ObjectFormat {
        ObjectFormat::ColumnarParquet
    }

    async fn metadata(&self) -> Result<ObjectMetadata> {
        self.ensure_open()?;
        self.physical.metadata().await
    }

    async fn read_byte(&self, pos: u64) -> Result<u8> {
        self.ensure_open()?;
        self.physical.read_byte(pos).await
    }

    async fn read(&self, buf: &mut [u8], pos: u64) -> Result<usize> {
        self.ensure_open()?;
        let read = self.physical.read(buf, pos).await?;
        self.prefetch_remaining_column(pos, read);
        Ok(read)
    }

    async fn read_tail(&self, buf: &mut [u8]) -> Result<usize> {
        self.ensure_open()?;
        let read = self.physical.read_tail(buf).await?;
        if read > 0 {
            self.request_footer();
        }
        Ok(read)
    }

    async fn wait_for_prefetches(&self) {
        self.tasks.wait().await;
    }

    fn close(&self) {
        *self.state.lock() = ParquetState::Closed;
        self.physical.close();
    }
}
