//! Stream factory holding the shared caches.

use crate::{SeekableStream, StreamConfig};
use ra_error::{RaError, Result};
use ra_logical::{
    ColumnPrefetchStore, DefaultLogicalIo, FormatSelector, LogicalIo, ParquetLogicalIo,
    SequentialLogicalIo,
};
use ra_physical::{BlobStore, MetadataStore, PhysicalIo, PhysicalIoImpl};
use ra_telemetry::Telemetry;
use ra_traits::ObjectClient;
use ra_types::{ObjectFormat, ObjectUri, OpenOptions};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Creates [`SeekableStream`]s that share one set of caches.
///
/// Every stream created by the same factory shares object metadata, fetched
/// blocks and parsed Parquet footers. The factory can be shared across tasks.
pub struct SeekableStreamFactory {
    config: StreamConfig,
    telemetry: Telemetry,
    selector: FormatSelector,
    metadata_store: Arc<MetadataStore>,
    blob_store: Arc<BlobStore>,
    column_prefetch_store: Arc<ColumnPrefetchStore>,
    closed: AtomicBool,
}

impl SeekableStreamFactory {
    /// Create a factory over `client`.
    ///
    /// Fails with `Config` if any configuration section is invalid.
    pub fn new(client: Arc<dyn ObjectClient>, config: StreamConfig) -> Result<Self> {
        config.validate()?;

        let telemetry = Telemetry::new(config.telemetry.clone())?;
        let selector = FormatSelector::new(&config.logical)?;
        let metadata_store = Arc::new(MetadataStore::from_config(
            client.clone(),
            telemetry.clone(),
            &config.physical,
        ));
        let blob_store = Arc::new(BlobStore::new(
            metadata_store.clone(),
            client,
            telemetry.clone(),
            &config.physical,
        ));
        let column_prefetch_store = Arc::new(ColumnPrefetchStore::from_config(&config.logical));

        info!(
            max_range_size = config.physical.max_range_size,
            blob_store_capacity = config.physical.blob_store_capacity,
            format_specific_io = config.logical.format_specific_io,
            metrics = telemetry.is_enabled(),
            "Stream factory created"
        );

        Ok(Self {
            config,
            telemetry,
            selector,
            metadata_store,
            blob_store,
            column_prefetch_store,
            closed: AtomicBool::new(false),
        })
    }

    /// Open a stream with nothing known about the object up front.
    pub fn create_stream(&self, uri: ObjectUri) -> Result<SeekableStream> {
        self.create_stream_with(uri, OpenOptions::default())
    }

    /// Open a stream.
    ///
    /// Metadata in `options` seeds the metadata cache so no HEAD is issued.
    /// No other I/O happens here; Parquet streams start their tail prefetch
    /// in the background.
    pub fn create_stream_with(&self, uri: ObjectUri, options: OpenOptions) -> Result<SeekableStream> {
        if self.is_closed() {
            return Err(RaError::Closed(format!(
                "stream factory is closed, cannot open {}",
                uri
            )));
        }

        if let Some(metadata) = options.metadata {
            self.metadata_store.insert(&uri, metadata);
        }

        let format = self.selector.classify(&uri, options.policy);
        let physical: Arc<dyn PhysicalIo> = Arc::new(PhysicalIoImpl::new(
            uri.clone(),
            self.metadata_store.clone(),
            self.blob_store.clone(),
        ));
        let logical: Box<dyn LogicalIo> = match format {
            ObjectFormat::ColumnarParquet => Box::new(ParquetLogicalIo::new(
                physical,
                self.column_prefetch_store.clone(),
                self.telemetry.clone(),
                &self.config.logical,
            )),
            ObjectFormat::Sequential => Box::new(SequentialLogicalIo::new(
                physical,
                self.telemetry.clone(),
                &self.config.logical,
            )),
            ObjectFormat::Default => Box::new(DefaultLogicalIo::new(physical)),
        };

        debug!(uri = %uri, format = %format, "Stream created");
        Ok(SeekableStream::new(uri, logical, self.telemetry.clone()))
    }

    /// Release every cache and stop telemetry export.
    ///
    /// Streams already open keep working against the emptied caches; new
    /// streams are refused. Closing twice is a no-op.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.blob_store.close();
        self.column_prefetch_store.clear();
        self.telemetry.shutdown();
        info!("Stream factory closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub fn metadata_store(&self) -> &Arc<MetadataStore> {
        &self.metadata_store
    }

    pub fn blob_store(&self) -> &Arc<BlobStore> {
        &self.blob_store
    }

    pub fn column_prefetch_store(&self) -> &Arc<ColumnPrefetchStore> {
        &self.column_prefetch_store
    }
}

impl std::fmt::Debug for SeekableStreamFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeekableStreamFactory")
            .field("config", &self.config)
            .field("closed", &self.is_closed())
            .field("objects", &self.metadata_store.len())
            .finish()
    }
}
