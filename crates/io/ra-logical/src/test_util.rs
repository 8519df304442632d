//! Shared test doubles.

use arrow::array::{Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use ::parquet::arrow::ArrowWriter;
use ::parquet::file::properties::WriterProperties;
use ra_error::{RaError, Result};
use ra_physical::{BlobStore, MetadataStore, PhysicalIo, PhysicalIoConfig, PhysicalIoImpl};
use ra_telemetry::Telemetry;
use ra_traits::ObjectClient;
use ra_types::{ObjectMetadata, ObjectUri, Range};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::parquet::ColumnPrefetchStore;

pub(crate) fn object_bytes(size: u64) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

/// A parquet file with an `id` and a `name` column.
pub(crate) fn parquet_bytes(rows: usize, row_groups: usize) -> Vec<u8> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int32, false),
        Field::new("name", DataType::Utf8, false),
    ]));
    let ids = Int32Array::from_iter_values(0..rows as i32);
    let names = StringArray::from_iter_values((0..rows).map(|i| format!("name-{i}")));
    let batch = RecordBatch::try_new(schema.clone(), vec![Arc::new(ids), Arc::new(names)]).unwrap();

    let props = WriterProperties::builder()
        .set_max_row_group_size(rows.div_ceil(row_groups))
        .build();
    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, schema, Some(props)).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
    buf
}

/// Serves the same bytes for every key and records GET ranges.
///
/// Keys starting with `missing` do not exist.
pub(crate) struct MockClient {
    data: Bytes,
    fail_gets: AtomicBool,
    requests: Mutex<Vec<Range>>,
}

impl MockClient {
    pub(crate) fn new(data: Vec<u8>) -> Self {
        Self {
            data: Bytes::from(data),
            fail_gets: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn get_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Requested ranges sorted by start offset.
    pub(crate) fn requested_ranges(&self) -> Vec<Range> {
        let mut ranges = self.requests.lock().clone();
        ranges.sort_by_key(|r| r.start());
        ranges
    }
}

#[async_trait]
impl ObjectClient for MockClient {
    async fn head_object(&self, uri: &ObjectUri) -> Result<ObjectMetadata> {
        if uri.key.starts_with("missing") {
            return Err(RaError::NotFound(uri.to_string()));
        }
        Ok(ObjectMetadata::new(self.data.len() as u64))
    }

    async fn get_object_range(&self, uri: &ObjectUri, range: Range) -> Result<Bytes> {
        self.requests.lock().push(range);
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(RaError::Transport(format!("GET {} {} refused", uri, range)));
        }
        Ok(self
            .data
            .slice(range.start() as usize..range.end() as usize + 1))
    }
}

/// Shared caches over one mock client, as a factory would hold them.
pub(crate) struct Fixture {
    pub(crate) client: Arc<MockClient>,
    pub(crate) metadata: Arc<MetadataStore>,
    pub(crate) blobs: Arc<BlobStore>,
    pub(crate) store: Arc<ColumnPrefetchStore>,
}

impl Fixture {
    pub(crate) fn new(client: MockClient) -> Self {
        let client = Arc::new(client);
        let transport: Arc<dyn ObjectClient> = client.clone();
        let metadata = Arc::new(MetadataStore::new(transport.clone(), Telemetry::noop()));
        let blobs = Arc::new(BlobStore::new(
            metadata.clone(),
            transport,
            Telemetry::noop(),
            &PhysicalIoConfig::default(),
        ));
        Self {
            client,
            metadata,
            blobs,
            store: Arc::new(ColumnPrefetchStore::new(10)),
        }
    }

    pub(crate) fn uri(key: &str) -> ObjectUri {
        ObjectUri::new("bucket", key)
    }

    pub(crate) fn physical(&self, key: &str) -> Arc<dyn PhysicalIo> {
        Arc::new(PhysicalIoImpl::new(
            Self::uri(key),
            self.metadata.clone(),
            self.blobs.clone(),
        ))
    }
}
