//! Shared test doubles.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use ra_error::{RaError, Result};
use ra_traits::ObjectClient;
use ra_types::{ObjectMetadata, ObjectUri, Range};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{SeekableStreamFactory, StreamConfig};

pub(crate) fn object_bytes(size: u64) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

/// Serves the same bytes for every key and counts requests.
///
/// Keys starting with `missing` do not exist.
pub(crate) struct MockClient {
    data: Bytes,
    heads: AtomicUsize,
    requests: Mutex<Vec<Range>>,
}

impl MockClient {
    pub(crate) fn new(data: Vec<u8>) -> Self {
        Self {
            data: Bytes::from(data),
            heads: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn head_count(&self) -> usize {
        self.heads.load(Ordering::SeqCst)
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
        self.heads.fetch_add(1, Ordering::SeqCst);
        if uri.key.starts_with("missing") {
            return Err(RaError::NotFound(uri.to_string()));
        }
        Ok(ObjectMetadata::new(self.data.len() as u64))
    }

    async fn get_object_range(&self, _uri: &ObjectUri, range: Range) -> Result<Bytes> {
        self.requests.lock().push(range);
        Ok(self
            .data
            .slice(range.start() as usize..range.end() as usize + 1))
    }
}

pub(crate) fn factory(data: Vec<u8>, config: StreamConfig) -> (Arc<MockClient>, SeekableStreamFactory) {
    let client = Arc::new(MockClient::new(data));
    let factory = SeekableStreamFactory::new(client.clone(), config).unwrap();
    (client, factory)
}

pub(crate) fn uri(key: &str) -> ObjectUri {
    ObjectUri::new("bucket", key)
}
