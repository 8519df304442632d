//! Transport wrapper that records every request.

use async_trait::async_trait;
use bytes::Bytes;
use object_store::ObjectStore;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use parking_lot::Mutex;
use ra_client::ObjectStoreClient;
use ra_error::Result;
use ra_traits::ObjectClient;
use ra_types::{ObjectMetadata, ObjectUri, Range};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts HEAD and GET requests passed to the inner client.
pub struct CountingClient {
    inner: Arc<dyn ObjectClient>,
    heads: AtomicUsize,
    gets: Mutex<Vec<(ObjectUri, Range)>>,
}

impl CountingClient {
    pub fn new(inner: Arc<dyn ObjectClient>) -> Self {
        Self {
            inner,
            heads: AtomicUsize::new(0),
            gets: Mutex::new(Vec::new()),
        }
    }

    pub fn head_count(&self) -> usize {
        self.heads.load(Ordering::SeqCst)
    }

    pub fn get_count(&self) -> usize {
        self.gets.lock().len()
    }

    /// Ranges requested for `uri`, sorted by start offset.
    pub fn ranges_for(&self, uri: &ObjectUri) -> Vec<Range> {
        let mut ranges: Vec<Range> = self
            .gets
            .lock()
            .iter()
            .filter(|(u, _)| u == uri)
            .map(|(_, r)| *r)
            .collect();
        ranges.sort_by_key(|r| r.start());
        ranges
    }
}

#[async_trait]
impl ObjectClient for CountingClient {
    async fn head_object(&self, uri: &ObjectUri) -> Result<ObjectMetadata> {
        self.heads.fetch_add(1, Ordering::SeqCst);
        self.inner.head_object(uri).await
    }

    async fn get_object_range(&self, uri: &ObjectUri, range: Range) -> Result<Bytes> {
        self.gets.lock().push((uri.clone(), range));
        self.inner.get_object_range(uri, range).await
    }
}

/// A counting client over an in-memory store holding `objects`.
pub async fn in_memory(objects: Vec<(&str, Vec<u8>)>) -> Arc<CountingClient> {
    let store = InMemory::new();
    for (key, data) in objects {
        store
            .put(&ObjectPath::from(key), Bytes::from(data).into())
            .await
            .expect("Failed to put object");
    }
    let inner: Arc<dyn ObjectClient> = Arc::new(ObjectStoreClient::with_store(Arc::new(store)));
    Arc::new(CountingClient::new(inner))
}
