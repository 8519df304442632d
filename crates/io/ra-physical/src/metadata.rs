//! Metadata cache.
//!
//! Memoizes object metadata per [`ObjectUri`] so each object is HEADed at
//! most once while its entry is cached. Concurrent callers for an object
//! whose HEAD is in flight attach to the same request.

use crate::{DEFAULT_METADATA_STORE_CAPACITY, PhysicalIoConfig};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use ra_error::Result;
use ra_telemetry::{Operation, Telemetry, names};
use ra_traits::ObjectClient;
use ra_types::{ObjectMetadata, ObjectUri};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

type MetadataFuture = Shared<BoxFuture<'static, Result<ObjectMetadata>>>;

struct Entry {
    lookup: MetadataFuture,
    /// Access order; the smallest value is the least recently used.
    last_used: u64,
}

#[derive(Default)]
struct Entries {
    map: HashMap<ObjectUri, Entry>,
    clock: u64,
}

impl Entries {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Make room for one more entry. Lookups still in flight are kept, so
    /// the map may briefly exceed `capacity` when all of them are.
    fn make_room(&mut self, capacity: usize) {
        while self.map.len() >= capacity {
            let oldest = self
                .map
                .iter()
                .filter(|(_, entry)| entry.lookup.peek().is_some())
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(uri, _)| uri.clone());
            let Some(uri) = oldest else {
                return;
            };
            self.map.remove(&uri);
            trace!(uri = %uri, "Evicted least recently used metadata");
        }
    }

    fn insert(&mut self, uri: ObjectUri, lookup: MetadataFuture, capacity: usize) {
        self.make_room(capacity);
        let last_used = self.tick();
        self.map.insert(uri, Entry { lookup, last_used });
    }
}

/// Thread-safe, deduplicating cache of object metadata.
///
/// Holds at most `capacity` objects, evicting the least recently used
/// resolved entry. Failed lookups are dropped once observed, so the next
/// call issues a fresh HEAD.
pub struct MetadataStore {
    client: Arc<dyn ObjectClient>,
    telemetry: Telemetry,
    capacity: usize,

    /// Resolved or in-flight lookups keyed by object.
    entries: Mutex<Entries>,
}

impl MetadataStore {
    /// Create an empty metadata store with the default capacity.
    pub fn new(client: Arc<dyn ObjectClient>, telemetry: Telemetry) -> Self {
        Self {
            client,
            telemetry,
            capacity: DEFAULT_METADATA_STORE_CAPACITY,
            entries: Mutex::new(Entries::default()),
        }
    }

    /// Create an empty metadata store sized from `config`.
    pub fn from_config(
        client: Arc<dyn ObjectClient>,
        telemetry: Telemetry,
        config: &PhysicalIoConfig,
    ) -> Self {
        Self::new(client, telemetry).with_capacity(config.metadata_store_capacity)
    }

    /// Set the maximum number of cached objects.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Get metadata for `uri`, issuing a HEAD on first access.
    pub async fn get(&self, uri: &ObjectUri) -> Result<ObjectMetadata> {
        let lookup = {
            let mut entries = self.entries.lock();
            let now = entries.tick();
            match entries.map.get_mut(uri) {
                Some(entry) => {
                    trace!(uri = %uri, "Metadata cache hit");
                    entry.last_used = now;
                    entry.lookup.clone()
                }
                None => {
                    let lookup = self.head(uri.clone());
                    entries.insert(uri.clone(), lookup.clone(), self.capacity);
                    lookup
                }
            }
        };

        let result = lookup.clone().await;

        if result.is_err() {
            let mut entries = self.entries.lock();
            // Only evict the failed lookup; a retry may already have replaced it.
            if entries
                .map
                .get(uri)
                .is_some_and(|current| current.lookup.ptr_eq(&lookup))
            {
                entries.map.remove(uri);
                debug!(uri = %uri, "Evicted failed metadata lookup");
            }
        }

        result
    }

    /// Seed metadata supplied by the caller. An existing entry is kept.
    pub fn insert(&self, uri: &ObjectUri, metadata: ObjectMetadata) {
        let mut entries = self.entries.lock();
        if entries.map.contains_key(uri) {
            return;
        }
        trace!(uri = %uri, size = metadata.size, "Seeded metadata");
        let lookup = futures::future::ready(Ok(metadata)).boxed().shared();
        // Resolve now so the entry counts as settled for eviction.
        let _ = lookup.clone().now_or_never();
        entries.insert(uri.clone(), lookup, self.capacity);
    }

    /// Get the current number of entries, including in-flight lookups.
    pub fn len(&self) -> usize {
        self.entries.lock().map.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Release all cached entries.
    pub fn close(&self) {
        let mut entries = self.entries.lock();
        let released = entries.map.len();
        entries.map.clear();
        debug!(released, "Metadata store closed");
    }

    fn head(&self, uri: ObjectUri) -> MetadataFuture {
        let client = Arc::clone(&self.client);
        let telemetry = self.telemetry.clone();
        async move {
            let operation = Operation::new(names::METADATA_HEAD).with_attribute("uri", &uri);
            telemetry.measure(operation, client.head_object(&uri)).await
        }
        .boxed()
        .shared()
    }
}
