//! Cross-stream cache of parsed column metadata.

use crate::LogicalIoConfig;
use crate::parquet::ColumnMappers;
use parking_lot::RwLock;
use ra_types::ObjectUri;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, trace};

#[derive(Debug, Clone)]
enum Entry {
    /// A stream holds the claim and is parsing the footer.
    Parsing,
    /// Footer parsed; `sequence` orders entries for eviction.
    Parsed {
        mappers: Arc<ColumnMappers>,
        sequence: u64,
    },
}

/// Parsed [`ColumnMappers`] per object, shared by every stream of a factory.
///
/// Claiming an object is an atomic create-if-absent, so each object's footer
/// is parsed at most once while its entry exists. When the store is full
/// the oldest parsed entry is evicted.
pub struct ColumnPrefetchStore {
    capacity: usize,
    entries: RwLock<HashMap<ObjectUri, Entry>>,
    next_sequence: AtomicU64,
    claims_granted: AtomicUsize,
}

impl ColumnPrefetchStore {
    /// Create a store holding at most `capacity` parsed objects.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: RwLock::new(HashMap::new()),
            next_sequence: AtomicU64::new(0),
            claims_granted: AtomicUsize::new(0),
        }
    }

    pub fn from_config(config: &LogicalIoConfig) -> Self {
        Self::new(config.column_prefetch_store_capacity)
    }

    /// Claim the right to parse `uri`'s footer.
    ///
    /// Returns false if the object is already parsed or being parsed.
    pub fn try_claim(&self, uri: &ObjectUri) -> bool {
        let mut entries = self.entries.write();
        if entries.contains_key(uri) {
            trace!(uri = %uri, "Footer already claimed");
            return false;
        }
        entries.insert(uri.clone(), Entry::Parsing);
        self.claims_granted.fetch_add(1, Ordering::Relaxed);
        debug!(uri = %uri, "Claimed footer parse");
        true
    }

    /// Store the parsed mappers for `uri`, releasing the claim.
    pub fn complete(&self, uri: &ObjectUri, mappers: ColumnMappers) -> Arc<ColumnMappers> {
        let mappers = Arc::new(mappers);
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);

        let mut entries = self.entries.write();
        let parsed = entries
            .iter()
            .filter(|(key, entry)| *key != uri && matches!(entry, Entry::Parsed { .. }))
            .count();
        if parsed >= self.capacity {
            Self::evict_oldest(&mut entries);
        }

        entries.insert(
            uri.clone(),
            Entry::Parsed {
                mappers: Arc::clone(&mappers),
                sequence,
            },
        );
        debug!(uri = %uri, columns = mappers.len(), entries = entries.len(), "Stored column mappers");
        mappers
    }

    /// Drop a claim after a failed parse so a later stream may try again.
    ///
    /// Parsed entries are left alone.
    pub fn abandon(&self, uri: &ObjectUri) {
        let mut entries = self.entries.write();
        if matches!(entries.get(uri), Some(Entry::Parsing)) {
            entries.remove(uri);
            debug!(uri = %uri, "Abandoned footer parse claim");
        }
    }

    /// Parsed mappers for `uri`, if any.
    pub fn column_mappers(&self, uri: &ObjectUri) -> Option<Arc<ColumnMappers>> {
        match self.entries.read().get(uri) {
            Some(Entry::Parsed { mappers, .. }) => Some(Arc::clone(mappers)),
            _ => None,
        }
    }

    /// Whether `uri` is parsed or being parsed.
    pub fn contains(&self, uri: &ObjectUri) -> bool {
        self.entries.read().contains_key(uri)
    }

    /// Number of claims granted since creation.
    pub fn claims_granted(&self) -> usize {
        self.claims_granted.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        let released = entries.len();
        entries.clear();
        debug!(released, "Column prefetch store cleared");
    }

    fn evict_oldest(entries: &mut HashMap<ObjectUri, Entry>) {
        let oldest = entries
            .iter()
            .filter_map(|(key, entry)| match entry {
                Entry::Parsed { sequence, .. } => Some((key, *sequence)),
                Entry::Parsing => None,
            })
            .min_by_key(|(_, sequence)| *sequence)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            entries.remove(&key);
            trace!(uri = %key, "Evicted oldest column mappers");
        }
    }
}
