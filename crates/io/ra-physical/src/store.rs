//! Blob store.
//!
//! A blob is the set of non-overlapping blocks cached for one object. The
//! store owns one blob per object and is shared by every stream of a factory.
//!
//! Both foreground reads and prefetch plans go through the same planning
//! step: prune failed blocks, find the gaps not covered by any block,
//! coalesce overlapping or adjacent gaps, split them with the
//! [`RangeOptimiser`] and start one fetch per piece. Blocks are registered
//! under the blob lock before their fetch can complete, so a second caller
//! touching the same bytes always attaches to the existing fetch.
//!
//! The store keeps at most `blob_store_capacity` blobs. When a new object
//! needs room, the least recently used blob with no fetch in flight is
//! dropped.

use crate::block::{Block, BlockState};
use crate::{IoPlanExecution, MetadataStore, PhysicalIoConfig, RangeOptimiser};
use parking_lot::{Mutex, RwLock};
use ra_error::Result;
use ra_telemetry::{Operation, Telemetry, names};
use ra_traits::ObjectClient;
use ra_types::{IoPlan, ObjectUri, Range};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

struct Blob {
    uri: ObjectUri,
    /// Sorted by start offset, never overlapping.
    blocks: Mutex<Vec<Block>>,
    /// Access order; the smallest value is the least recently used.
    last_used: AtomicU64,
}

struct Planned {
    /// Blocks overlapping the requested ranges.
    needed: Vec<Block>,
    /// Blocks created by this call.
    started: Vec<Block>,
}

impl Blob {
    fn new(uri: ObjectUri, now: u64) -> Self {
        Self {
            uri,
            blocks: Mutex::new(Vec::new()),
            last_used: AtomicU64::new(now),
        }
    }

    fn touch(&self, now: u64) {
        self.last_used.fetch_max(now, Ordering::Relaxed);
    }

    fn has_pending(&self) -> bool {
        self.blocks
            .lock()
            .iter()
            .any(|b| b.state() == BlockState::Pending)
    }

    fn plan(
        &self,
        requested: &[Range],
        optimiser: RangeOptimiser,
        client: &Arc<dyn ObjectClient>,
        telemetry: &Telemetry,
    ) -> Result<Planned> {
        let mut blocks = self.blocks.lock();

        let before = blocks.len();
        blocks.retain(|b| b.state() != BlockState::Failed);
        if blocks.len() != before {
            debug!(uri = %self.uri, pruned = before - blocks.len(), "Pruned failed blocks");
        }

        let mut gaps = Vec::new();
        for range in requested {
            uncovered(*range, &blocks, &mut gaps)?;
        }

        let mut started = Vec::new();
        for piece in optimiser.split(&coalesce(gaps)) {
            trace!(uri = %self.uri, range = %piece, "Starting block fetch");
            started.push(Block::fetch(
                Arc::clone(client),
                telemetry.clone(),
                self.uri.clone(),
                piece,
            ));
        }

        if !started.is_empty() {
            blocks.extend(started.iter().cloned());
            blocks.sort_by_key(|b| b.range().start());
        }

        let needed = blocks
            .iter()
            .filter(|b| requested.iter().any(|r| r.overlaps(&b.range())))
            .cloned()
            .collect();

        Ok(Planned { needed, started })
    }

    fn cached_bytes(&self) -> u64 {
        self.blocks.lock().iter().map(Block::ready_len).sum()
    }
}

/// Append the parts of `range` not covered by `blocks` (sorted, disjoint).
fn uncovered(range: Range, blocks: &[Block], gaps: &mut Vec<Range>) -> Result<()> {
    let mut cursor = range.start();
    for block in blocks {
        let covered = block.range();
        if covered.end() < cursor {
            continue;
        }
        if covered.start() > range.end() {
            break;
        }
        if covered.start() > cursor {
            gaps.push(Range::new(cursor, covered.start() - 1)?);
        }
        cursor = covered.end() + 1;
        if cursor > range.end() {
            return Ok(());
        }
    }
    gaps.push(Range::new(cursor, range.end())?);
    Ok(())
}

/// Merge overlapping or adjacent ranges into sorted, disjoint ranges.
fn coalesce(mut ranges: Vec<Range>) -> Vec<Range> {
    ranges.sort_by_key(|r| r.start());
    let mut merged: Vec<Range> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if last.is_adjacent_or_overlapping(&range) => *last = last.merge(&range),
            _ => merged.push(range),
        }
    }
    merged
}

/// Factory-scoped cache of fetched bytes for every object.
pub struct BlobStore {
    metadata: Arc<MetadataStore>,
    client: Arc<dyn ObjectClient>,
    telemetry: Telemetry,
    optimiser: RangeOptimiser,
    capacity: usize,
    clock: AtomicU64,
    blobs: RwLock<HashMap<ObjectUri, Arc<Blob>>>,
}

impl BlobStore {
    /// Create an empty blob store.
    pub fn new(
        metadata: Arc<MetadataStore>,
        client: Arc<dyn ObjectClient>,
        telemetry: Telemetry,
        config: &PhysicalIoConfig,
    ) -> Self {
        Self {
            metadata,
            client,
            telemetry,
            optimiser: RangeOptimiser::from_config(config),
            capacity: config.blob_store_capacity.max(1),
            clock: AtomicU64::new(0),
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// The metadata store this blob store resolves sizes through.
    pub fn metadata_store(&self) -> &Arc<MetadataStore> {
        &self.metadata
    }

    fn blob(&self, uri: &ObjectUri) -> Arc<Blob> {
        let now = self.clock.fetch_add(1, Ordering::Relaxed);
        if let Some(blob) = self.blobs.read().get(uri) {
            blob.touch(now);
            return Arc::clone(blob);
        }

        let mut blobs = self.blobs.write();
        if let Some(blob) = blobs.get(uri) {
            blob.touch(now);
            return Arc::clone(blob);
        }
        Self::make_room(&mut blobs, self.capacity);
        let blob = Arc::new(Blob::new(uri.clone(), now));
        blobs.insert(uri.clone(), Arc::clone(&blob));
        blob
    }

    /// Evict least recently used blobs until one more fits. Blobs with a
    /// fetch in flight are kept, so the map may briefly exceed `capacity`.
    fn make_room(blobs: &mut HashMap<ObjectUri, Arc<Blob>>, capacity: usize) {
        while blobs.len() >= capacity {
            let oldest = blobs
                .values()
                .filter(|blob| !blob.has_pending())
                .min_by_key(|blob| blob.last_used.load(Ordering::Relaxed))
                .map(|blob| blob.uri.clone());
            let Some(uri) = oldest else {
                debug!(blobs = blobs.len(), "Every blob has fetches in flight, store over capacity");
                return;
            };
            blobs.remove(&uri);
            trace!(uri = %uri, "Evicted least recently used blob");
        }
    }

    /// Read bytes of `uri` starting at `pos` into `buf`.
    ///
    /// The read is clamped to the end of the object. Returns the number of
    /// bytes copied, zero when `buf` is empty or `pos` is past the end.
    pub async fn read(&self, uri: &ObjectUri, buf: &mut [u8], pos: u64) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let size = self.metadata.get(uri).await?.size;
        let Some(requested) = Range::from_len(pos, buf.len() as u64)?.clamp_to(size) else {
            return Ok(0);
        };

        let planned = self.blob(uri).plan(
            &[requested],
            self.optimiser,
            &self.client,
            &self.telemetry,
        )?;

        for block in &planned.needed {
            let bytes = block.data().await?;
            if let Some(overlap) = block.range().intersection(&requested) {
                let src = (overlap.start() - block.range().start()) as usize;
                let dst = (overlap.start() - requested.start()) as usize;
                let len = overlap.len() as usize;
                buf[dst..dst + len].copy_from_slice(&bytes[src..src + len]);
            }
        }

        Ok(requested.len() as usize)
    }

    /// Start populating the cache with `plan` without waiting for the data.
    ///
    /// Ranges are clamped to the object and those starting past its end are
    /// dropped. Returns [`crate::IoPlanState::Skipped`] when nothing new had
    /// to be fetched.
    pub async fn execute(&self, uri: &ObjectUri, plan: &IoPlan) -> Result<IoPlanExecution> {
        let operation = Operation::new(names::IO_PLAN_EXECUTE)
            .with_attribute("uri", uri)
            .with_attribute("ranges", plan.ranges().len());

        self.telemetry
            .measure(operation, async {
                if plan.is_empty() {
                    return Ok(IoPlanExecution::skipped());
                }
                let size = self.metadata.get(uri).await?.size;
                let requested: Vec<Range> = plan
                    .ranges()
                    .iter()
                    .filter_map(|r| r.clamp_to(size))
                    .collect();
                if requested.is_empty() {
                    return Ok(IoPlanExecution::skipped());
                }

                let planned =
                    self.blob(uri)
                        .plan(&requested, self.optimiser, &self.client, &self.telemetry)?;
                debug!(
                    uri = %uri,
                    requested = requested.len(),
                    started = planned.started.len(),
                    "Submitted I/O plan"
                );
                Ok(IoPlanExecution::submitted(planned.started))
            })
            .await
    }

    /// Number of objects with a blob.
    pub fn blob_count(&self) -> usize {
        self.blobs.read().len()
    }

    /// Bytes of `uri` held by ready blocks.
    pub fn cached_bytes(&self, uri: &ObjectUri) -> u64 {
        self.blobs
            .read()
            .get(uri)
            .map(|blob| blob.cached_bytes())
            .unwrap_or(0)
    }

    /// Drop every blob and close the metadata store.
    ///
    /// In-flight fetches finish on their own tasks but are no longer reachable.
    pub fn close(&self) {
        let released = {
            let mut blobs = self.blobs.write();
            let released = blobs.len();
            blobs.clear();
            released
        };
        self.metadata.close();
        debug!(released, "Blob store closed");
    }
}
