//! Physical I/O layer.
//!
//! Turns byte-range requests against an object into cached, deduplicated
//! upstream fetches. All state here is shared by every stream of a factory:
//!
//! - [`MetadataStore`]: object sizes, one HEAD per object
//! - [`BlobStore`]: fetched blocks per object, one GET per uncovered gap
//! - [`RangeOptimiser`]: bounds the size of each upstream request
//!
//! [`PhysicalIoImpl`] is the cheap per-stream handle over those stores.

mod block;
mod config;
mod execution;
mod io;
mod metadata;
mod optimiser;
mod store;


pub use config::{
    DEFAULT_BLOB_STORE_CAPACITY, DEFAULT_MAX_RANGE_SIZE, DEFAULT_METADATA_STORE_CAPACITY,
    PhysicalIoConfig,
};
pub use execution::{IoPlanExecution, IoPlanState, IoPlanSummary};
pub use io::{PhysicalIo, PhysicalIoImpl};
pub use metadata::MetadataStore;
pub use optimiser::RangeOptimiser;
pub use store::BlobStore;
